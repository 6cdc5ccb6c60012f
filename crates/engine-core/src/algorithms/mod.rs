//! Algorithm registry (§4.B).
//!
//! Two closed families — growth and level-cost — each keyed by a
//! stable string identifier and each self-describing via a catalog
//! entry (`{description, parameter name -> description}`). Generalizes
//! the teacher's `HookRegistry` (`runtime/src/hooks/registry.rs`)
//! lookup-table-of-trait-objects shape from post-action hooks to
//! growth/cost formulas.

pub mod cost;
pub mod growth;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::{ErrorSeverity, GameError};
use crate::ids::{ResourceKey, StatName};

pub type ParamMap = Map<String, Value>;

#[derive(Clone, Debug, thiserror::Error)]
pub enum AlgorithmError {
    #[error("unknown algorithm id '{id}', accepted ids: {known:?}")]
    UnknownAlgorithm { id: String, known: Vec<String> },

    #[error("algorithm '{algorithm_id}' missing required parameter '{parameter}'")]
    MissingParameter {
        algorithm_id: String,
        parameter: String,
    },

    #[error("algorithm '{algorithm_id}' parameter '{parameter}' is invalid: {reason}")]
    InvalidParameter {
        algorithm_id: String,
        parameter: String,
        reason: String,
    },
}

impl GameError for AlgorithmError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Precondition
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownAlgorithm { .. } => "UNKNOWN_ALGORITHM",
            Self::MissingParameter { .. } => "ALGORITHM_MISSING_PARAMETER",
            Self::InvalidParameter { .. } => "ALGORITHM_INVALID_PARAMETER",
        }
    }
}

/// One catalog entry: human description plus parameter descriptions.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct AlgorithmCatalogEntry {
    pub id: &'static str,
    pub description: &'static str,
    pub parameters: Vec<(&'static str, &'static str)>,
}

/// Scales an entity's base stats with level.
pub trait GrowthAlgorithm: Send + Sync {
    fn id(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn parameters(&self) -> Vec<(&'static str, &'static str)>;

    /// Validates parameters at config-load time.
    fn validate(&self, params: &ParamMap) -> Result<(), AlgorithmError>;

    /// Computes the grown value of a single stat at the given level.
    fn grow(&self, stat: &StatName, base: f64, level: u32, params: &ParamMap) -> f64;

    fn catalog_entry(&self) -> AlgorithmCatalogEntry {
        AlgorithmCatalogEntry {
            id: self.id(),
            description: self.description(),
            parameters: self.parameters(),
        }
    }
}

/// Computes the resource price to reach a target level from the level
/// below it.
pub trait LevelCostAlgorithm: Send + Sync {
    fn id(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn parameters(&self) -> Vec<(&'static str, &'static str)>;

    fn validate(&self, params: &ParamMap) -> Result<(), AlgorithmError>;

    /// Cost to reach `target_level` from `target_level - 1`. Empty at
    /// `target_level <= 1`.
    fn cost_for_level(&self, target_level: u32, params: &ParamMap) -> HashMap<ResourceKey, i64>;

    fn catalog_entry(&self) -> AlgorithmCatalogEntry {
        AlgorithmCatalogEntry {
            id: self.id(),
            description: self.description(),
            parameters: self.parameters(),
        }
    }
}

/// Self-describing catalog of every registered algorithm (§4.J `GET
/// algorithms`).
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct AlgorithmCatalog {
    pub growth: Vec<AlgorithmCatalogEntry>,
    pub level_cost: Vec<AlgorithmCatalogEntry>,
}

/// Closed registry of every known growth/level-cost algorithm.
pub struct AlgorithmRegistry {
    growth: HashMap<&'static str, Arc<dyn GrowthAlgorithm>>,
    level_cost: HashMap<&'static str, Arc<dyn LevelCostAlgorithm>>,
}

impl AlgorithmRegistry {
    /// Builds the registry with the complete, closed set of algorithms
    /// defined by the spec. There is no extension point — adding an
    /// algorithm means adding a variant here.
    pub fn new() -> Self {
        let growth: Vec<Arc<dyn GrowthAlgorithm>> = vec![
            Arc::new(growth::Flat),
            Arc::new(growth::Linear),
            Arc::new(growth::Exponential),
        ];
        let level_cost: Vec<Arc<dyn LevelCostAlgorithm>> = vec![
            Arc::new(cost::FlatCost),
            Arc::new(cost::FreeCost),
            Arc::new(cost::LinearCost),
            Arc::new(cost::MixedLinearCost),
        ];

        Self {
            growth: growth.into_iter().map(|a| (a.id(), a)).collect(),
            level_cost: level_cost.into_iter().map(|a| (a.id(), a)).collect(),
        }
    }

    pub fn growth(&self, id: &str) -> Result<&Arc<dyn GrowthAlgorithm>, AlgorithmError> {
        self.growth
            .get(id)
            .ok_or_else(|| AlgorithmError::UnknownAlgorithm {
                id: id.to_string(),
                known: self.growth.keys().map(|s| s.to_string()).collect(),
            })
    }

    pub fn level_cost(&self, id: &str) -> Result<&Arc<dyn LevelCostAlgorithm>, AlgorithmError> {
        self.level_cost
            .get(id)
            .ok_or_else(|| AlgorithmError::UnknownAlgorithm {
                id: id.to_string(),
                known: self.level_cost.keys().map(|s| s.to_string()).collect(),
            })
    }

    pub fn catalog(&self) -> AlgorithmCatalog {
        let mut growth: Vec<_> = self.growth.values().map(|a| a.catalog_entry()).collect();
        growth.sort_by_key(|e| e.id);
        let mut level_cost: Vec<_> = self
            .level_cost
            .values()
            .map(|a| a.catalog_entry())
            .collect();
        level_cost.sort_by_key(|e| e.id);

        AlgorithmCatalog {
            growth,
            level_cost,
        }
    }

    /// Grows every stat in `base_stats` at `level` using the named
    /// algorithm. Unknown algorithm ids were already rejected at config
    /// load time, so callers here treat a lookup failure as internal.
    pub fn grow_stats(
        &self,
        algorithm_id: &str,
        params: &ParamMap,
        base_stats: &HashMap<StatName, f64>,
        level: u32,
    ) -> HashMap<StatName, f64> {
        let Ok(algo) = self.growth(algorithm_id) else {
            return HashMap::new();
        };
        base_stats
            .iter()
            .map(|(stat, base)| (stat.clone(), algo.grow(stat, *base, level, params)))
            .collect()
    }

    /// Total cost, key-wise summed, to go from `current_level` to
    /// `target_level` (exclusive of `current_level`, inclusive of
    /// `target_level`).
    pub fn total_cost(
        &self,
        algorithm_id: &str,
        params: &ParamMap,
        current_level: u32,
        target_level: u32,
    ) -> HashMap<ResourceKey, i64> {
        let Ok(algo) = self.level_cost(algorithm_id) else {
            return HashMap::new();
        };
        let mut total: HashMap<ResourceKey, i64> = HashMap::new();
        for lvl in (current_level + 1)..=target_level {
            for (key, amount) in algo.cost_for_level(lvl, params) {
                *total.entry(key).or_insert(0) += amount;
            }
        }
        total
    }
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn param_f64(params: &ParamMap, key: &str) -> Option<f64> {
    params.get(key).and_then(Value::as_f64)
}

pub(crate) fn param_i64(params: &ParamMap, key: &str) -> Option<i64> {
    params.get(key).and_then(Value::as_i64)
}

pub(crate) fn param_str(params: &ParamMap, key: &str) -> Option<&str> {
    params.get(key).and_then(Value::as_str)
}
