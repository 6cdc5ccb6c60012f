//! Level-cost algorithms (§4.B): the resource price to reach a target
//! level from the level directly below it.

use std::collections::HashMap;

use super::{AlgorithmError, LevelCostAlgorithm, ParamMap, param_f64, param_str};
use crate::ids::ResourceKey;

/// `resourceId` may be dotted as `scope.key`; an undotted key is
/// treated as `player.<key>` per §4.B.
fn normalize_resource_key(raw: &str) -> ResourceKey {
    if raw.contains('.') {
        ResourceKey::from(raw)
    } else {
        ResourceKey::from(format!("player.{raw}"))
    }
}

/// Empty cost map at any level, registered under id `"flat"`.
pub struct FlatCost;

impl LevelCostAlgorithm for FlatCost {
    fn id(&self) -> &'static str {
        "flat"
    }

    fn description(&self) -> &'static str {
        "Leveling up never costs resources."
    }

    fn parameters(&self) -> Vec<(&'static str, &'static str)> {
        vec![]
    }

    fn validate(&self, _params: &ParamMap) -> Result<(), AlgorithmError> {
        Ok(())
    }

    fn cost_for_level(&self, _target_level: u32, _params: &ParamMap) -> HashMap<ResourceKey, i64> {
        HashMap::new()
    }
}

/// Identical to [`FlatCost`], registered under the spec's alternate id
/// `"free"`.
pub struct FreeCost;

impl LevelCostAlgorithm for FreeCost {
    fn id(&self) -> &'static str {
        "free"
    }

    fn description(&self) -> &'static str {
        "Leveling up never costs resources."
    }

    fn parameters(&self) -> Vec<(&'static str, &'static str)> {
        vec![]
    }

    fn validate(&self, _params: &ParamMap) -> Result<(), AlgorithmError> {
        Ok(())
    }

    fn cost_for_level(&self, _target_level: u32, _params: &ParamMap) -> HashMap<ResourceKey, i64> {
        HashMap::new()
    }
}

/// `{resourceId: base + perLevel * (N - 2)}` at `N >= 2`, empty at `N <= 1`.
pub struct LinearCost;

impl LevelCostAlgorithm for LinearCost {
    fn id(&self) -> &'static str {
        "linear_cost"
    }

    fn description(&self) -> &'static str {
        "A single resource whose price grows linearly with target level."
    }

    fn parameters(&self) -> Vec<(&'static str, &'static str)> {
        vec![
            (
                "resourceId",
                "Resource key, optionally dotted as scope.key (undotted => player.<key>).",
            ),
            ("base", "Cost to reach level 2."),
            ("perLevel", "Additional cost per target level above 2."),
        ]
    }

    fn validate(&self, params: &ParamMap) -> Result<(), AlgorithmError> {
        require_str(self.id(), params, "resourceId")?;
        require_f64(self.id(), params, "base")?;
        require_f64(self.id(), params, "perLevel")?;
        Ok(())
    }

    fn cost_for_level(&self, target_level: u32, params: &ParamMap) -> HashMap<ResourceKey, i64> {
        if target_level <= 1 {
            return HashMap::new();
        }
        let Some(resource_id) = param_str(params, "resourceId") else {
            return HashMap::new();
        };
        let base = param_f64(params, "base").unwrap_or(0.0);
        let per_level = param_f64(params, "perLevel").unwrap_or(0.0);
        let amount = base + per_level * (target_level as f64 - 2.0);

        let mut out = HashMap::new();
        out.insert(normalize_resource_key(resource_id), amount.round() as i64);
        out
    }
}

/// Multiple independent linear-cost resources, each explicitly scoped.
pub struct MixedLinearCost;

struct CostEntry {
    scope: String,
    resource_id: String,
    base: f64,
    per_level: f64,
}

fn parse_entries(params: &ParamMap) -> Vec<CostEntry> {
    params
        .get("costs")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|entry| {
                    let obj = entry.as_object()?;
                    Some(CostEntry {
                        scope: obj.get("scope")?.as_str()?.to_string(),
                        resource_id: obj.get("resourceId")?.as_str()?.to_string(),
                        base: obj.get("base")?.as_f64()?,
                        per_level: obj.get("perLevel")?.as_f64()?,
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

impl LevelCostAlgorithm for MixedLinearCost {
    fn id(&self) -> &'static str {
        "mixed_linear_cost"
    }

    fn description(&self) -> &'static str {
        "Several independent linear-cost resources, each scoped explicitly."
    }

    fn parameters(&self) -> Vec<(&'static str, &'static str)> {
        vec![(
            "costs",
            "Array of {scope, resourceId, base, perLevel}; output keys are scope.resourceId.",
        )]
    }

    fn validate(&self, params: &ParamMap) -> Result<(), AlgorithmError> {
        let raw = params.get("costs").ok_or_else(|| AlgorithmError::MissingParameter {
            algorithm_id: self.id().to_string(),
            parameter: "costs".to_string(),
        })?;
        let arr = raw.as_array().ok_or_else(|| AlgorithmError::InvalidParameter {
            algorithm_id: self.id().to_string(),
            parameter: "costs".to_string(),
            reason: "must be an array".to_string(),
        })?;
        if arr.is_empty() {
            return Err(AlgorithmError::InvalidParameter {
                algorithm_id: self.id().to_string(),
                parameter: "costs".to_string(),
                reason: "must have at least one entry".to_string(),
            });
        }
        for (i, entry) in arr.iter().enumerate() {
            let obj = entry.as_object().ok_or_else(|| AlgorithmError::InvalidParameter {
                algorithm_id: self.id().to_string(),
                parameter: format!("costs[{i}]"),
                reason: "must be an object".to_string(),
            })?;
            for field in ["scope", "resourceId"] {
                if obj.get(field).and_then(|v| v.as_str()).is_none() {
                    return Err(AlgorithmError::InvalidParameter {
                        algorithm_id: self.id().to_string(),
                        parameter: format!("costs[{i}].{field}"),
                        reason: "must be a string".to_string(),
                    });
                }
            }
            for field in ["base", "perLevel"] {
                if obj.get(field).and_then(|v| v.as_f64()).is_none() {
                    return Err(AlgorithmError::InvalidParameter {
                        algorithm_id: self.id().to_string(),
                        parameter: format!("costs[{i}].{field}"),
                        reason: "must be a number".to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn cost_for_level(&self, target_level: u32, params: &ParamMap) -> HashMap<ResourceKey, i64> {
        if target_level <= 1 {
            return HashMap::new();
        }
        let mut out = HashMap::new();
        for entry in parse_entries(params) {
            let amount = entry.base + entry.per_level * (target_level as f64 - 2.0);
            let key = ResourceKey::from(format!("{}.{}", entry.scope, entry.resource_id));
            *out.entry(key).or_insert(0) += amount.round() as i64;
        }
        out
    }
}

fn require_str(
    algorithm_id: &str,
    params: &ParamMap,
    name: &str,
) -> Result<(), AlgorithmError> {
    if param_str(params, name).is_some() {
        Ok(())
    } else {
        Err(AlgorithmError::MissingParameter {
            algorithm_id: algorithm_id.to_string(),
            parameter: name.to_string(),
        })
    }
}

fn require_f64(
    algorithm_id: &str,
    params: &ParamMap,
    name: &str,
) -> Result<(), AlgorithmError> {
    if param_f64(params, name).is_some() {
        Ok(())
    } else {
        Err(AlgorithmError::MissingParameter {
            algorithm_id: algorithm_id.to_string(),
            parameter: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_params() -> ParamMap {
        let mut p = ParamMap::new();
        p.insert("resourceId".into(), serde_json::json!("gold"));
        p.insert("base".into(), serde_json::json!(10));
        p.insert("perLevel".into(), serde_json::json!(5));
        p
    }

    #[test]
    fn linear_cost_empty_below_level_two() {
        let p = linear_params();
        assert!(LinearCost.cost_for_level(1, &p).is_empty());
    }

    #[test]
    fn linear_cost_undotted_defaults_to_player_scope() {
        let p = linear_params();
        let cost = LinearCost.cost_for_level(2, &p);
        assert_eq!(cost.get(&ResourceKey::from("player.gold")), Some(&10));
    }

    #[test]
    fn linear_cost_grows_with_level() {
        let p = linear_params();
        let cost = LinearCost.cost_for_level(4, &p);
        // base + perLevel * (4 - 2) = 10 + 5*2 = 20
        assert_eq!(cost.get(&ResourceKey::from("player.gold")), Some(&20));
    }

    #[test]
    fn mixed_linear_cost_prefixes_by_scope() {
        let mut p = ParamMap::new();
        p.insert(
            "costs".into(),
            serde_json::json!([
                {"scope": "player", "resourceId": "gold", "base": 10, "perLevel": 2},
                {"scope": "character", "resourceId": "xp", "base": 5, "perLevel": 1},
            ]),
        );
        let cost = MixedLinearCost.cost_for_level(3, &p);
        assert_eq!(cost.get(&ResourceKey::from("player.gold")), Some(&12));
        assert_eq!(cost.get(&ResourceKey::from("character.xp")), Some(&6));
    }

    #[test]
    fn flat_and_free_are_always_empty() {
        let p = ParamMap::new();
        assert!(FlatCost.cost_for_level(50, &p).is_empty());
        assert!(FreeCost.cost_for_level(50, &p).is_empty());
    }
}
