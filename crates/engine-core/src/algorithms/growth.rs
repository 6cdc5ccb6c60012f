//! Growth algorithms (§4.B), applied per stat per entity.

use super::{AlgorithmError, GrowthAlgorithm, ParamMap, param_f64};
use crate::ids::StatName;

/// Identity growth: returns `base` unchanged at every level.
pub struct Flat;

impl GrowthAlgorithm for Flat {
    fn id(&self) -> &'static str {
        "flat"
    }

    fn description(&self) -> &'static str {
        "Stats never change with level."
    }

    fn parameters(&self) -> Vec<(&'static str, &'static str)> {
        vec![]
    }

    fn validate(&self, _params: &ParamMap) -> Result<(), AlgorithmError> {
        Ok(())
    }

    fn grow(&self, _stat: &StatName, base: f64, _level: u32, _params: &ParamMap) -> f64 {
        base
    }
}

/// `floor(base * (1 + perLevelMultiplier * (level - 1)) + additive * (level - 1))`
/// where `additive` is `additivePerLevel[stat]`, defaulting to 0.
pub struct Linear;

impl Linear {
    fn additive_for(params: &ParamMap, stat: &StatName) -> f64 {
        params
            .get("additivePerLevel")
            .and_then(|v| v.as_object())
            .and_then(|m| m.get(stat.as_str()))
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0)
    }
}

impl GrowthAlgorithm for Linear {
    fn id(&self) -> &'static str {
        "linear"
    }

    fn description(&self) -> &'static str {
        "Scales base stats linearly with character/gear level."
    }

    fn parameters(&self) -> Vec<(&'static str, &'static str)> {
        vec![
            (
                "perLevelMultiplier",
                "Fractional growth applied per level above 1 (default 0, identity).",
            ),
            (
                "additivePerLevel",
                "Optional map of stat name to a flat amount added per level above 1.",
            ),
        ]
    }

    fn validate(&self, params: &ParamMap) -> Result<(), AlgorithmError> {
        if let Some(v) = params.get("perLevelMultiplier")
            && v.as_f64().is_none()
        {
            return Err(AlgorithmError::InvalidParameter {
                algorithm_id: self.id().to_string(),
                parameter: "perLevelMultiplier".to_string(),
                reason: "must be a number".to_string(),
            });
        }
        if let Some(v) = params.get("additivePerLevel")
            && !v.is_object()
        {
            return Err(AlgorithmError::InvalidParameter {
                algorithm_id: self.id().to_string(),
                parameter: "additivePerLevel".to_string(),
                reason: "must be an object mapping stat name to number".to_string(),
            });
        }
        Ok(())
    }

    fn grow(&self, stat: &StatName, base: f64, level: u32, params: &ParamMap) -> f64 {
        let per_level_multiplier = param_f64(params, "perLevelMultiplier").unwrap_or(0.0);
        let additive = Self::additive_for(params, stat);
        let levels_above_one = (level.saturating_sub(1)) as f64;
        (base * (1.0 + per_level_multiplier * levels_above_one) + additive * levels_above_one)
            .floor()
    }
}

/// `floor(base * exponent^(level - 1))`
pub struct Exponential;

impl GrowthAlgorithm for Exponential {
    fn id(&self) -> &'static str {
        "exponential"
    }

    fn description(&self) -> &'static str {
        "Scales base stats exponentially with level."
    }

    fn parameters(&self) -> Vec<(&'static str, &'static str)> {
        vec![("exponent", "Per-level growth factor, must be >= 1.")]
    }

    fn validate(&self, params: &ParamMap) -> Result<(), AlgorithmError> {
        match param_f64(params, "exponent") {
            None => Err(AlgorithmError::MissingParameter {
                algorithm_id: self.id().to_string(),
                parameter: "exponent".to_string(),
            }),
            Some(e) if e < 1.0 => Err(AlgorithmError::InvalidParameter {
                algorithm_id: self.id().to_string(),
                parameter: "exponent".to_string(),
                reason: "must be >= 1".to_string(),
            }),
            Some(_) => Ok(()),
        }
    }

    fn grow(&self, _stat: &StatName, base: f64, level: u32, params: &ParamMap) -> f64 {
        let exponent = param_f64(params, "exponent").unwrap_or(1.0);
        (base * exponent.powi((level.saturating_sub(1)) as i32)).floor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(name: &str) -> StatName {
        StatName::from(name)
    }

    #[test]
    fn flat_is_identity() {
        let params = ParamMap::new();
        assert_eq!(Flat.grow(&stat("strength"), 5.0, 10, &params), 5.0);
    }

    #[test]
    fn linear_example_from_spec() {
        let mut params = ParamMap::new();
        params.insert("perLevelMultiplier".into(), serde_json::json!(0.1));
        params.insert(
            "additivePerLevel".into(),
            serde_json::json!({"hp": 1.0}),
        );
        // strength = floor((5+3)*1.1) after gear is summed elsewhere; here
        // test the raw per-stat growth: floor(5 * 1.1) = 5
        assert_eq!(Linear.grow(&stat("strength"), 5.0, 2, &params), 5.0);
        // hp = floor(20*1.1) + 1*1 = 22 + 1 = 23
        assert_eq!(Linear.grow(&stat("hp"), 20.0, 2, &params), 23.0);
    }

    #[test]
    fn linear_level_one_is_base() {
        let mut params = ParamMap::new();
        params.insert("perLevelMultiplier".into(), serde_json::json!(0.5));
        assert_eq!(Linear.grow(&stat("strength"), 5.0, 1, &params), 5.0);
    }

    #[test]
    fn exponential_requires_exponent() {
        let params = ParamMap::new();
        assert!(Exponential.validate(&params).is_err());
    }

    #[test]
    fn exponential_example() {
        let mut params = ParamMap::new();
        params.insert("exponent".into(), serde_json::json!(2.0));
        assert_eq!(Exponential.grow(&stat("strength"), 3.0, 4, &params), 24.0);
    }
}
