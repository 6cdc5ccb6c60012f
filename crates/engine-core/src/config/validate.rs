//! Configuration validation (§4.A).
//!
//! Loading a configuration parses it, then checks every cross-reference
//! closes within the same config and every algorithm id is known.
//! Any failure is fatal at startup (the caller turns this into a
//! non-zero process exit).

use crate::algorithms::{AlgorithmError, AlgorithmRegistry};
use crate::error::{ErrorSeverity, GameError};
use crate::ids::{ClassId, GearDefId, SetId, SlotId, StatName};

use super::GameConfig;

#[derive(Clone, Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("stat '{stat}' referenced by {owner} is not declared in config.stats")]
    UndeclaredStat { owner: String, stat: StatName },

    #[error("slot '{slot}' referenced by {owner} is not declared in config.slots")]
    UndeclaredSlot { owner: String, slot: SlotId },

    #[error("gearDef '{gear_def_id}' references undefined set '{set_id}'")]
    UndefinedSet {
        gear_def_id: GearDefId,
        set_id: SetId,
    },

    #[error("gearDef '{gear_def_id}' restriction references undefined class '{class_id}'")]
    UndefinedClassInRestriction {
        gear_def_id: GearDefId,
        class_id: ClassId,
    },

    #[error("algorithm slot '{slot}': {source}")]
    Algorithm {
        slot: &'static str,
        #[source]
        source: AlgorithmError,
    },
}

impl GameError for ConfigError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UndeclaredStat { .. } => "CONFIG_UNDECLARED_STAT",
            Self::UndeclaredSlot { .. } => "CONFIG_UNDECLARED_SLOT",
            Self::UndefinedSet { .. } => "CONFIG_UNDEFINED_SET",
            Self::UndefinedClassInRestriction { .. } => "CONFIG_UNDEFINED_CLASS",
            Self::Algorithm { .. } => "CONFIG_INVALID_ALGORITHM",
        }
    }
}

/// Validates every cross-reference in `config` resolves within itself,
/// and that every configured algorithm id/parameters are accepted by
/// the closed [`AlgorithmRegistry`].
pub fn validate_config(config: &GameConfig) -> Result<(), ConfigError> {
    for (class_id, class) in &config.classes {
        for stat in class.base_stats.keys() {
            if !config.has_stat(stat) {
                return Err(ConfigError::UndeclaredStat {
                    owner: format!("class '{class_id}'"),
                    stat: stat.clone(),
                });
            }
        }
    }

    for (gear_def_id, gear_def) in &config.gear_defs {
        for stat in gear_def.base_stats.keys() {
            if !config.has_stat(stat) {
                return Err(ConfigError::UndeclaredStat {
                    owner: format!("gearDef '{gear_def_id}'"),
                    stat: stat.clone(),
                });
            }
        }
        for pattern in &gear_def.equip_patterns {
            for slot in pattern {
                if !config.has_slot(slot) {
                    return Err(ConfigError::UndeclaredSlot {
                        owner: format!("gearDef '{gear_def_id}'"),
                        slot: slot.clone(),
                    });
                }
            }
        }
        if let Some(set_id) = &gear_def.set_id
            && !config.sets.contains_key(set_id)
        {
            return Err(ConfigError::UndefinedSet {
                gear_def_id: gear_def_id.clone(),
                set_id: set_id.clone(),
            });
        }
        if let Some(restrictions) = &gear_def.restrictions {
            for class_id in restrictions
                .allowed_classes
                .iter()
                .chain(restrictions.blocked_classes.iter())
                .flatten()
            {
                if !config.classes.contains_key(class_id) {
                    return Err(ConfigError::UndefinedClassInRestriction {
                        gear_def_id: gear_def_id.clone(),
                        class_id: class_id.clone(),
                    });
                }
            }
        }
    }

    for (set_id, set_def) in &config.sets {
        for bonus in &set_def.bonuses {
            for stat in bonus.bonus_stats.keys() {
                if !config.has_stat(stat) {
                    return Err(ConfigError::UndeclaredStat {
                        owner: format!("set '{set_id}'"),
                        stat: stat.clone(),
                    });
                }
            }
        }
    }

    for stat in config.stat_clamps.keys() {
        if !config.has_stat(stat) {
            return Err(ConfigError::UndeclaredStat {
                owner: "stat clamps".to_string(),
                stat: stat.clone(),
            });
        }
    }

    let registry = AlgorithmRegistry::new();
    validate_algorithm_ref(&registry, "growth", &config.algorithms.growth, true)?;
    validate_algorithm_ref(
        &registry,
        "levelCostCharacter",
        &config.algorithms.level_cost_character,
        false,
    )?;
    validate_algorithm_ref(
        &registry,
        "levelCostGear",
        &config.algorithms.level_cost_gear,
        false,
    )?;

    Ok(())
}

fn validate_algorithm_ref(
    registry: &AlgorithmRegistry,
    slot: &'static str,
    algorithm_ref: &super::AlgorithmRef,
    is_growth: bool,
) -> Result<(), ConfigError> {
    let params = &algorithm_ref.parameters;
    if is_growth {
        let algo = registry
            .growth(&algorithm_ref.algorithm_id)
            .map_err(|source| ConfigError::Algorithm { slot, source })?;
        algo.validate(params)
            .map_err(|source| ConfigError::Algorithm { slot, source })?;
    } else {
        let algo = registry
            .level_cost(&algorithm_ref.algorithm_id)
            .map_err(|source| ConfigError::Algorithm { slot, source })?;
        algo.validate(params)
            .map_err(|source| ConfigError::Algorithm { slot, source })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::minimal;

    #[test]
    fn accepts_minimal_config() {
        assert!(validate_config(&minimal()).is_ok());
    }

    #[test]
    fn rejects_undeclared_stat_in_class() {
        let mut cfg = minimal();
        cfg.classes
            .get_mut(&ClassId::from("warrior"))
            .unwrap()
            .base_stats
            .insert(StatName::from("mana"), 1.0);
        let err = validate_config(&cfg).unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_UNDECLARED_STAT");
    }

    #[test]
    fn rejects_unknown_algorithm() {
        let mut cfg = minimal();
        cfg.algorithms.growth.algorithm_id = "nonexistent".to_string();
        let err = validate_config(&cfg).unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_INVALID_ALGORITHM");
    }

    #[test]
    fn rejects_gear_def_referencing_unknown_slot() {
        let mut cfg = minimal();
        cfg.gear_defs
            .get_mut(&GearDefId::from("sword_basic"))
            .unwrap()
            .equip_patterns
            .push(vec![SlotId::from("head")]);
        let err = validate_config(&cfg).unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_UNDECLARED_SLOT");
    }
}
