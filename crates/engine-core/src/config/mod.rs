//! Game configuration model (§3, §4.A).
//!
//! `GameConfig` is treated as immutable for the lifetime of a running
//! instance; replacing it requires a process restart driven externally.
//! Loading always goes through [`validate`](super::config::validate),
//! never constructed directly from untrusted input.

mod validate;

pub use validate::{ConfigError, validate_config};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ids::{ClassId, ConfigId, GearDefId, SetId, SlotId, StatName};

/// A reference to a registered algorithm plus its raw parameters.
///
/// Parameters are kept as an untyped JSON object because each algorithm
/// family defines its own parameter contract (see `algorithms`); the
/// registry validates them at config-load time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmRef {
    pub algorithm_id: String,
    #[serde(default)]
    pub parameters: serde_json::Map<String, serde_json::Value>,
}

/// The three algorithm slots a config must fill.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmsConfig {
    pub growth: AlgorithmRef,
    pub level_cost_character: AlgorithmRef,
    pub level_cost_gear: AlgorithmRef,
}

/// A class definition: base stats before growth is applied.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassDef {
    #[serde(default)]
    pub base_stats: HashMap<StatName, f64>,
}

/// Restrictions gating whether a piece of gear may be equipped.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GearRestrictions {
    #[serde(default)]
    pub allowed_classes: Option<Vec<ClassId>>,
    #[serde(default)]
    pub blocked_classes: Option<Vec<ClassId>>,
    #[serde(default)]
    pub required_character_level: Option<u32>,
    #[serde(default)]
    pub max_level_delta: Option<i64>,
}

/// A gear definition: base stats, valid equip patterns, and optional
/// set membership / restrictions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GearDef {
    #[serde(default)]
    pub base_stats: HashMap<StatName, f64>,
    /// Ordered slot-id sequences this gear instance may occupy at once.
    #[serde(default)]
    pub equip_patterns: Vec<Vec<SlotId>>,
    #[serde(default)]
    pub set_id: Option<SetId>,
    #[serde(default)]
    pub set_piece_count: Option<u32>,
    #[serde(default)]
    pub restrictions: Option<GearRestrictions>,
}

impl GearDef {
    /// `setPieceCount`, defaulting to 1 per §4.G step 4.
    pub fn piece_count(&self) -> u32 {
        self.set_piece_count.unwrap_or(1)
    }
}

/// A single tier of a set's bonus schedule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SetBonus {
    pub pieces: u32,
    #[serde(default)]
    pub bonus_stats: HashMap<StatName, f64>,
}

/// A set: an ordered schedule of tiered bonuses.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SetDef {
    #[serde(default)]
    pub bonuses: Vec<SetBonus>,
}

/// A clamp applied to a single stat after all contributions are summed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatClamp {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

/// The full, immutable configuration for one running instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub config_id: ConfigId,
    pub max_level: u32,
    pub stats: Vec<StatName>,
    pub slots: Vec<SlotId>,
    pub classes: HashMap<ClassId, ClassDef>,
    pub gear_defs: HashMap<GearDefId, GearDef>,
    pub sets: HashMap<SetId, SetDef>,
    pub algorithms: AlgorithmsConfig,
    #[serde(default)]
    pub stat_clamps: HashMap<StatName, StatClamp>,
}

impl GameConfig {
    pub fn has_slot(&self, slot: &SlotId) -> bool {
        self.slots.contains(slot)
    }

    pub fn has_stat(&self, stat: &StatName) -> bool {
        self.stats.contains(stat)
    }

    /// Parses and validates a `GameConfig` from its already-deserialized
    /// form. Loading the JSON bytes themselves is the server binary's
    /// concern (file I/O is out of scope here).
    pub fn validated(self) -> Result<Self, ConfigError> {
        validate_config(&self)?;
        Ok(self)
    }
}
