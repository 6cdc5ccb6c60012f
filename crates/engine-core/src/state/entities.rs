//! Entity types owned by a [`GameState`](super::GameState) (§3).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ids::{CharacterId, ClassId, GearDefId, GearId, PlayerId, ResourceKey, SlotId};

/// A resource wallet: stringly-keyed integer amounts. Values are
/// normally non-negative but `GrantResources`/`GrantCharacterResources`
/// may apply a negative delta (an intentional admin debit, see
/// SPEC_FULL.md's Open Question resolutions), so the wallet itself
/// does not enforce non-negativity beyond what the processor checks
/// before a spend.
pub type Wallet = HashMap<ResourceKey, i64>;

/// A credential holder. Owned by the [`GameState`](super::GameState);
/// created only via the `CreateActor` admin operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: crate::ids::ActorId,
    pub api_key: String,
    pub player_ids: Vec<PlayerId>,
}

/// A container of characters, gear, and a resource wallet. Owned by
/// exactly one [`Actor`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    #[serde(default)]
    pub characters: HashMap<CharacterId, Character>,
    #[serde(default)]
    pub gear: HashMap<GearId, Gear>,
    #[serde(default)]
    pub resources: Wallet,
}

impl Player {
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            characters: HashMap::new(),
            gear: HashMap::new(),
            resources: Wallet::new(),
        }
    }
}

/// A leveled entity belonging to a player, with a class and equipment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub class_id: ClassId,
    pub level: u32,
    #[serde(default)]
    pub equipped: HashMap<SlotId, GearId>,
    #[serde(default)]
    pub resources: Wallet,
}

impl Character {
    pub fn new(id: CharacterId, class_id: ClassId) -> Self {
        Self {
            id,
            class_id,
            level: 1,
            equipped: HashMap::new(),
            resources: Wallet::new(),
        }
    }
}

/// A leveled inventory item belonging to a player; may be equipped to
/// one of the player's characters across a multi-slot pattern.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Gear {
    pub id: GearId,
    pub gear_def_id: GearDefId,
    pub level: u32,
    #[serde(default)]
    pub equipped_by: Option<CharacterId>,
}

impl Gear {
    pub fn new(id: GearId, gear_def_id: GearDefId) -> Self {
        Self {
            id,
            gear_def_id,
            level: 1,
            equipped_by: None,
        }
    }

    pub fn is_equipped(&self) -> bool {
        self.equipped_by.is_some()
    }
}
