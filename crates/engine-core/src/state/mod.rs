//! In-memory state model (§3, §4.C).
//!
//! [`GameState`] is the authoritative, per-instance snapshot. It is
//! mutated only through the transaction processor
//! ([`crate::tx::processor`]); everything else (reads, the stat
//! calculator, the migrator) only borrows it.

pub mod entities;
pub mod idempotency;

pub use entities::{Actor, Character, Gear, Player, Wallet};
pub use idempotency::IdempotencyCache;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ids::{ActorId, ConfigId, InstanceId, PlayerId};

/// Per-instance authoritative game state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameState {
    pub instance_id: InstanceId,
    pub config_id: ConfigId,
    pub state_version: u64,
    #[serde(default)]
    pub actors: HashMap<ActorId, Actor>,
    #[serde(default)]
    pub players: HashMap<PlayerId, Player>,
    #[serde(default)]
    pub idempotency: IdempotencyCache,
}

impl GameState {
    /// A fresh, empty instance at `stateVersion = 0` (§4.C).
    pub fn empty(instance_id: InstanceId, config_id: ConfigId, idempotency_bound: usize) -> Self {
        Self {
            instance_id,
            config_id,
            state_version: 0,
            actors: HashMap::new(),
            players: HashMap::new(),
            idempotency: IdempotencyCache::new(idempotency_bound),
        }
    }

    pub fn bump_version(&mut self) {
        self.state_version = self
            .state_version
            .checked_add(1)
            .expect("stateVersion overflowed u64");
    }

    pub fn find_actor_by_api_key(&self, api_key: &str) -> Option<&Actor> {
        self.actors.values().find(|a| a.api_key == api_key)
    }

    pub fn actor_owns_player(&self, actor_id: &ActorId, player_id: &PlayerId) -> bool {
        self.actors
            .get(actor_id)
            .is_some_and(|actor| actor.player_ids.contains(player_id))
    }

    pub fn api_key_in_use(&self, api_key: &str) -> bool {
        self.actors.values().any(|a| a.api_key == api_key)
    }

    /// Checks invariant #1 (§3): the equip relation between characters
    /// and gear is bidirectionally consistent. Used by tests and by
    /// the migrator's self-check; the processor is written so this
    /// never needs to be enforced reactively in normal operation.
    pub fn check_equip_invariant(&self) -> Result<(), String> {
        for player in self.players.values() {
            for character in player.characters.values() {
                for (slot, gear_id) in &character.equipped {
                    let gear = player.gear.get(gear_id).ok_or_else(|| {
                        format!(
                            "character '{}' slot '{}' references missing gear '{}'",
                            character.id, slot, gear_id
                        )
                    })?;
                    if gear.equipped_by.as_ref() != Some(&character.id) {
                        return Err(format!(
                            "gear '{}' equippedBy does not point back to character '{}'",
                            gear_id, character.id
                        ));
                    }
                }
            }
            for gear in player.gear.values() {
                if let Some(char_id) = &gear.equipped_by {
                    let character = player.characters.get(char_id).ok_or_else(|| {
                        format!(
                            "gear '{}' equippedBy references missing character '{}'",
                            gear.id, char_id
                        )
                    })?;
                    if !character.equipped.values().any(|g| g == &gear.id) {
                        return Err(format!(
                            "gear '{}' equippedBy='{}' but character has no slot referencing it",
                            gear.id, char_id
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_has_version_zero() {
        let state = GameState::empty(
            InstanceId::from("instance_001"),
            ConfigId::from("cfg"),
            100,
        );
        assert_eq!(state.state_version, 0);
        assert!(state.check_equip_invariant().is_ok());
    }
}
