//! Migrator (§4.I): best-effort reconciliation of a restored
//! [`GameState`] against the currently active [`GameConfig`].
//!
//! Grounded on the teacher's design note that migration should be a
//! pure function — `(state, config) -> (state, report)` — with no I/O,
//! so it is trivially unit-testable in isolation (`runtime/src/runtime.rs`
//! and friends always wrap owned values rather than references for the
//! same reason).

use serde::Serialize;

use crate::config::GameConfig;
use crate::ids::{CharacterId, GearDefId, GearId, SlotId};
use crate::state::GameState;

/// One warning emitted while reconciling a restored state against the
/// active config. Each variant corresponds to one rule in §4.I.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum MigrationWarning {
    SlotRemoved {
        character_id: CharacterId,
        slot: SlotId,
    },
    GearDefOrphaned {
        gear_id: GearId,
        gear_def_id: GearDefId,
    },
    EquipPatternMismatch {
        gear_id: GearId,
    },
    ClassOrphaned {
        character_id: CharacterId,
    },
}

/// Summary of everything the migrator changed.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MigrationReport {
    pub warnings: Vec<MigrationWarning>,
}

impl MigrationReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Runs the full migration pipeline over `state` against `config`,
/// returning the reconciled state and a report of everything touched.
/// Never removes characters or gear instances; only breaks broken
/// references (§4.I, final paragraph).
pub fn migrate(mut state: GameState, config: &GameConfig) -> (GameState, MigrationReport) {
    let mut report = MigrationReport::default();

    // Step 1: stamp configId.
    state.config_id = config.config_id.clone();

    // Step 2: normalize missing legacy fields. serde(default) already
    // fills these in at deserialization time, so there's nothing left
    // to backfill here.

    // Step 3: slot removal — drop equipped slots that no longer exist
    // in the active config.
    for player in state.players.values_mut() {
        for character in player.characters.values_mut() {
            let removed: Vec<SlotId> = character
                .equipped
                .keys()
                .filter(|slot| !config.has_slot(slot))
                .cloned()
                .collect();
            for slot in removed {
                character.equipped.remove(&slot);
                report.warnings.push(MigrationWarning::SlotRemoved {
                    character_id: character.id.clone(),
                    slot,
                });
            }
        }
    }

    // Step 4: orphaned gearDef — gear whose definition no longer
    // exists is unequipped (but kept in inventory).
    for player in state.players.values_mut() {
        let orphaned_gear_ids: Vec<GearId> = player
            .gear
            .values()
            .filter(|gear| !config.gear_defs.contains_key(&gear.gear_def_id))
            .map(|gear| gear.id.clone())
            .collect();

        for gear_id in &orphaned_gear_ids {
            let gear_def_id = player.gear[gear_id].gear_def_id.clone();
            let holder = player.gear[gear_id].equipped_by.clone();
            player.gear.get_mut(gear_id).unwrap().equipped_by = None;
            if let Some(char_id) = holder {
                if let Some(character) = player.characters.get_mut(&char_id) {
                    character.equipped.retain(|_, g| g != gear_id);
                }
            }
            report.warnings.push(MigrationWarning::GearDefOrphaned {
                gear_id: gear_id.clone(),
                gear_def_id,
            });
        }
    }

    // Step 5: pattern mismatch — for gear whose gearDef is known,
    // check the still-occupied slots exactly match one of its
    // equipPatterns as a multiset (order-insensitive — see
    // SPEC_FULL.md's Open Question resolutions for why this disagrees
    // with EquipGear's order-sensitive check).
    for player in state.players.values_mut() {
        let mut occupied_by_gear: std::collections::HashMap<GearId, Vec<(CharacterId, SlotId)>> =
            std::collections::HashMap::new();
        for character in player.characters.values() {
            for (slot, gear_id) in &character.equipped {
                occupied_by_gear
                    .entry(gear_id.clone())
                    .or_default()
                    .push((character.id.clone(), slot.clone()));
            }
        }

        for (gear_id, occupants) in occupied_by_gear {
            let Some(gear) = player.gear.get(&gear_id) else {
                continue;
            };
            let Some(gear_def) = config.gear_defs.get(&gear.gear_def_id) else {
                continue;
            };

            let mut occupied_slots: Vec<SlotId> =
                occupants.iter().map(|(_, slot)| slot.clone()).collect();
            occupied_slots.sort();

            let matches_any = gear_def.equip_patterns.iter().any(|pattern| {
                let mut sorted = pattern.clone();
                sorted.sort();
                sorted == occupied_slots
            });

            if !matches_any {
                for (char_id, slot) in &occupants {
                    if let Some(character) = player.characters.get_mut(char_id) {
                        character.equipped.remove(slot);
                    }
                }
                if let Some(gear) = player.gear.get_mut(&gear_id) {
                    gear.equipped_by = None;
                }
                report
                    .warnings
                    .push(MigrationWarning::EquipPatternMismatch { gear_id });
            }
        }
    }

    // Step 6: orphaned class — warn only, no mutation.
    for player in state.players.values() {
        for character in player.characters.values() {
            if !config.classes.contains_key(&character.class_id) {
                report.warnings.push(MigrationWarning::ClassOrphaned {
                    character_id: character.id.clone(),
                });
            }
        }
    }

    // Step 7: bidirectional invariants.
    for player in state.players.values_mut() {
        let char_ids: Vec<CharacterId> = player.characters.keys().cloned().collect();

        // Forward: any slot pointing to missing/mismatched gear is cleared.
        for character in player.characters.values_mut() {
            character.equipped.retain(|_slot, gear_id| {
                match player.gear.get(gear_id).and_then(|g| g.equipped_by.clone()) {
                    Some(owner) => owner == character.id,
                    None => false,
                }
            });
        }

        // Reverse: any gear whose claimed owner is missing, or whose
        // owner has no slot referencing it back, has equippedBy cleared.
        for gear in player.gear.values_mut() {
            if let Some(char_id) = gear.equipped_by.clone() {
                let valid = char_ids.contains(&char_id);
                gear.equipped_by = if valid { Some(char_id) } else { None };
            }
        }
        // Second reverse pass needs the (possibly just-trimmed)
        // characters' equipped maps, so it runs after the forward pass
        // above has already removed dangling slots.
        let gear_ids_referenced: std::collections::HashSet<GearId> = player
            .characters
            .values()
            .flat_map(|c| c.equipped.values().cloned())
            .collect();
        for gear in player.gear.values_mut() {
            if gear.equipped_by.is_some() && !gear_ids_referenced.contains(&gear.id) {
                gear.equipped_by = None;
            }
        }
    }

    // Step 8: bump stateVersion only if something was actually changed.
    if !report.is_clean() {
        state.bump_version();
    }

    (state, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::minimal;
    use crate::ids::{ClassId, ConfigId, GearDefId as GDId, InstanceId, PlayerId};
    use crate::state::{Character, Gear, Player};

    fn state_with(player: Player) -> GameState {
        let mut state = GameState::empty(InstanceId::from("instance_001"), ConfigId::from("old"), 10);
        state.players.insert(player.id.clone(), player);
        state
    }

    #[test]
    fn scenario_six_from_spec_sets_to_minimal() {
        let config = minimal();

        let mut player = Player::new(PlayerId::from("p1"));
        let mut character = Character::new(crate::ids::CharacterId::from("c1"), ClassId::from("warrior"));

        let sword = Gear::new(crate::ids::GearId::from("sword1"), GDId::from("sword_basic"));
        let mut sword = sword;
        sword.equipped_by = Some(character.id.clone());
        character
            .equipped
            .insert(SlotId::from("right_hand"), sword.id.clone());

        let mut helm = Gear::new(crate::ids::GearId::from("helm1"), GDId::from("warrior_helm"));
        helm.equipped_by = Some(character.id.clone());
        character
            .equipped
            .insert(SlotId::from("head"), helm.id.clone());

        player.gear.insert(sword.id.clone(), sword);
        player.gear.insert(helm.id.clone(), helm);
        player.characters.insert(character.id.clone(), character);

        let state = state_with(player);
        let before_version = state.state_version;

        let (migrated, report) = migrate(state, &config);

        let player = migrated.players.get(&PlayerId::from("p1")).unwrap();
        let character = player
            .characters
            .get(&crate::ids::CharacterId::from("c1"))
            .unwrap();

        assert!(!character.equipped.contains_key(&SlotId::from("head")));
        assert_eq!(
            character.equipped.get(&SlotId::from("right_hand")),
            Some(&crate::ids::GearId::from("sword1"))
        );
        assert!(player.gear.contains_key(&crate::ids::GearId::from("helm1")));
        assert_eq!(
            player.gear[&crate::ids::GearId::from("helm1")].equipped_by,
            None
        );
        assert_eq!(migrated.state_version, before_version + 1);
        assert!(report.warnings.iter().any(|w| matches!(
            w,
            MigrationWarning::SlotRemoved { slot, .. } if *slot == SlotId::from("head")
        )));
        assert!(migrated.check_equip_invariant().is_ok());
    }

    #[test]
    fn no_warnings_leaves_version_unchanged() {
        let config = minimal();
        let player = Player::new(PlayerId::from("p1"));
        let state = state_with(player);
        let version = state.state_version;
        let (migrated, report) = migrate(state, &config);
        assert!(report.is_clean());
        assert_eq!(migrated.state_version, version);
    }

    #[test]
    fn round_trip_with_same_config_is_a_no_op() {
        let config = minimal();
        let mut player = Player::new(PlayerId::from("p1"));
        let character = Character::new(crate::ids::CharacterId::from("c1"), ClassId::from("warrior"));
        player.characters.insert(character.id.clone(), character);
        let state = state_with(player);
        let snapshot = serde_json::to_string(&state).unwrap();
        let restored: GameState = serde_json::from_str(&snapshot).unwrap();
        let (migrated, report) = migrate(restored, &config);
        assert!(report.is_clean());
        assert!(migrated.check_equip_invariant().is_ok());
    }
}
