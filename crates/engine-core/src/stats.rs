//! Stat calculator (§4.G): class base -> per-level growth -> gear
//! contributions -> set bonuses -> clamps.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::algorithms::AlgorithmRegistry;
use crate::config::GameConfig;
use crate::error::{ErrorSeverity, GameError};
use crate::ids::{CharacterId, ClassId, StatName};
use crate::state::Player;

#[derive(Clone, Debug, thiserror::Error)]
pub enum StatsError {
    #[error("character '{0}' not found")]
    CharacterNotFound(CharacterId),
}

impl GameError for StatsError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        "CHARACTER_NOT_FOUND"
    }
}

/// Computed, final stats for one character (§4.J `GET
/// character/:id/stats`).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CharacterStats {
    pub character_id: CharacterId,
    pub class_id: ClassId,
    pub level: u32,
    pub final_stats: HashMap<StatName, f64>,
}

/// Computes final stats for `character_id` within `player`.
///
/// A character whose `classId` no longer resolves in `config` (an
/// orphaned class, left behind by a migration) contributes zero base
/// stats rather than failing the read (§4.I "Runtime consequences of
/// orphaned state").
pub fn compute_stats(
    config: &GameConfig,
    registry: &AlgorithmRegistry,
    player: &Player,
    character_id: &CharacterId,
) -> Result<CharacterStats, StatsError> {
    let character = player
        .characters
        .get(character_id)
        .ok_or_else(|| StatsError::CharacterNotFound(character_id.clone()))?;

    let growth_id = &config.algorithms.growth.algorithm_id;
    let growth_params = &config.algorithms.growth.parameters;

    let class_base = config
        .classes
        .get(&character.class_id)
        .map(|c| c.base_stats.clone())
        .unwrap_or_default();

    let mut accumulator: HashMap<StatName, f64> =
        registry.grow_stats(growth_id, growth_params, &class_base, character.level);

    // Count each equipped gear instance once, not once per slot.
    let distinct_gear_ids: HashSet<_> = character.equipped.values().collect();

    // Track which sets are activated and by how many pieces, for the
    // set-bonus pass below.
    let mut set_pieces: HashMap<crate::ids::SetId, u32> = HashMap::new();

    for gear_id in &distinct_gear_ids {
        let Some(gear) = player.gear.get(*gear_id) else {
            continue;
        };
        let Some(gear_def) = config.gear_defs.get(&gear.gear_def_id) else {
            // Orphaned gearDef: contribution is zero (§4.G step 3).
            continue;
        };

        let grown = registry.grow_stats(growth_id, growth_params, &gear_def.base_stats, gear.level);
        for (stat, value) in grown {
            *accumulator.entry(stat).or_insert(0.0) += value;
        }

        if let Some(set_id) = &gear_def.set_id {
            *set_pieces.entry(set_id.clone()).or_insert(0) += gear_def.piece_count();
        }
    }

    for (set_id, activated_pieces) in &set_pieces {
        let Some(set_def) = config.sets.get(set_id) else {
            continue;
        };
        for bonus in &set_def.bonuses {
            if bonus.pieces <= *activated_pieces {
                for (stat, value) in &bonus.bonus_stats {
                    *accumulator.entry(stat.clone()).or_insert(0.0) += value;
                }
            }
        }
    }

    for (stat, clamp) in &config.stat_clamps {
        if let Some(value) = accumulator.get_mut(stat) {
            if let Some(min) = clamp.min {
                *value = value.max(min);
            }
            if let Some(max) = clamp.max {
                *value = value.min(max);
            }
        }
    }

    let final_stats = accumulator
        .into_iter()
        .filter(|(stat, _)| config.has_stat(stat))
        .collect();

    Ok(CharacterStats {
        character_id: character_id.clone(),
        class_id: character.class_id.clone(),
        level: character.level,
        final_stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::minimal;
    use crate::ids::{CharacterId as CId, GearDefId, GearId, PlayerId, SlotId};
    use crate::state::{Character, Gear};

    fn setup() -> (GameConfig, AlgorithmRegistry, Player) {
        let config = minimal();
        let registry = AlgorithmRegistry::new();
        let mut player = Player::new(PlayerId::from("p1"));
        let mut character = Character::new(CId::from("c1"), ClassId::from("warrior"));
        let mut gear = Gear::new(GearId::from("g1"), GearDefId::from("sword_basic"));
        gear.equipped_by = Some(character.id.clone());
        character
            .equipped
            .insert(SlotId::from("right_hand"), gear.id.clone());
        player.characters.insert(character.id.clone(), character);
        player.gear.insert(gear.id.clone(), gear);
        (config, registry, player)
    }

    #[test]
    fn scenario_one_from_spec() {
        let (config, registry, player) = setup();
        let stats = compute_stats(&config, &registry, &player, &CId::from("c1")).unwrap();
        assert_eq!(stats.final_stats.get(&StatName::from("strength")), Some(&8.0));
        assert_eq!(stats.final_stats.get(&StatName::from("hp")), Some(&20.0));
    }

    #[test]
    fn scenario_two_level_up_from_spec() {
        let (config, registry, mut player) = setup();
        player
            .characters
            .get_mut(&CId::from("c1"))
            .unwrap()
            .level = 2;
        let stats = compute_stats(&config, &registry, &player, &CId::from("c1")).unwrap();
        // strength = floor((5+3)*1.1) = 8
        assert_eq!(stats.final_stats.get(&StatName::from("strength")), Some(&8.0));
        // hp = floor(20*1.1) + 1 = 23
        assert_eq!(stats.final_stats.get(&StatName::from("hp")), Some(&23.0));
    }

    #[test]
    fn scenario_three_level_ten_with_no_gear_from_spec() {
        let config = minimal();
        let registry = AlgorithmRegistry::new();
        let mut player = Player::new(PlayerId::from("p1"));
        let mut character = Character::new(CId::from("c1"), ClassId::from("warrior"));
        character.level = 10;
        player.characters.insert(character.id.clone(), character);

        let stats = compute_stats(&config, &registry, &player, &CId::from("c1")).unwrap();
        // strength = floor(5*(1+0.1*9)) = floor(5*1.9) = 9
        assert_eq!(stats.final_stats.get(&StatName::from("strength")), Some(&9.0));
        // hp = floor(20*1.9) + 1*9 = 38 + 9 = 47
        assert_eq!(stats.final_stats.get(&StatName::from("hp")), Some(&47.0));
    }

    #[test]
    fn orphaned_class_contributes_zero_base() {
        let (config, registry, mut player) = setup();
        player
            .characters
            .get_mut(&CId::from("c1"))
            .unwrap()
            .class_id = ClassId::from("ghost_class");
        let stats = compute_stats(&config, &registry, &player, &CId::from("c1")).unwrap();
        // Only the sword's strength contribution of 3 remains.
        assert_eq!(stats.final_stats.get(&StatName::from("strength")), Some(&3.0));
    }

    #[test]
    fn gear_counted_once_even_across_multiple_slots() {
        let (mut config, registry, mut player) = setup();
        config
            .gear_defs
            .get_mut(&GearDefId::from("sword_basic"))
            .unwrap()
            .equip_patterns
            .push(vec![SlotId::from("right_hand"), SlotId::from("left_hand")]);
        let char_id = CId::from("c1");
        let gear_id = GearId::from("g1");
        player
            .characters
            .get_mut(&char_id)
            .unwrap()
            .equipped
            .insert(SlotId::from("left_hand"), gear_id.clone());
        let stats = compute_stats(&config, &registry, &player, &char_id).unwrap();
        // Still +3 strength from the single gear instance, not +6.
        assert_eq!(stats.final_stats.get(&StatName::from("strength")), Some(&8.0));
    }

    #[test]
    fn set_bonus_tiers_from_spec_scenario_five() {
        use crate::config::{SetBonus, SetDef};
        use crate::ids::SetId;

        let (mut config, registry, _player) = setup();
        config.sets.insert(
            SetId::from("armor_set"),
            SetDef {
                bonuses: vec![
                    SetBonus {
                        pieces: 2,
                        bonus_stats: HashMap::from([(StatName::from("strength"), 2.0)]),
                    },
                    SetBonus {
                        pieces: 4,
                        bonus_stats: HashMap::from([(StatName::from("hp"), 10.0)]),
                    },
                ],
            },
        );
        for i in 0..4 {
            config.gear_defs.insert(
                GearDefId::from(format!("piece_{i}")),
                crate::config::GearDef {
                    base_stats: HashMap::new(),
                    equip_patterns: vec![vec![SlotId::from(format!("slot_{i}"))]],
                    set_id: Some(SetId::from("armor_set")),
                    set_piece_count: None,
                    restrictions: None,
                },
            );
            config.slots.push(SlotId::from(format!("slot_{i}")));
        }

        let mut player = Player::new(PlayerId::from("p1"));
        let mut character = Character::new(CId::from("c1"), ClassId::from("warrior"));
        for i in 0..4 {
            let gear = Gear::new(
                GearId::from(format!("gear_{i}")),
                GearDefId::from(format!("piece_{i}")),
            );
            character
                .equipped
                .insert(SlotId::from(format!("slot_{i}")), gear.id.clone());
            let mut gear = gear;
            gear.equipped_by = Some(character.id.clone());
            player.gear.insert(gear.id.clone(), gear);
        }
        player.characters.insert(character.id.clone(), character);

        let stats = compute_stats(&config, &registry, &player, &CId::from("c1")).unwrap();
        assert_eq!(stats.final_stats.get(&StatName::from("strength")), Some(&7.0));
        assert_eq!(stats.final_stats.get(&StatName::from("hp")), Some(&30.0));
    }
}
