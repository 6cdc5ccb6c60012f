//! `EquipGear` / `UnequipGear` (§4.F.1, §4.F.2).
//!
//! Both are implemented as "check everything first, mutate last": every
//! precondition is evaluated against borrowed, unmodified state before
//! any field is written, so a failing step never leaves a partial
//! mutation behind (§4.F.1, final paragraph).

use std::collections::HashSet;

use crate::config::GameConfig;
use crate::ids::{CharacterId, GearId, SlotId};
use crate::state::Player;
use crate::tx::error::TxError;

/// Equips `gear_id` onto `character_id`, per §4.F.1.
///
/// `slot_pattern` is the caller-supplied explicit pattern, if any;
/// `swap` selects swap mode (displacing occupants) over strict mode
/// (failing on any occupied target slot).
pub fn equip_gear(
    player: &mut Player,
    config: &GameConfig,
    character_id: &CharacterId,
    gear_id: &GearId,
    slot_pattern: Option<Vec<SlotId>>,
    swap: bool,
) -> Result<(), TxError> {
    // 1. Character exists.
    let character = player
        .characters
        .get(character_id)
        .ok_or_else(|| TxError::CharacterNotFound(character_id.clone()))?;

    // 2. Gear exists.
    let gear = player
        .gear
        .get(gear_id)
        .ok_or_else(|| TxError::GearNotFound(gear_id.clone()))?;

    // 3. Gear not currently equipped.
    if gear.is_equipped() {
        return Err(TxError::GearAlreadyEquipped(gear_id.clone()));
    }

    // 4. GearDef exists in config.
    let gear_def = config
        .gear_defs
        .get(&gear.gear_def_id)
        .ok_or_else(|| TxError::InvalidConfigReference(gear.gear_def_id.to_string()))?;

    // 5. Restrictions.
    if let Some(restrictions) = &gear_def.restrictions {
        if let Some(allowed) = &restrictions.allowed_classes {
            if !allowed.contains(&character.class_id) {
                return Err(TxError::RestrictionFailed("class not in allowedClasses"));
            }
        }
        if let Some(blocked) = &restrictions.blocked_classes {
            if blocked.contains(&character.class_id) {
                return Err(TxError::RestrictionFailed("class is in blockedClasses"));
            }
        }
        if let Some(min_level) = restrictions.required_character_level {
            if character.level < min_level {
                return Err(TxError::RestrictionFailed("character level too low"));
            }
        }
        if let Some(max_delta) = restrictions.max_level_delta {
            if (gear.level as i64) > character.level as i64 + max_delta {
                return Err(TxError::RestrictionFailed("gear level delta too large"));
            }
        }
    }

    // 6. Pattern resolution.
    let chosen_pattern = match slot_pattern {
        Some(pattern) => pattern,
        None => match gear_def.equip_patterns.as_slice() {
            [single] => single.clone(),
            _ => {
                return Err(TxError::SlotIncompatible {
                    gear_def: gear.gear_def_id.clone(),
                });
            }
        },
    };

    // 7. Every slot in the chosen pattern must be declared.
    for slot in &chosen_pattern {
        if !config.has_slot(slot) {
            return Err(TxError::InvalidSlot(slot.clone()));
        }
    }

    // 8. Chosen pattern must exactly match (order-sensitive) one of
    // gearDef.equipPatterns.
    if !gear_def.equip_patterns.iter().any(|p| p == &chosen_pattern) {
        return Err(TxError::SlotIncompatible {
            gear_def: gear.gear_def_id.clone(),
        });
    }

    // 9. Conflict handling.
    let mut displaced: HashSet<GearId> = HashSet::new();
    if swap {
        for slot in &chosen_pattern {
            if let Some(occupant) = character.equipped.get(slot) {
                displaced.insert(occupant.clone());
            }
        }
    } else {
        for slot in &chosen_pattern {
            if character.equipped.contains_key(slot) {
                return Err(TxError::SlotOccupied(slot.clone()));
            }
        }
    }

    // Everything checked; commit atomically.

    // 9 (swap mode): vacate every slot occupied by a displaced gear —
    // the entire pattern that piece occupied, not only the conflicting
    // slots — and clear its equippedBy.
    if !displaced.is_empty() {
        let character = player.characters.get_mut(character_id).unwrap();
        character.equipped.retain(|_, g| !displaced.contains(g));
        for gear_id in &displaced {
            if let Some(g) = player.gear.get_mut(gear_id) {
                g.equipped_by = None;
            }
        }
    }

    // 10. Commit the new placement.
    let character = player.characters.get_mut(character_id).unwrap();
    for slot in &chosen_pattern {
        character.equipped.insert(slot.clone(), gear_id.clone());
    }
    player.gear.get_mut(gear_id).unwrap().equipped_by = Some(character_id.clone());

    Ok(())
}

/// Unequips `gear_id`, per §4.F.2.
pub fn unequip_gear(
    player: &mut Player,
    gear_id: &GearId,
    character_id: Option<&CharacterId>,
) -> Result<(), TxError> {
    // 1. Gear exists.
    let gear = player
        .gear
        .get(gear_id)
        .ok_or_else(|| TxError::GearNotFound(gear_id.clone()))?;

    // 2. Gear currently equipped.
    let holder = gear
        .equipped_by
        .clone()
        .ok_or_else(|| TxError::GearNotEquipped(gear_id.clone()))?;

    // 3. If characterId supplied, it must match the holder.
    if let Some(requested) = character_id {
        if requested != &holder {
            return Err(TxError::CharacterMismatch {
                gear: gear_id.clone(),
                holder,
                requested: requested.clone(),
            });
        }
    }

    // 4. Remove every slot referencing this gear on the holding
    // character; clear equippedBy.
    if let Some(character) = player.characters.get_mut(&holder) {
        character.equipped.retain(|_, g| g != gear_id);
    }
    player.gear.get_mut(gear_id).unwrap().equipped_by = None;

    Ok(())
}
