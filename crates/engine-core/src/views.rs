//! Read views (§4.J): plain functions over a borrowed [`GameState`] /
//! [`GameConfig`], bypassing the transaction processor entirely. None
//! of these mutate `stateVersion` or touch the idempotency cache —
//! grounded on the teacher's distinction between `GameEngine::execute`
//! (mutating) and its separate read-only accessors on `GameState`
//! (`game/core/src/state/mod.rs`).

use serde::Serialize;

use crate::algorithms::{AlgorithmCatalog, AlgorithmRegistry};
use crate::config::GameConfig;
use crate::error::{ErrorSeverity, GameError};
use crate::ids::{CharacterId, PlayerId};
use crate::state::GameState;
use crate::stats::{self, CharacterStats, StatsError};

#[derive(Clone, Debug, thiserror::Error)]
pub enum ViewError {
    #[error("player '{0}' not found")]
    PlayerNotFound(PlayerId),
    #[error(transparent)]
    Stats(#[from] StatsError),
}

impl GameError for ViewError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::PlayerNotFound(_) => ErrorSeverity::Validation,
            Self::Stats(inner) => inner.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::PlayerNotFound(_) => "PLAYER_NOT_FOUND",
            Self::Stats(inner) => inner.error_code(),
        }
    }
}

/// `GET /:instanceId/config` — the active config, verbatim.
pub fn config_view(config: &GameConfig) -> &GameConfig {
    config
}

/// `GET /:instanceId/stateVersion`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StateVersionView {
    pub game_instance_id: crate::ids::InstanceId,
    pub state_version: u64,
}

pub fn state_version_view(state: &GameState) -> StateVersionView {
    StateVersionView {
        game_instance_id: state.instance_id.clone(),
        state_version: state.state_version,
    }
}

/// `GET /:instanceId/state/player/:playerId` — a player's characters,
/// gear, and wallet (§4.J). Does not include the actor's credentials.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlayerView {
    pub player_id: PlayerId,
    pub characters: std::collections::HashMap<CharacterId, crate::state::Character>,
    pub gear: std::collections::HashMap<crate::ids::GearId, crate::state::Gear>,
    pub resources: crate::state::Wallet,
}

pub fn player_view(state: &GameState, player_id: &PlayerId) -> Result<PlayerView, ViewError> {
    let player = state
        .players
        .get(player_id)
        .ok_or_else(|| ViewError::PlayerNotFound(player_id.clone()))?;
    Ok(PlayerView {
        player_id: player.id.clone(),
        characters: player.characters.clone(),
        gear: player.gear.clone(),
        resources: player.resources.clone(),
    })
}

/// `GET /:instanceId/character/:characterId/stats` — computed stats
/// for one character, scoped to the caller's own player.
pub fn character_stats_view(
    state: &GameState,
    config: &GameConfig,
    registry: &AlgorithmRegistry,
    player_id: &PlayerId,
    character_id: &CharacterId,
) -> Result<CharacterStats, ViewError> {
    let player = state
        .players
        .get(player_id)
        .ok_or_else(|| ViewError::PlayerNotFound(player_id.clone()))?;
    Ok(stats::compute_stats(config, registry, player, character_id)?)
}

/// `GET /:instanceId/algorithms` — the closed algorithm catalog. Needs
/// no instance at all; kept here alongside the other views for
/// discoverability.
pub fn algorithms_view(registry: &AlgorithmRegistry) -> AlgorithmCatalog {
    registry.catalog()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::minimal;
    use crate::ids::{CharacterId as CId, ConfigId, GearDefId, GearId, InstanceId};
    use crate::state::{Character, Gear, Player};

    fn state_with_player() -> GameState {
        let mut state = GameState::empty(InstanceId::from("i1"), ConfigId::from("minimal_v1"), 10);
        let mut player = Player::new(PlayerId::from("p1"));
        let character = Character::new(CId::from("c1"), crate::ids::ClassId::from("warrior"));
        player.characters.insert(character.id.clone(), character);
        let gear = Gear::new(GearId::from("g1"), GearDefId::from("sword_basic"));
        player.gear.insert(gear.id.clone(), gear);
        state.players.insert(player.id.clone(), player);
        state
    }

    #[test]
    fn state_version_view_reflects_current_version() {
        let mut state = state_with_player();
        state.bump_version();
        let view = state_version_view(&state);
        assert_eq!(view.state_version, 1);
    }

    #[test]
    fn player_view_reports_characters_and_gear() {
        let state = state_with_player();
        let view = player_view(&state, &PlayerId::from("p1")).unwrap();
        assert!(view.characters.contains_key(&CId::from("c1")));
        assert!(view.gear.contains_key(&GearId::from("g1")));
    }

    #[test]
    fn player_view_missing_player_is_not_found() {
        let state = state_with_player();
        let err = player_view(&state, &PlayerId::from("ghost")).unwrap_err();
        assert_eq!(err.error_code(), "PLAYER_NOT_FOUND");
    }

    #[test]
    fn character_stats_view_delegates_to_stat_calculator() {
        let state = state_with_player();
        let config = minimal();
        let registry = AlgorithmRegistry::new();
        let stats = character_stats_view(
            &state,
            &config,
            &registry,
            &PlayerId::from("p1"),
            &CId::from("c1"),
        )
        .unwrap();
        assert_eq!(stats.level, 1);
    }

    #[test]
    fn algorithms_view_lists_the_closed_catalog() {
        let registry = AlgorithmRegistry::new();
        let catalog = algorithms_view(&registry);
        assert!(catalog.growth.iter().any(|e| e.id == "linear"));
        assert!(catalog.level_cost.iter().any(|e| e.id == "flat"));
    }
}
