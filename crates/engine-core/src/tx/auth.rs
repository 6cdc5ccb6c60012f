//! Authorization (§4.E).
//!
//! The bearer token is opaque: the engine never parses or hashes it
//! (per SPEC_FULL.md's design notes, the edge collaborator owns user
//! identity). Resolution is a linear scan of the instance's actor
//! table — acceptable because actor counts per instance are small and
//! this only runs once per transaction, under the same per-instance
//! lock as the mutation it gates.

use crate::state::{Actor, GameState};

/// Resolves a bearer token to the actor that owns it, if any.
pub fn resolve_actor<'s>(state: &'s GameState, bearer_token: &str) -> Option<&'s Actor> {
    state.find_actor_by_api_key(bearer_token)
}

/// Admin operations (`CreateActor`, `GrantResources`,
/// `GrantCharacterResources`) require the process-wide `adminApiKey`.
/// If it is unset, every admin operation is unauthorized.
pub fn is_admin(admin_api_key: Option<&str>, bearer_token: &str) -> bool {
    matches!(admin_api_key, Some(key) if !key.is_empty() && key == bearer_token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{ActorId, ConfigId, InstanceId, PlayerId};

    fn state_with_actor(api_key: &str) -> GameState {
        let mut state = GameState::empty(InstanceId::from("i1"), ConfigId::from("c1"), 10);
        state.actors.insert(
            ActorId::from("a1"),
            Actor {
                id: ActorId::from("a1"),
                api_key: api_key.to_string(),
                player_ids: vec![PlayerId::from("p1")],
            },
        );
        state
    }

    #[test]
    fn resolves_by_matching_api_key() {
        let state = state_with_actor("secret");
        assert!(resolve_actor(&state, "secret").is_some());
        assert!(resolve_actor(&state, "wrong").is_none());
    }

    #[test]
    fn admin_requires_configured_key_and_match() {
        assert!(is_admin(Some("admin-key"), "admin-key"));
        assert!(!is_admin(Some("admin-key"), "other"));
        assert!(!is_admin(None, "admin-key"));
        assert!(!is_admin(Some(""), ""));
    }

    #[test]
    fn ownership_checks_player_ids() {
        let state = state_with_actor("secret");
        let actor = resolve_actor(&state, "secret").unwrap();
        assert!(state.actor_owns_player(&actor.id, &PlayerId::from("p1")));
        assert!(!state.actor_owns_player(&actor.id, &PlayerId::from("p2")));
    }
}
