//! HTTP routing (§6's endpoint table). New surface — the teacher has
//! no HTTP layer — sourced from the wider example pack's common axum
//! usage. Handlers are thin: extract path/header/body, call into
//! `engine-core` views or `engine-runtime`'s registry, map the result
//! to JSON.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::Value;

use engine_core::ids::{CharacterId, InstanceId, PlayerId};
use engine_core::views;

use crate::auth::bearer_token;
use crate::error::ApiError;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/:instanceId/config", get(get_config))
        .route("/:instanceId/stateVersion", get(get_state_version))
        .route("/:instanceId/algorithms", get(get_algorithms))
        .route("/:instanceId/state/player/:playerId", get(get_player))
        .route("/:instanceId/character/:characterId/stats", get(get_character_stats))
        .route("/:instanceId/tx", post(post_tx))
        .route("/__shutdown", post(post_shutdown))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "instances": state.registry.instance_ids().len(),
    }))
}

fn require_instance(state: &AppState, instance_id: &InstanceId) -> Result<(), ApiError> {
    if state.registry.instance_ids().contains(instance_id) {
        Ok(())
    } else {
        Err(ApiError::instance_not_found(instance_id.as_str()))
    }
}

fn require_actor(
    state: &AppState,
    instance_id: &InstanceId,
    headers: &HeaderMap,
) -> Result<String, ApiError> {
    let token = bearer_token(headers).ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;
    let resolved = state.registry.has_actor(instance_id, token)?;
    if resolved {
        Ok(token.to_string())
    } else {
        Err(ApiError::unauthorized("no actor matches the bearer token"))
    }
}

async fn get_config(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
) -> Result<Response, ApiError> {
    let instance_id = InstanceId::from(instance_id);
    require_instance(&state, &instance_id)?;
    Ok(Json(state.registry.config().clone()).into_response())
}

async fn get_state_version(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
) -> Result<Response, ApiError> {
    let instance_id = InstanceId::from(instance_id);
    let view = state
        .registry
        .with_state(&instance_id, views::state_version_view)?;
    Ok(Json(view).into_response())
}

async fn get_algorithms(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
) -> Result<Response, ApiError> {
    let instance_id = InstanceId::from(instance_id);
    require_instance(&state, &instance_id)?;
    Ok(Json(views::algorithms_view(state.registry.algorithms())).into_response())
}

async fn get_player(
    State(state): State<AppState>,
    Path((instance_id, player_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let instance_id = InstanceId::from(instance_id);
    let token = require_actor(&state, &instance_id, &headers)?;
    let player_id = PlayerId::from(player_id);

    let owns = state
        .registry
        .authorize_player(&instance_id, &token, &player_id)?;
    if owns != Some(true) {
        return Err(ApiError::ownership_violation(format!(
            "actor does not own player '{player_id}'"
        )));
    }

    let view = state
        .registry
        .with_state(&instance_id, |s| views::player_view(s, &player_id))??;
    Ok(Json(view).into_response())
}

async fn get_character_stats(
    State(state): State<AppState>,
    Path((instance_id, character_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let instance_id = InstanceId::from(instance_id);
    let token = require_actor(&state, &instance_id, &headers)?;
    let character_id = CharacterId::from(character_id);

    let stats = state.registry.with_state(&instance_id, |game_state| {
        let actor = game_state
            .find_actor_by_api_key(&token)
            .expect("resolved moments ago by require_actor");
        for player_id in &actor.player_ids {
            if let Some(player) = game_state.players.get(player_id) {
                if player.characters.contains_key(&character_id) {
                    return Some(views::character_stats_view(
                        game_state,
                        state.registry.config(),
                        state.registry.algorithms(),
                        player_id,
                        &character_id,
                    ));
                }
            }
        }
        None
    })?;

    match stats {
        Some(result) => Ok(Json(result?).into_response()),
        None => Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "CHARACTER_NOT_FOUND",
            format!("character '{character_id}' not found among the caller's players"),
        )),
    }
}

async fn post_tx(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let instance_id = InstanceId::from(instance_id);
    let token = bearer_token(&headers).unwrap_or_default();
    let response = state.registry.submit_tx(&instance_id, token, &body)?;
    let status = StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::OK);
    Ok((status, Json(response.body)).into_response())
}

async fn post_shutdown(State(state): State<AppState>) -> Result<Response, ApiError> {
    if !state.e2e_shutdown_enabled {
        return Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "INSTANCE_NOT_FOUND",
            "shutdown endpoint is disabled",
        ));
    }
    tracing::info!("administrative shutdown requested via /__shutdown");
    state.shutdown.notify_one();
    Ok(StatusCode::OK.into_response())
}
