//! Instance registry & lifecycle (§4.K).
//!
//! Grounded on the teacher's `runtime/src/runtime.rs` (`Runtime`
//! builder pattern owning background workers behind a shared handle)
//! generalized from "one simulation, one set of workers" to "a map of
//! independently-locked instances, each its own critical section"
//! (§5 "single authoritative mutator per GameState" — implemented here
//! with a `std::sync::Mutex` per instance, the simplest mutual-exclusion
//! primitive that satisfies §9's design note, since validation and
//! commit are synchronous CPU-bound work with no suspension points).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use engine_core::algorithms::AlgorithmRegistry;
use engine_core::config::GameConfig;
use engine_core::ids::{InstanceId, PlayerId};
use engine_core::tx::processor::{self, TxResponse};
use engine_core::{GameState, migrate};

use crate::error::{Result, RuntimeError};
use crate::snapshot::SnapshotStore;

const DEFAULT_INSTANCE_ID: &str = "instance_001";

/// One instance plus the bookkeeping the registry needs to decide
/// whether it is dirty (§4.H "dirty = stateVersion changed since last
/// flush").
struct InstanceEntry {
    state: Arc<Mutex<GameState>>,
    last_flushed_version: Mutex<u64>,
}

/// Owns every live [`GameState`], the active [`GameConfig`], and the
/// closed [`AlgorithmRegistry`]; wires the transaction processor,
/// read views, and the snapshot store together (§4.K).
pub struct InstanceRegistry {
    config: GameConfig,
    algorithms: AlgorithmRegistry,
    admin_api_key: Option<String>,
    idempotency_bound: usize,
    snapshots: SnapshotStore,
    instances: Mutex<HashMap<InstanceId, Arc<InstanceEntry>>>,
}

impl InstanceRegistry {
    /// Restores and migrates every snapshot found in `snapshots`,
    /// then ensures the default instance exists (§4.K "On startup:
    /// restore+migrate all instances, then ensure the default
    /// instance exists").
    pub fn bootstrap(
        config: GameConfig,
        admin_api_key: Option<String>,
        idempotency_bound: usize,
        snapshots: SnapshotStore,
    ) -> Result<Self> {
        let algorithms = AlgorithmRegistry::new();
        let registry = Self {
            config,
            algorithms,
            admin_api_key,
            idempotency_bound,
            snapshots,
            instances: Mutex::new(HashMap::new()),
        };

        for restored in registry.snapshots.load_all()? {
            let instance_id = restored.instance_id.clone();
            let (migrated, report) = migrate(restored, &registry.config);
            if !report.is_clean() {
                tracing::warn!(
                    instance_id = %instance_id,
                    warnings = report.warnings.len(),
                    "migration reconciled restored state against active config"
                );
                for warning in &report.warnings {
                    tracing::warn!(instance_id = %instance_id, ?warning, "migration warning");
                }
            }
            registry.insert_loaded(migrated);
        }

        registry.ensure_default_instance();
        Ok(registry)
    }

    fn insert_loaded(&self, state: GameState) {
        let instance_id = state.instance_id.clone();
        let version = state.state_version;
        let entry = Arc::new(InstanceEntry {
            state: Arc::new(Mutex::new(state)),
            last_flushed_version: Mutex::new(version),
        });
        self.instances
            .lock()
            .expect("instance map lock poisoned")
            .insert(instance_id, entry);
    }

    fn ensure_default_instance(&self) {
        let default_id = InstanceId::from(DEFAULT_INSTANCE_ID);
        let mut instances = self.instances.lock().expect("instance map lock poisoned");
        instances.entry(default_id.clone()).or_insert_with(|| {
            tracing::info!(instance_id = %default_id, "creating empty default instance");
            Arc::new(InstanceEntry {
                state: Arc::new(Mutex::new(GameState::empty(
                    default_id,
                    self.config.config_id.clone(),
                    self.idempotency_bound,
                ))),
                last_flushed_version: Mutex::new(0),
            })
        });
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn algorithms(&self) -> &AlgorithmRegistry {
        &self.algorithms
    }

    fn entry(&self, instance_id: &InstanceId) -> Option<Arc<InstanceEntry>> {
        self.instances
            .lock()
            .expect("instance map lock poisoned")
            .get(instance_id)
            .cloned()
    }

    /// Submits one transaction request body to the named instance,
    /// running the full pre-dispatch + dispatch pipeline under that
    /// instance's lock (§4.F, §5). Returns `INSTANCE_NOT_FOUND` if no
    /// such instance exists — the one response the idempotency cache
    /// never records (§4.D).
    pub fn submit_tx(
        &self,
        instance_id: &InstanceId,
        bearer_token: &str,
        body: &serde_json::Value,
    ) -> Result<TxResponse> {
        let entry = self
            .entry(instance_id)
            .ok_or_else(|| RuntimeError::InstanceNotFound(instance_id.to_string()))?;
        let mut state = entry.state.lock().expect("instance state lock poisoned");
        Ok(processor::process(
            &mut state,
            &self.config,
            &self.algorithms,
            self.admin_api_key.as_deref(),
            bearer_token,
            instance_id,
            body,
        ))
    }

    /// Runs `f` against a read-locked snapshot of the named instance's
    /// state, for the read views (§4.J) which bypass the processor.
    pub fn with_state<T>(
        &self,
        instance_id: &InstanceId,
        f: impl FnOnce(&GameState) -> T,
    ) -> Result<T> {
        let entry = self
            .entry(instance_id)
            .ok_or_else(|| RuntimeError::InstanceNotFound(instance_id.to_string()))?;
        let state = entry.state.lock().expect("instance state lock poisoned");
        Ok(f(&state))
    }

    /// Resolves a bearer token to an actor and checks it owns
    /// `player_id`, in one pass under the instance's lock (§4.E).
    /// `Ok(None)` means no actor matched the token at all.
    pub fn authorize_player(
        &self,
        instance_id: &InstanceId,
        bearer_token: &str,
        player_id: &PlayerId,
    ) -> Result<Option<bool>> {
        self.with_state(instance_id, |state| {
            state
                .find_actor_by_api_key(bearer_token)
                .map(|actor| actor.player_ids.contains(player_id))
        })
    }

    /// Whether any actor in this instance matches the bearer token
    /// (§4.J "All read views require a resolved actor except
    /// `config`, `stateVersion`, `algorithms`, and `health`").
    pub fn has_actor(&self, instance_id: &InstanceId, bearer_token: &str) -> Result<bool> {
        self.with_state(instance_id, |state| {
            state.find_actor_by_api_key(bearer_token).is_some()
        })
    }

    /// All instance ids currently registered, for diagnostics/health.
    pub fn instance_ids(&self) -> Vec<InstanceId> {
        self.instances
            .lock()
            .expect("instance map lock poisoned")
            .keys()
            .cloned()
            .collect()
    }

    /// Flushes every dirty instance (stateVersion changed since the
    /// last flush) to the snapshot store (§4.H periodic flush /
    /// on-shutdown flush). Returns the number of instances written.
    pub fn flush_dirty(&self) -> Result<usize> {
        let entries: Vec<Arc<InstanceEntry>> = self
            .instances
            .lock()
            .expect("instance map lock poisoned")
            .values()
            .cloned()
            .collect();

        let mut flushed = 0;
        for entry in entries {
            let (snapshot, current_version) = {
                let state = entry.state.lock().expect("instance state lock poisoned");
                (state.clone(), state.state_version)
            };
            let mut last = entry
                .last_flushed_version
                .lock()
                .expect("last-flushed lock poisoned");
            if *last == current_version {
                continue;
            }
            self.snapshots.save(&snapshot)?;
            *last = current_version;
            flushed += 1;
        }
        Ok(flushed)
    }

    /// Flushes every instance unconditionally, used on graceful
    /// shutdown regardless of dirtiness (§4.K "On shutdown: ...
    /// snapshot everything").
    pub fn flush_all(&self) -> Result<usize> {
        let entries: Vec<Arc<InstanceEntry>> = self
            .instances
            .lock()
            .expect("instance map lock poisoned")
            .values()
            .cloned()
            .collect();
        let count = entries.len();
        for entry in entries {
            let state = entry.state.lock().expect("instance state lock poisoned");
            self.snapshots.save(&state)?;
            let mut last = entry
                .last_flushed_version
                .lock()
                .expect("last-flushed lock poisoned");
            *last = state.state_version;
        }
        Ok(count)
    }
}
