//! Snapshot store (§4.H): one JSON file per instance, atomic
//! temp-file + rename writes.
//!
//! Grounded directly on the teacher's `runtime/src/repository/file/state.rs`
//! `FileStateRepository` (atomic rename, `tracing::debug!` on save/load),
//! switched from bincode to JSON per the spec's explicit "JSON-encoded
//! full GameState" requirement (§4.H, §6 "Persisted state layout").

use std::fs;
use std::path::{Path, PathBuf};

use engine_core::GameState;
use engine_core::ids::InstanceId;

use crate::error::{Result, RuntimeError};

/// File-per-instance JSON snapshot store rooted at `base_dir`.
pub struct SnapshotStore {
    base_dir: PathBuf,
}

impl SnapshotStore {
    /// Creates the store, creating `base_dir` if it does not exist.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).map_err(|source| RuntimeError::SnapshotWrite {
            path: base_dir.clone(),
            source,
        })?;
        Ok(Self { base_dir })
    }

    fn path_for(&self, instance_id: &InstanceId) -> PathBuf {
        self.base_dir.join(format!("{}.json", instance_id.as_str()))
    }

    /// Writes `state` to `<instanceId>.json` via temp-file + rename so
    /// a crash mid-write never leaves a truncated snapshot on disk
    /// (§6 "Atomic replacement guaranteed").
    pub fn save(&self, state: &GameState) -> Result<()> {
        let path = self.path_for(&state.instance_id);
        let tmp_path = path.with_extension("json.tmp");

        let bytes =
            serde_json::to_vec_pretty(state).map_err(|source| RuntimeError::SnapshotEncode {
                instance_id: state.instance_id.to_string(),
                source,
            })?;

        fs::write(&tmp_path, &bytes).map_err(|source| RuntimeError::SnapshotWrite {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &path).map_err(|source| RuntimeError::SnapshotWrite {
            path: path.clone(),
            source,
        })?;

        tracing::debug!(instance_id = %state.instance_id, path = %path.display(), "saved snapshot");
        Ok(())
    }

    /// Loads one instance's snapshot by id, if present.
    pub fn load(&self, instance_id: &InstanceId) -> Result<Option<GameState>> {
        let path = self.path_for(instance_id);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path).map_err(|source| RuntimeError::SnapshotRead {
            path: path.clone(),
            source,
        })?;
        let state: GameState = serde_json::from_slice(&bytes)
            .map_err(|source| RuntimeError::SnapshotDecode { path: path.clone(), source })?;
        tracing::debug!(instance_id = %instance_id, path = %path.display(), "loaded snapshot");
        Ok(Some(state))
    }

    /// Loads every `*.json` file in `base_dir`, logging and skipping
    /// (rather than failing) any file that doesn't decode — a
    /// corrupt snapshot for one instance must not block the others
    /// (§7 "Snapshot read failures on startup are logged and skipped
    /// per-file").
    pub fn load_all(&self) -> Result<Vec<GameState>> {
        let mut out = Vec::new();
        let entries = fs::read_dir(&self.base_dir).map_err(|source| RuntimeError::SnapshotRead {
            path: self.base_dir.clone(),
            source,
        })?;

        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(source) => {
                    tracing::warn!(error = %source, "failed to read snapshot directory entry, skipping");
                    continue;
                }
            };
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match fs::read(&path) {
                Ok(bytes) => match serde_json::from_slice::<GameState>(&bytes) {
                    Ok(state) => out.push(state),
                    Err(err) => {
                        tracing::warn!(path = %path.display(), error = %err, "failed to decode snapshot, skipping");
                    }
                },
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "failed to read snapshot file, skipping");
                }
            }
        }

        Ok(out)
    }
}
