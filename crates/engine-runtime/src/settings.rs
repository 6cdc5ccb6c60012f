//! Environment-driven settings (§6, SPEC_FULL.md "Configuration").
//!
//! Grounded on the teacher's `runtime/src/runtime.rs`
//! `PersistenceSettings` (env-derived, `directories`-based default
//! paths): every knob has a sensible default so a bare `engine-server`
//! invocation with no environment at all still boots against
//! `./save_data`.

use std::path::PathBuf;

/// Process-wide settings read once at startup from the environment.
#[derive(Clone, Debug)]
pub struct RuntimeSettings {
    /// Bind host for the HTTP server (`HOST`, default `127.0.0.1`).
    pub host: String,
    /// Bind port for the HTTP server (`PORT`, default `8080`).
    pub port: u16,
    /// Bearer key required for admin transactions (`ADMIN_API_KEY`).
    /// Unset ⇒ every admin operation is rejected (§4.E).
    pub admin_api_key: Option<String>,
    /// Directory holding one `<instanceId>.json` snapshot file per
    /// instance (`SNAPSHOT_DIR`, default platform data dir).
    pub snapshot_dir: PathBuf,
    /// Periodic flush interval in seconds (`SNAPSHOT_INTERVAL_SECS`,
    /// default 30). `0` disables the periodic flush entirely.
    pub snapshot_interval_secs: u64,
    /// Bound on the per-instance idempotency cache
    /// (`IDEMPOTENCY_BOUND`, default 10,000 per §3).
    pub idempotency_bound: usize,
    /// Gates `POST /__shutdown` (`E2E_SHUTDOWN_ENABLED`, default off).
    pub e2e_shutdown_enabled: bool,
}

impl RuntimeSettings {
    /// Reads every knob from `std::env`, falling back to defaults.
    /// Call `dotenvy::dotenv()` before this (the binary's concern) to
    /// pick up a local `.env` file.
    pub fn from_env() -> Self {
        Self {
            host: env_or("HOST", "127.0.0.1"),
            port: env_parsed("PORT", 8080),
            admin_api_key: std::env::var("ADMIN_API_KEY")
                .ok()
                .filter(|s| !s.is_empty()),
            snapshot_dir: std::env::var("SNAPSHOT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| Self::default_snapshot_dir()),
            snapshot_interval_secs: env_parsed("SNAPSHOT_INTERVAL_SECS", 30),
            idempotency_bound: env_parsed("IDEMPOTENCY_BOUND", 10_000),
            e2e_shutdown_enabled: env_flag("E2E_SHUTDOWN_ENABLED"),
        }
    }

    /// Platform-specific default save directory via the `directories`
    /// crate, mirroring the teacher's `ProjectDirs::from("", "",
    /// "dungeon")` fallback-to-`./save_data` shape.
    fn default_snapshot_dir() -> PathBuf {
        directories::ProjectDirs::from("", "", "game-state-engine")
            .map(|dirs| dirs.data_dir().join("snapshots"))
            .unwrap_or_else(|| PathBuf::from("./snapshots"))
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str) -> bool {
    matches!(
        std::env::var(key).as_deref(),
        Ok("1") | Ok("true") | Ok("TRUE") | Ok("yes")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane_with_no_environment() {
        // `default_snapshot_dir` never panics even when platform dirs
        // are unavailable in a minimal test sandbox.
        let dir = RuntimeSettings::default_snapshot_dir();
        assert!(!dir.as_os_str().is_empty());
    }
}
