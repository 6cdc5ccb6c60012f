//! Errors raised outside the pure `engine-core` boundary: snapshot
//! I/O, config loading, and instance lookup failures.

use engine_core::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("instance '{0}' not found")]
    InstanceNotFound(String),

    #[error("failed to read snapshot file {path}: {source}")]
    SnapshotRead {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write snapshot file {path}: {source}")]
    SnapshotWrite {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode snapshot {path}: {source}")]
    SnapshotDecode {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode snapshot for instance '{instance_id}': {source}")]
    SnapshotEncode {
        instance_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ConfigParse {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    ConfigInvalid(#[from] ConfigError),

    #[error("snapshot flush deadline missed on shutdown")]
    ShutdownDeadlineMissed,
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
