//! `engine-runtime`: instance registry & lifecycle (§4.K), the
//! snapshot store (§4.H), and environment-driven settings loading.
//! Depends on `engine-core` and `tokio` for the periodic flush task
//! and graceful shutdown; everything that touches the filesystem or a
//! clock lives here rather than in `engine-core`.

pub mod error;
pub mod flush;
pub mod registry;
pub mod settings;
pub mod snapshot;

pub use error::{Result, RuntimeError};
pub use registry::InstanceRegistry;
pub use settings::RuntimeSettings;
pub use snapshot::SnapshotStore;
