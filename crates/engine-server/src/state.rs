//! Shared application state handed to every axum handler, wrapping
//! the explicit application context design note (§9 "Global mutable
//! state: wrap the instance registry, config, and startup-time knobs
//! in an explicit application context passed to all handlers").

use std::sync::Arc;

use engine_runtime::InstanceRegistry;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<InstanceRegistry>,
    pub e2e_shutdown_enabled: bool,
    pub shutdown: Arc<tokio::sync::Notify>,
}
