//! `engine-server`: the binary. Axum HTTP routing for §6's endpoint
//! table, process wiring, and signal handling for graceful shutdown.
//!
//! Grounded on the teacher's `game/content` loader style for
//! "validate at startup or exit non-zero" and `runtime/src/runtime.rs`
//! for worker spawn + graceful shutdown ordering, translated from a
//! local CLI process to an HTTP server process.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use engine_core::config::GameConfig;
use engine_runtime::{InstanceRegistry, RuntimeError, RuntimeSettings, SnapshotStore};
use engine_server::state::AppState;
use engine_server::routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(err) = run().await {
        tracing::error!(error = %err, "fatal startup error");
        std::process::exit(1);
    }

    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let settings = RuntimeSettings::from_env();

    let config_path = std::env::var("CONFIG_PATH")
        .context("CONFIG_PATH environment variable must name the GameConfig JSON file")?;
    let config = load_config(&config_path)
        .with_context(|| format!("failed to load GameConfig from {config_path}"))?;

    tracing::info!(config_id = %config.config_id, "loaded and validated game configuration");

    let snapshots = SnapshotStore::new(&settings.snapshot_dir)
        .with_context(|| format!("failed to open snapshot directory {:?}", settings.snapshot_dir))?;

    let registry = Arc::new(
        InstanceRegistry::bootstrap(
            config,
            settings.admin_api_key.clone(),
            settings.idempotency_bound,
            snapshots,
        )
        .context("failed to restore and migrate instances at startup")?,
    );

    let flush_worker = engine_runtime::flush::spawn(registry.clone(), settings.snapshot_interval_secs);

    let shutdown = Arc::new(tokio::sync::Notify::new());
    let app_state = AppState {
        registry: registry.clone(),
        e2e_shutdown_enabled: settings.e2e_shutdown_enabled,
        shutdown: shutdown.clone(),
    };

    let router = routes::build_router(app_state).layer(tower_http::trace::TraceLayer::new_for_http());

    let addr = format!("{}:{}", settings.host, settings.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "engine-server listening");

    let signal = {
        let shutdown = shutdown.clone();
        async move {
            let ctrl_c = async {
                tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
            };
            #[cfg(unix)]
            let terminate = async {
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    .expect("failed to install SIGTERM handler")
                    .recv()
                    .await;
            };
            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                _ = ctrl_c => {},
                _ = terminate => {},
                _ = shutdown.notified() => {},
            }
        }
    };

    axum::serve(listener, router)
        .with_graceful_shutdown(signal)
        .await
        .context("server error")?;

    tracing::info!("shutting down: flushing every instance before exit");
    if let Some((handle, shutdown_tx)) = flush_worker {
        let _ = shutdown_tx.send(());
        let _ = handle.await;
    }

    match tokio::time::timeout(std::time::Duration::from_secs(10), flush_all(&registry)).await {
        Ok(Ok(n)) => tracing::info!(instances = n, "flushed all instances on shutdown"),
        Ok(Err(err)) => {
            tracing::error!(error = %err, "snapshot flush failed on shutdown");
            std::process::exit(1);
        }
        Err(_) => {
            let err = RuntimeError::ShutdownDeadlineMissed;
            tracing::error!(error = %err, "snapshot flush deadline missed on shutdown");
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn flush_all(registry: &InstanceRegistry) -> engine_runtime::Result<usize> {
    registry.flush_all()
}

fn load_config(path: &str) -> engine_runtime::Result<GameConfig> {
    let file = std::fs::File::open(path).map_err(|source| RuntimeError::ConfigRead {
        path: path.into(),
        source,
    })?;
    let raw: GameConfig =
        serde_json::from_reader(std::io::BufReader::new(file)).map_err(|source| {
            RuntimeError::ConfigParse {
                path: path.into(),
                source,
            }
        })?;
    Ok(raw.validated()?)
}
