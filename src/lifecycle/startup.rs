//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging and metrics
//! - Bind the listener and start the config watcher
//! - Serve until a stop signal arrives
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - The listener binds last (traffic only when ready)
//! - Without a config file the defaults are used and nothing is watched

use std::path::Path;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::config::{load_config, watcher::ConfigWatcher, AppConfig, ConfigError};
use crate::http::{GateServer, ServerError};
use crate::lifecycle::{signals, Shutdown};
use crate::observability::{logging, metrics};

/// Fatal startup failures.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("failed to watch config file: {0}")]
    Watch(#[from] notify::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the service and block until it has shut down.
pub async fn start(config_path: Option<&Path>) -> Result<(), StartupError> {
    let config = match config_path {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "onboarding-gate starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        page_deadline = %config.identity.page_deadline_ms,
        upload_deadline = %config.identity.upload_deadline_ms,
        profile_deadline = %config.profiles.deadline_ms,
        on_timeout = ?config.gate.on_timeout,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = GateServer::new(config.clone())?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    // Held for the lifetime of the server; dropping it stops the watch.
    let (_watcher, updates) = match config_path {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_tx, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    let signal_task = signals::forward_to(shutdown);

    server.run(listener, updates, receiver).await?;
    signal_task.abort();

    tracing::info!("Shutdown complete");
    Ok(())
}
