mod catalog;
mod config;
mod http;
mod ingest;
mod json_ld;
mod mapping;
mod store;

use std::fs::{self, File};
use std::path::PathBuf;

use anyhow::{Context, Result};
use fd_lock::RwLock;
use tokio::signal::unix::{SignalKind, signal};
use tracing::info;

use crate::config::{Config, RuntimeConfig};
use crate::http::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let flags = xflags::parse_or_exit! {
        /// Path of the TOML configuration file
        optional -c,--config CONFIG: PathBuf
        /// HTTP port, overrides the configuration file
        optional -p,--port PORT: u16
    };

    let mut config = match &flags.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(port) = flags.port {
        config.server.http_port = port;
    }
    config.validate()?;

    let data_dir = config.server.data_dir.clone();
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("unable to create data directory {}", data_dir.display()))?;
    let mut lock = RwLock::new(File::create(data_dir.join("ldingest.lock"))?);
    let _guard = lock
        .try_write()
        .with_context(|| format!("{} is used by another server", data_dir.display()))?;

    let keyspace = fjall::Config::new(data_dir.join("keyspace")).open()?;
    let addr = format!("{}:{}", config.server.listen, config.server.http_port);
    info!(
        target: "lifecycle",
        record_type = %config.server.record_type,
        bundles = config.bundles.len(),
        strategy = ?config.ingest.strategy,
        "starting"
    );

    let state = AppState::new(RuntimeConfig {
        init: config,
        keyspace,
    })?;
    http::serve(state, &addr, shutdown_signal()).await?;

    info!(target: "lifecycle", "stopped");
    Ok(())
}

async fn shutdown_signal() {
    let (Ok(mut sigterm), Ok(mut sigint)) = (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) else {
        tracing::warn!(target: "lifecycle", "unable to install signal handlers");
        return std::future::pending().await;
    };

    tokio::select! {
        _ = sigterm.recv() => {
            info!(target: "lifecycle", "Received the terminate signal; stopping");
        }
        _ = sigint.recv() => {
            info!(target: "lifecycle", "Received the interrupt signal; stopping");
        }
    }
}
