//! Zenterai sync agent binary.
//!
//! Takes no arguments: everything comes from the JSON config file named by
//! `ZENTERAI_CONFIG`. A bad config is fatal; everything after startup is
//! logged and retried on the next tick.

use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};
use zenterai_agent::api_client::ControlPlaneClient;
use zenterai_agent::credential_broker::HttpCredentialBroker;
use zenterai_agent::s3_transport::S3Transport;
use zenterai_agent::scheduler::{SchedulerHandle, create_scheduler};
use zenterai_agent::state::SyncState;
use zenterai_agent::sync_engine::SyncEngine;
use zenterai_agent::AgentConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = AgentConfig::resolve_path();
    let config = AgentConfig::from_file(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        "syncing {} to {} for org {} every {}s",
        config.local_path.display(),
        config.remote_path,
        config.org_id,
        config.sync_interval_seconds
    );
    if config.watch_enabled {
        warn!("watch_enabled is set but filesystem watching is not supported; using interval sync only");
    }

    let api = Arc::new(ControlPlaneClient::new(&config)?);
    let broker = Arc::new(HttpCredentialBroker::new(api));
    let store = Arc::new(S3Transport::new(config.s3_endpoint_override.clone()));
    let state = Arc::new(SyncState::new());
    let engine = Arc::new(SyncEngine::new(&config, broker, store, state));

    let (handle, scheduler) = create_scheduler(engine, config.sync_interval());
    tokio::spawn(stop_on_signal(handle));
    scheduler.run().await;

    Ok(())
}

async fn stop_on_signal(handle: SchedulerHandle) {
    wait_for_signal().await;
    info!("shutdown signal received");
    if let Err(e) = handle.stop().await {
        warn!("failed to stop scheduler: {e}");
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        Err(e) => {
            warn!("cannot listen for SIGTERM: {e}");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
