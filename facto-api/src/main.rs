//! Facto Query & Verification API binary

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use facto_api::{run_server, telemetry, ApiConfig, AppState};
use facto_db::ScyllaStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Facto Query API v{}", env!("CARGO_PKG_VERSION"));

    let config = ApiConfig::from_env();
    info!(
        port = config.port,
        scylla_hosts = ?config.scylla_hosts,
        "Configuration loaded"
    );

    let prometheus = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    telemetry::describe();

    let store = Arc::new(
        ScyllaStore::connect(&config.scylla_hosts)
            .await
            .context("Failed to initialize storage")?,
    );
    info!("Connected to ScyllaDB");

    let state = AppState::new(store, Some(prometheus));

    run_server(&config, state, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutting down server...");
    })
    .await
    .map_err(|e| anyhow::anyhow!(e))?;

    info!("Server exited");
    Ok(())
}
