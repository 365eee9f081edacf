//! Facto batching processor
//!
//! Drains signed events from the JetStream work queue, persists each batch
//! across the three storage projections, commits a per-batch Merkle root,
//! and acknowledges upstream only once storage is durable.

mod config;
mod consumer;
mod pipeline;
mod telemetry;

use anyhow::Context;
use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use facto_db::ScyllaStore;

use crate::config::ProcessorConfig;
use crate::consumer::Consumer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Facto Processor v{}", env!("CARGO_PKG_VERSION"));

    let config = ProcessorConfig::from_env();
    info!(
        nats_url = %config.nats_url,
        scylla_hosts = ?config.scylla_hosts,
        batch_size = config.batch_size,
        flush_interval_ms = config.flush_interval.as_millis() as u64,
        metrics_port = config.metrics_port,
        "Configuration loaded"
    );

    let prometheus = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    telemetry::describe();

    tokio::spawn(serve_metrics(config.metrics_port, prometheus));

    let store = Arc::new(
        ScyllaStore::connect(&config.scylla_hosts)
            .await
            .context("Failed to initialize storage")?,
    );
    info!("Connected to ScyllaDB");

    let consumer = Consumer::connect(config, store)
        .await
        .context("Failed to initialize consumer")?;
    info!("Connected to NATS");

    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down...");
            let _ = shutdown_tx.send(()).await;
        }
    });

    consumer.run(shutdown_rx).await;
    info!("Shutdown complete");
    Ok(())
}

/// Serve `/metrics` and `/health` on the metrics port
async fn serve_metrics(port: u16, handle: PrometheusHandle) {
    let router = Router::new()
        .route("/metrics", get(move || async move { handle.render() }))
        .route("/health", get(|| async { r#"{"status":"healthy"}"# }));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "Starting metrics server");

    match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => {
            if let Err(e) = axum::serve(listener, router).await {
                error!(error = %e, "Metrics server error");
            }
        }
        Err(e) => error!(error = %e, "Failed to bind metrics server"),
    }
}
