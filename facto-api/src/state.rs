//! Application state and configuration for the API server

use metrics_exporter_prometheus::PrometheusHandle;
use std::env;
use std::sync::Arc;

use facto_db::EventStore;

/// API server state
#[derive(Clone)]
pub struct AppState {
    /// Storage handle shared across handlers
    pub store: Arc<dyn EventStore>,
    /// API version reported on /health
    pub version: String,
    /// Prometheus render handle; absent in tests
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(store: Arc<dyn EventStore>, prometheus: Option<PrometheusHandle>) -> Self {
        Self {
            store,
            version: env!("CARGO_PKG_VERSION").to_string(),
            prometheus,
        }
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub scylla_hosts: Vec<String>,
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8082,
            scylla_hosts: vec!["localhost:9042".to_string()],
            enable_cors: true,
        }
    }
}

impl ApiConfig {
    /// Load configuration from the environment (`PORT`, `SCYLLA_HOSTS`)
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8082);

        let scylla_hosts = env::var("SCYLLA_HOSTS")
            .unwrap_or_else(|_| "localhost:9042".to_string())
            .split(',')
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .collect();

        Self {
            host: "0.0.0.0".to_string(),
            port,
            scylla_hosts,
            enable_cors: true,
        }
    }
}
