//! Processor configuration
//!
//! Loaded from environment variables with sensible defaults; every knob maps
//! onto a tunable from the processing contract.

use std::env;
use std::time::Duration;

use facto_core::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_DURABLE_NAME, DEFAULT_FLUSH_INTERVAL_MS, EVENT_SUBJECT,
};

/// Batching processor configuration
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// NATS server URL
    pub nats_url: String,
    /// ScyllaDB contact points
    pub scylla_hosts: Vec<String>,
    /// Events per batch before a size-triggered flush
    pub batch_size: usize,
    /// Max time a buffered event waits before a time-triggered flush
    pub flush_interval: Duration,
    /// Port for the metrics/health listener
    pub metrics_port: u16,
    /// Consumer subject filter within the stream's subject space
    pub filter_subject: String,
    /// Durable consumer name, the only cross-restart shared identity
    pub durable_name: String,
    /// Delete and re-create the durable consumer at startup
    pub reset_consumer: bool,
}

impl ProcessorConfig {
    /// Load configuration from the environment
    ///
    /// Variables: `NATS_URL`, `SCYLLA_HOSTS` (comma-separated), `BATCH_SIZE`,
    /// `FLUSH_INTERVAL_MS`, `METRICS_PORT`, `FILTER_SUBJECT`, `DURABLE_NAME`,
    /// `RESET_CONSUMER`.
    pub fn from_env() -> Self {
        let nats_url =
            env::var("NATS_URL").unwrap_or_else(|_| "nats://localhost:4222".to_string());

        let scylla_hosts = env::var("SCYLLA_HOSTS")
            .unwrap_or_else(|_| "localhost:9042".to_string())
            .split(',')
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .collect();

        let batch_size = env::var("BATCH_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_BATCH_SIZE);

        let flush_interval_ms = env::var("FLUSH_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_FLUSH_INTERVAL_MS);

        let metrics_port = env::var("METRICS_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8081);

        let filter_subject =
            env::var("FILTER_SUBJECT").unwrap_or_else(|_| EVENT_SUBJECT.to_string());

        let durable_name =
            env::var("DURABLE_NAME").unwrap_or_else(|_| DEFAULT_DURABLE_NAME.to_string());

        let reset_consumer = env::var("RESET_CONSUMER")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(false);

        Self {
            nats_url,
            scylla_hosts,
            batch_size,
            flush_interval: Duration::from_millis(flush_interval_ms),
            metrics_port,
            filter_subject,
            durable_name,
            reset_consumer,
        }
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            nats_url: "nats://localhost:4222".to_string(),
            scylla_hosts: vec!["localhost:9042".to_string()],
            batch_size: DEFAULT_BATCH_SIZE,
            flush_interval: Duration::from_millis(DEFAULT_FLUSH_INTERVAL_MS),
            metrics_port: 8081,
            filter_subject: EVENT_SUBJECT.to_string(),
            durable_name: DEFAULT_DURABLE_NAME.to_string(),
            reset_consumer: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProcessorConfig::default();
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.flush_interval, Duration::from_secs(1));
        assert_eq!(config.filter_subject, "facto.events.>");
        assert_eq!(config.durable_name, "processor");
        assert!(!config.reset_consumer);
    }
}
