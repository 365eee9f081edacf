//! Protocol constants shared across the Facto services

/// JetStream stream holding inbound events
pub const STREAM_NAME: &str = "FACTO_EVENTS";

/// Subject space the stream captures; consumers may narrow with a filter
pub const EVENT_SUBJECT: &str = "facto.events.>";

/// Default durable consumer name for the batching processor
pub const DEFAULT_DURABLE_NAME: &str = "processor";

/// Default number of events per processor batch
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Default flush interval in milliseconds
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 1000;

/// Ack wait on the durable consumer; must exceed worst-case batch latency
pub const ACK_WAIT_SECS: u64 = 30;

/// Per-operation storage deadline in seconds
pub const STORAGE_TIMEOUT_SECS: u64 = 10;

/// Keyspace holding the event projections and Merkle roots
pub const KEYSPACE: &str = "facto";

/// Prefix for event identifiers
pub const FACTO_ID_PREFIX: &str = "ft-";

/// Prefix for session identifiers
pub const SESSION_ID_PREFIX: &str = "session-";

/// Prefix for evidence package identifiers
pub const EVIDENCE_ID_PREFIX: &str = "ev-";
