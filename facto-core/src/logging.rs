//! Logging conventions for the Facto services
//!
//! All services log through `tracing` with structured fields. Use the field
//! names below so that log aggregation can pivot on them consistently.
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Storage failure, integrity violation, batch abort |
//! | WARN  | Redelivery, malformed payload, degraded operation |
//! | INFO  | Batch committed, service lifecycle, configuration |
//! | DEBUG | Fetch results, flush decisions, query expansion |

/// Standard log field names
pub mod fields {
    /// Event identifier
    pub const FACTO_ID: &str = "facto_id";
    /// Session identifier
    pub const SESSION_ID: &str = "session_id";
    /// Agent identifier
    pub const AGENT_ID: &str = "agent_id";
    /// Item count
    pub const COUNT: &str = "count";
    /// Operation duration in milliseconds
    pub const DURATION_MS: &str = "duration_ms";
    /// Error message
    pub const ERROR: &str = "error";
    /// Merkle root (hex)
    pub const MERKLE_ROOT: &str = "merkle_root";
    /// Durable consumer name
    pub const DURABLE: &str = "durable";
    /// Filter subject
    pub const SUBJECT: &str = "subject";
}
