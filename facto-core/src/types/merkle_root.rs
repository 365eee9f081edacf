//! Per-batch Merkle commitment records

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Commitment produced once per processor batch
///
/// The leaf list is stored verbatim so the tree, and any inclusion proof,
/// can be rebuilt offline without re-reading the events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerkleRootRecord {
    /// UTC day of the batch commit, the partition key
    pub date: NaiveDate,
    /// Instant the batch was committed
    pub bucket_time: DateTime<Utc>,
    /// Hex SHA-256 root over the batch's event hashes
    pub root_hash: String,
    /// Number of events in the batch
    pub event_count: usize,
    /// First event in batch arrival order
    pub first_facto_id: String,
    /// Last event in batch arrival order
    pub last_facto_id: String,
    /// Ordered leaves exactly as fed into the Merkle build
    pub event_hashes: Vec<String>,
    /// Record creation instant
    pub created_at: DateTime<Utc>,
}
