//! Storage interface
//!
//! [`EventStore`] is the seam between the batching processor, the query
//! service and the storage engine. Implementations must make `store_batch`
//! idempotent: re-inserting the same `facto_id` overwrites with identical
//! data, so redelivered messages converge to the same state.

pub mod memory;
pub mod scylla;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, NaiveDate, Utc};

use facto_core::types::{FactoEvent, MerkleRootRecord};

use crate::error::{StoreError, StoreResult};

/// One page of events plus the cursor for the next page
#[derive(Debug, Clone)]
pub struct EventPage {
    pub events: Vec<FactoEvent>,
    pub next_cursor: Option<String>,
}

/// Storage operations shared by the processor and the query service
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Persist a batch into all three projections.
    ///
    /// Each projection write is a single atomic engine batch; the three run
    /// concurrently and any failure fails the whole call (the caller NAKs).
    async fn store_batch(&self, events: &[FactoEvent]) -> StoreResult<()>;

    /// Persist a per-batch Merkle-root record
    async fn store_merkle_root(&self, record: &MerkleRootRecord) -> StoreResult<()>;

    /// Events for one agent within `[start, end]`, paged by opaque cursor
    async fn events_by_agent(
        &self,
        agent_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: usize,
        cursor: Option<&str>,
    ) -> StoreResult<EventPage>;

    /// Point lookup by `facto_id`
    async fn event_by_facto_id(&self, facto_id: &str) -> StoreResult<Option<FactoEvent>>;

    /// Events for one session, clustered ascending by `completed_at`
    async fn events_by_session(
        &self,
        session_id: &str,
        limit: usize,
        cursor: Option<&str>,
    ) -> StoreResult<EventPage>;
}

/// UTC day an event belongs to, derived from `completed_at` nanoseconds
pub fn event_date(completed_at_ns: i64) -> NaiveDate {
    DateTime::from_timestamp_nanos(completed_at_ns).date_naive()
}

/// Inclusive list of day partitions covering `[start, end]`
pub fn date_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = start.date_naive();
    let last = end.date_naive();
    while current <= last {
        dates.push(current);
        current = match current.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }
    dates
}

/// Encode a pagination cursor from the last returned event id
pub fn encode_cursor(facto_id: &str) -> String {
    BASE64.encode(facto_id.as_bytes())
}

/// Decode an opaque cursor back into a `facto_id`
pub fn decode_cursor(cursor: &str) -> StoreResult<String> {
    let bytes = BASE64.decode(cursor).map_err(|_| StoreError::InvalidCursor)?;
    String::from_utf8(bytes).map_err(|_| StoreError::InvalidCursor)
}

/// Apply cursor-skip and limit to an ordered event list
pub(crate) fn paginate(
    events: Vec<FactoEvent>,
    limit: usize,
    cursor: Option<&str>,
) -> StoreResult<EventPage> {
    let mut remaining = events;

    if let Some(cursor) = cursor {
        let after = decode_cursor(cursor)?;
        let position = remaining.iter().position(|e| e.facto_id == after);
        remaining = match position {
            Some(idx) => remaining.split_off(idx + 1),
            // Cursor points past everything we can see
            None => Vec::new(),
        };
    }

    let next_cursor = if remaining.len() > limit {
        remaining.truncate(limit);
        remaining.last().map(|e| encode_cursor(&e.facto_id))
    } else {
        None
    };

    Ok(EventPage {
        events: remaining,
        next_cursor,
    })
}
