//! Facto Database Layer
//!
//! Persists events into three denormalized projections plus a Merkle-root
//! table, and serves the read patterns of the query service:
//! - `events`: partitioned by `(agent_id, date)`, clustered by time
//! - `events_by_facto_id`: point lookup
//! - `events_by_session`: session walk, clustered ascending by `completed_at`
//! - `merkle_roots`: one row per committed batch
//!
//! The [`EventStore`] trait is the seam between the processor/API and the
//! engine; [`ScyllaStore`] is the production backend, [`MemoryStore`] backs
//! tests.

pub mod entities;
pub mod error;
pub mod schema;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use store::memory::MemoryStore;
pub use store::scylla::ScyllaStore;
pub use store::{encode_cursor, event_date, EventPage, EventStore};
