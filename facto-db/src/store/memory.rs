//! In-memory storage backend
//!
//! Mirrors the three Scylla projections with ordered maps, for unit and
//! integration tests. Write failures can be injected to exercise the
//! processor's NAK/redelivery path.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use facto_core::types::{FactoEvent, MerkleRootRecord};

use super::{date_range, event_date, paginate, EventPage, EventStore};
use crate::error::{StoreError, StoreResult};

/// Clustering key within a partition: (completed_at, facto_id)
type Clustering = (i64, String);

#[derive(Default)]
struct Projections {
    by_agent_date: HashMap<(String, NaiveDate), BTreeMap<Clustering, FactoEvent>>,
    by_facto_id: HashMap<String, FactoEvent>,
    by_session: HashMap<String, BTreeMap<Clustering, FactoEvent>>,
    merkle_roots: Vec<MerkleRootRecord>,
}

/// Test-oriented in-memory backend
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Projections>,
    fail_next_batch: AtomicBool,
    fail_next_root: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `store_batch` fail with `Unavailable`
    pub fn fail_next_batch(&self) {
        self.fail_next_batch.store(true, Ordering::SeqCst);
    }

    /// Make the next `store_merkle_root` fail with `Unavailable`
    pub fn fail_next_root(&self) {
        self.fail_next_root.store(true, Ordering::SeqCst);
    }

    /// All stored Merkle-root records, in commit order
    pub async fn merkle_roots(&self) -> Vec<MerkleRootRecord> {
        self.inner.read().await.merkle_roots.clone()
    }

    /// Total number of distinct stored events
    pub async fn event_count(&self) -> usize {
        self.inner.read().await.by_facto_id.len()
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn store_batch(&self, events: &[FactoEvent]) -> StoreResult<()> {
        if self.fail_next_batch.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected batch failure".into()));
        }

        let mut inner = self.inner.write().await;
        for event in events {
            let key = (event.completed_at, event.facto_id.clone());

            inner
                .by_agent_date
                .entry((event.agent_id.clone(), event_date(event.completed_at)))
                .or_default()
                .insert(key.clone(), event.clone());

            inner
                .by_facto_id
                .insert(event.facto_id.clone(), event.clone());

            inner
                .by_session
                .entry(event.session_id.clone())
                .or_default()
                .insert(key, event.clone());
        }
        Ok(())
    }

    async fn store_merkle_root(&self, record: &MerkleRootRecord) -> StoreResult<()> {
        if self.fail_next_root.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected root failure".into()));
        }
        self.inner.write().await.merkle_roots.push(record.clone());
        Ok(())
    }

    async fn events_by_agent(
        &self,
        agent_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: usize,
        cursor: Option<&str>,
    ) -> StoreResult<EventPage> {
        let start_ns = start.timestamp_nanos_opt().unwrap_or(i64::MIN);
        let end_ns = end.timestamp_nanos_opt().unwrap_or(i64::MAX);

        let inner = self.inner.read().await;
        let mut events = Vec::new();
        for date in date_range(start, end) {
            if let Some(partition) = inner.by_agent_date.get(&(agent_id.to_string(), date)) {
                events.extend(
                    partition
                        .values()
                        .filter(|e| e.completed_at >= start_ns && e.completed_at <= end_ns)
                        .cloned(),
                );
            }
        }

        paginate(events, limit, cursor)
    }

    async fn event_by_facto_id(&self, facto_id: &str) -> StoreResult<Option<FactoEvent>> {
        Ok(self.inner.read().await.by_facto_id.get(facto_id).cloned())
    }

    async fn events_by_session(
        &self,
        session_id: &str,
        limit: usize,
        cursor: Option<&str>,
    ) -> StoreResult<EventPage> {
        let inner = self.inner.read().await;
        let events: Vec<FactoEvent> = inner
            .by_session
            .get(session_id)
            .map(|partition| partition.values().cloned().collect())
            .unwrap_or_default();

        paginate(events, limit, cursor)
    }
}
