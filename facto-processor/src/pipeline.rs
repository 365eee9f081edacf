//! Batch commit pipeline
//!
//! One flush = one Merkle tree + one storage round-trip. The Merkle root is
//! persisted only after all three projections succeed; a root-write failure
//! is logged and swallowed, because the root can always be rebuilt from the
//! stored events, while the event writes must never be retracted.

use chrono::Utc;
use metrics::counter;
use tracing::{error, info};

use facto_core::types::{EventDigest, FactoEvent, MerkleRootRecord};
use facto_core::MerkleTree;
use facto_db::{EventStore, StoreError};

use crate::telemetry::MERKLE_TREES_CREATED;

/// Commit one batch: Merkle root over arrival order, then all projections.
///
/// Returns the committed root record, or `None` for an empty batch (a no-op
/// touching neither the tree builder nor storage). A `StoreError` means the
/// batch must be NAKed for redelivery; the Merkle root was not persisted.
pub async fn commit_batch(
    store: &dyn EventStore,
    events: &[FactoEvent],
) -> Result<Option<MerkleRootRecord>, StoreError> {
    if events.is_empty() {
        return Ok(None);
    }

    let leaves = events
        .iter()
        .map(|e| {
            EventDigest::from_hex(&e.proof.event_hash).map_err(|err| {
                StoreError::Decode(format!("event {} has bad event_hash: {}", e.facto_id, err))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let tree = MerkleTree::build(&leaves);
    let root = tree.root();
    counter!(MERKLE_TREES_CREATED).increment(1);

    store.store_batch(events).await?;

    let bucket_time = Utc::now();
    let record = MerkleRootRecord {
        date: bucket_time.date_naive(),
        bucket_time,
        root_hash: root.to_hex(),
        event_count: events.len(),
        first_facto_id: events[0].facto_id.clone(),
        last_facto_id: events[events.len() - 1].facto_id.clone(),
        event_hashes: leaves.iter().map(EventDigest::to_hex).collect(),
        created_at: bucket_time,
    };

    // Not fatal: the events are durable and the root can be rebuilt
    if let Err(e) = store.store_merkle_root(&record).await {
        error!(error = %e, merkle_root = %record.root_hash, "Failed to store Merkle root");
    } else {
        info!(
            count = record.event_count,
            merkle_root = %record.root_hash,
            "Merkle root committed"
        );
    }

    Ok(Some(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use facto_core::{AgentSigner, EventDraft, SessionChain};
    use facto_db::MemoryStore;

    fn batch(n: usize) -> Vec<FactoEvent> {
        let mut chain = SessionChain::with_session_id(
            "session-pipe",
            "agent-pipe",
            AgentSigner::generate(),
        );
        (0..n)
            .map(|i| {
                chain
                    .sign(
                        EventDraft::new("llm_call", "success")
                            .with_facto_id(format!("ft-pipe-{}", i))
                            .with_times(
                                1_700_000_000_000_000_000,
                                1_700_000_000_000_000_000 + i as i64,
                            ),
                    )
                    .unwrap()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let store = MemoryStore::new();
        let result = commit_batch(&store, &[]).await.unwrap();
        assert!(result.is_none());
        assert_eq!(store.event_count().await, 0);
        assert!(store.merkle_roots().await.is_empty());
    }

    #[tokio::test]
    async fn test_commit_stores_events_and_root() {
        let store = MemoryStore::new();
        let events = batch(3);

        let record = commit_batch(&store, &events).await.unwrap().unwrap();

        assert_eq!(store.event_count().await, 3);
        assert_eq!(record.event_count, 3);
        assert_eq!(record.first_facto_id, "ft-pipe-0");
        assert_eq!(record.last_facto_id, "ft-pipe-2");
        // Leaves are the event hashes in arrival order
        let expected: Vec<String> = events.iter().map(|e| e.proof.event_hash.clone()).collect();
        assert_eq!(record.event_hashes, expected);

        let roots = store.merkle_roots().await;
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].root_hash, record.root_hash);
    }

    #[tokio::test]
    async fn test_projection_failure_persists_nothing() {
        let store = MemoryStore::new();
        let events = batch(2);

        store.fail_next_batch();
        let result = commit_batch(&store, &events).await;
        assert!(result.is_err());
        assert_eq!(store.event_count().await, 0);
        assert!(store.merkle_roots().await.is_empty());

        // Redelivery succeeds with identical hashes
        let record = commit_batch(&store, &events).await.unwrap().unwrap();
        assert_eq!(
            record.event_hashes,
            events
                .iter()
                .map(|e| e.proof.event_hash.clone())
                .collect::<Vec<_>>()
        );
        assert_eq!(store.event_count().await, 2);
    }

    #[tokio::test]
    async fn test_replay_is_idempotent() {
        let store = MemoryStore::new();
        let events = batch(2);

        let first = commit_batch(&store, &events).await.unwrap().unwrap();
        let second = commit_batch(&store, &events).await.unwrap().unwrap();

        // Same storage state, same leaves, same root
        assert_eq!(store.event_count().await, 2);
        assert_eq!(first.event_hashes, second.event_hashes);
        assert_eq!(first.root_hash, second.root_hash);
    }

    #[tokio::test]
    async fn test_root_write_failure_does_not_fail_batch() {
        let store = MemoryStore::new();
        let events = batch(2);

        store.fail_next_root();
        let record = commit_batch(&store, &events).await.unwrap();
        assert!(record.is_some());
        // Events are durable even though the root row is missing
        assert_eq!(store.event_count().await, 2);
        assert!(store.merkle_roots().await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_event_hash_rejects_batch() {
        let store = MemoryStore::new();
        let mut events = batch(2);
        events[1].proof.event_hash = "not-hex".to_string();

        let result = commit_batch(&store, &events).await;
        assert!(matches!(result, Err(StoreError::Decode(_))));
        assert_eq!(store.event_count().await, 0);
    }
}
