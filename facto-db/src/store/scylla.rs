//! ScyllaDB storage backend
//!
//! Writes fan out as three unlogged batches, one per projection table,
//! executed concurrently; each batch is atomic within its table, and any
//! failure fails the whole store call so the processor can NAK. Reads expand
//! time windows into day partitions and page with the shared cursor scheme.

use chrono::{DateTime, Utc};
use scylla::batch::{Batch, BatchType};
use scylla::prepared_statement::PreparedStatement;
use scylla::{ExecutionProfile, Session, SessionBuilder};
use std::time::Duration;
use tracing::{debug, info};

use facto_core::constants::STORAGE_TIMEOUT_SECS;
use facto_core::types::{FactoEvent, MerkleRootRecord};

use super::{date_range, paginate, EventPage, EventStore};
use crate::entities::EventRow;
use crate::error::{StoreError, StoreResult};
use crate::schema::{EVENT_COLUMNS, SCHEMA};

/// Upper bound on rows scanned per partition when serving a read
const MAX_SCAN_ROWS: i32 = 10_000;

/// Production storage backend over the wide-column engine
pub struct ScyllaStore {
    session: Session,
    insert_events: PreparedStatement,
    insert_by_facto_id: PreparedStatement,
    insert_by_session: PreparedStatement,
    insert_merkle_root: PreparedStatement,
    select_by_agent: PreparedStatement,
    select_by_facto_id: PreparedStatement,
    select_by_session: PreparedStatement,
}

impl ScyllaStore {
    /// Connect, apply schema, and prepare all statements
    pub async fn connect(hosts: &[String]) -> StoreResult<Self> {
        let profile = ExecutionProfile::builder()
            .request_timeout(Some(Duration::from_secs(STORAGE_TIMEOUT_SECS)))
            .build();

        let session = SessionBuilder::new()
            .known_nodes(hosts)
            .default_execution_profile_handle(profile.into_handle())
            .build()
            .await
            .map_err(|e| StoreError::Connect(e.to_string()))?;

        for ddl in SCHEMA {
            session
                .query(*ddl, ())
                .await
                .map_err(|e| StoreError::Schema(e.to_string()))?;
        }
        info!(count = SCHEMA.len(), "Schema applied");

        let placeholders = vec!["?"; EVENT_COLUMNS.split(',').count()].join(", ");
        let insert_events = prepare(
            &session,
            &format!(
                "INSERT INTO facto.events ({}) VALUES ({})",
                EVENT_COLUMNS, placeholders
            ),
        )
        .await?;
        let insert_by_facto_id = prepare(
            &session,
            &format!(
                "INSERT INTO facto.events_by_facto_id ({}) VALUES ({})",
                EVENT_COLUMNS, placeholders
            ),
        )
        .await?;
        let insert_by_session = prepare(
            &session,
            &format!(
                "INSERT INTO facto.events_by_session ({}) VALUES ({})",
                EVENT_COLUMNS, placeholders
            ),
        )
        .await?;
        let insert_merkle_root = prepare(
            &session,
            "INSERT INTO facto.merkle_roots \
             (date, bucket_time, root_hash, event_count, first_facto_id, last_facto_id, \
              event_hashes, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .await?;
        let select_by_agent = prepare(
            &session,
            &format!(
                "SELECT {} FROM facto.events \
                 WHERE agent_id = ? AND date = ? AND completed_at >= ? AND completed_at <= ? \
                 LIMIT ?",
                EVENT_COLUMNS
            ),
        )
        .await?;
        let select_by_facto_id = prepare(
            &session,
            &format!(
                "SELECT {} FROM facto.events_by_facto_id WHERE facto_id = ?",
                EVENT_COLUMNS
            ),
        )
        .await?;
        let select_by_session = prepare(
            &session,
            &format!(
                "SELECT {} FROM facto.events_by_session WHERE session_id = ? LIMIT ?",
                EVENT_COLUMNS
            ),
        )
        .await?;

        Ok(Self {
            session,
            insert_events,
            insert_by_facto_id,
            insert_by_session,
            insert_merkle_root,
            select_by_agent,
            select_by_facto_id,
            select_by_session,
        })
    }

    fn projection_batch(&self, statement: &PreparedStatement, count: usize) -> Batch {
        let mut batch = Batch::new(BatchType::Unlogged);
        for _ in 0..count {
            batch.append_statement(statement.clone());
        }
        batch
    }
}

async fn prepare(session: &Session, cql: &str) -> StoreResult<PreparedStatement> {
    session
        .prepare(cql)
        .await
        .map_err(|e| StoreError::Schema(format!("prepare failed: {}", e)))
}

#[async_trait::async_trait]
impl EventStore for ScyllaStore {
    async fn store_batch(&self, events: &[FactoEvent]) -> StoreResult<()> {
        if events.is_empty() {
            return Ok(());
        }

        let received_at = Utc::now();
        let rows: Vec<EventRow> = events
            .iter()
            .map(|e| EventRow::from_event(e, received_at))
            .collect::<StoreResult<_>>()?;

        let events_batch = self.projection_batch(&self.insert_events, rows.len());
        let by_facto_batch = self.projection_batch(&self.insert_by_facto_id, rows.len());
        let by_session_batch = self.projection_batch(&self.insert_by_session, rows.len());

        tokio::try_join!(
            self.session.batch(&events_batch, rows.clone()),
            self.session.batch(&by_facto_batch, rows.clone()),
            self.session.batch(&by_session_batch, rows),
        )
        .map_err(|e| StoreError::Query(e.to_string()))?;

        debug!(count = events.len(), "Stored batch across projections");
        Ok(())
    }

    async fn store_merkle_root(&self, record: &MerkleRootRecord) -> StoreResult<()> {
        self.session
            .execute(
                &self.insert_merkle_root,
                (
                    record.date,
                    record.bucket_time,
                    record.root_hash.as_str(),
                    record.event_count as i32,
                    record.first_facto_id.as_str(),
                    record.last_facto_id.as_str(),
                    record.event_hashes.clone(),
                    record.created_at,
                ),
            )
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
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

        let mut events = Vec::new();
        for date in date_range(start, end) {
            let result = self
                .session
                .execute(
                    &self.select_by_agent,
                    (agent_id, date, start_ns, end_ns, MAX_SCAN_ROWS),
                )
                .await
                .map_err(|e| StoreError::Query(e.to_string()))?;

            for row in result
                .rows_typed::<EventRow>()
                .map_err(|e| StoreError::Decode(e.to_string()))?
            {
                let row = row.map_err(|e| StoreError::Decode(e.to_string()))?;
                events.push(row.into_event()?);
            }

            // Without a cursor to honor, one extra row settles pagination
            if cursor.is_none() && events.len() > limit {
                break;
            }
        }

        paginate(events, limit, cursor)
    }

    async fn event_by_facto_id(&self, facto_id: &str) -> StoreResult<Option<FactoEvent>> {
        let result = self
            .session
            .execute(&self.select_by_facto_id, (facto_id,))
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let row = result
            .maybe_first_row_typed::<EventRow>()
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        row.map(EventRow::into_event).transpose()
    }

    async fn events_by_session(
        &self,
        session_id: &str,
        limit: usize,
        cursor: Option<&str>,
    ) -> StoreResult<EventPage> {
        let result = self
            .session
            .execute(&self.select_by_session, (session_id, MAX_SCAN_ROWS))
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let mut events = Vec::new();
        for row in result
            .rows_typed::<EventRow>()
            .map_err(|e| StoreError::Decode(e.to_string()))?
        {
            let row = row.map_err(|e| StoreError::Decode(e.to_string()))?;
            events.push(row.into_event()?);
        }

        paginate(events, limit, cursor)
    }
}
