//! CQL schema for the Facto keyspace
//!
//! Every projection mirrors the full event row under a different primary
//! key; a re-insert of the same `facto_id` overwrites with identical bytes,
//! which is what makes at-least-once delivery idempotent at this layer.
//!
//! `started_at`/`completed_at` are bigint nanoseconds rather than CQL
//! timestamps: millisecond truncation would break hash re-verification of
//! stored events. `received_at` is informational and stays a timestamp.

/// DDL statements, executed in order at startup
pub const SCHEMA: &[&str] = &[
    r#"
    CREATE KEYSPACE IF NOT EXISTS facto
    WITH replication = {'class': 'NetworkTopologyStrategy', 'replication_factor': 3}
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS facto.events (
        agent_id text,
        date date,
        facto_id text,
        session_id text,
        parent_facto_id text,
        action_type text,
        status text,
        input_data blob,
        output_data blob,
        model_id text,
        model_hash text,
        temperature double,
        seed bigint,
        max_tokens int,
        tool_calls blob,
        sdk_version text,
        sdk_language text,
        tags map<text, text>,
        signature blob,
        public_key blob,
        prev_hash text,
        event_hash text,
        started_at bigint,
        completed_at bigint,
        received_at timestamp,
        PRIMARY KEY ((agent_id, date), completed_at, facto_id)
    ) WITH CLUSTERING ORDER BY (completed_at ASC, facto_id ASC)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS facto.events_by_facto_id (
        agent_id text,
        date date,
        facto_id text,
        session_id text,
        parent_facto_id text,
        action_type text,
        status text,
        input_data blob,
        output_data blob,
        model_id text,
        model_hash text,
        temperature double,
        seed bigint,
        max_tokens int,
        tool_calls blob,
        sdk_version text,
        sdk_language text,
        tags map<text, text>,
        signature blob,
        public_key blob,
        prev_hash text,
        event_hash text,
        started_at bigint,
        completed_at bigint,
        received_at timestamp,
        PRIMARY KEY (facto_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS facto.events_by_session (
        agent_id text,
        date date,
        facto_id text,
        session_id text,
        parent_facto_id text,
        action_type text,
        status text,
        input_data blob,
        output_data blob,
        model_id text,
        model_hash text,
        temperature double,
        seed bigint,
        max_tokens int,
        tool_calls blob,
        sdk_version text,
        sdk_language text,
        tags map<text, text>,
        signature blob,
        public_key blob,
        prev_hash text,
        event_hash text,
        started_at bigint,
        completed_at bigint,
        received_at timestamp,
        PRIMARY KEY (session_id, completed_at, facto_id)
    ) WITH CLUSTERING ORDER BY (completed_at ASC, facto_id ASC)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS facto.merkle_roots (
        date date,
        bucket_time timestamp,
        root_hash text,
        event_count int,
        first_facto_id text,
        last_facto_id text,
        event_hashes list<text>,
        created_at timestamp,
        PRIMARY KEY (date, bucket_time)
    ) WITH CLUSTERING ORDER BY (bucket_time ASC)
    "#,
];

/// Shared column list, in `EventRow` field order
pub const EVENT_COLUMNS: &str = "agent_id, date, facto_id, session_id, parent_facto_id, \
     action_type, status, input_data, output_data, \
     model_id, model_hash, temperature, seed, max_tokens, tool_calls, \
     sdk_version, sdk_language, tags, \
     signature, public_key, prev_hash, event_hash, \
     started_at, completed_at, received_at";
