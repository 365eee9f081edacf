//! Processor metrics
//!
//! Exported through the Prometheus recorder installed in `main`; names are
//! stable and consumed by dashboards.

use metrics::{describe_counter, describe_histogram};

pub const EVENTS_CONSUMED: &str = "facto_processor_events_consumed_total";
pub const EVENTS_PROCESSED: &str = "facto_processor_events_processed_total";
pub const EVENTS_FAILED: &str = "facto_processor_events_failed_total";
pub const BATCHES_PROCESSED: &str = "facto_processor_batches_processed_total";
pub const BATCH_SIZE: &str = "facto_processor_batch_size";
pub const BATCH_LATENCY_SECONDS: &str = "facto_processor_batch_latency_seconds";
pub const MERKLE_TREES_CREATED: &str = "facto_processor_merkle_trees_created_total";

/// Register metric descriptions with the installed recorder
pub fn describe() {
    describe_counter!(EVENTS_CONSUMED, "Total number of events consumed from NATS");
    describe_counter!(
        EVENTS_PROCESSED,
        "Total number of events processed successfully"
    );
    describe_counter!(EVENTS_FAILED, "Total number of events that failed processing");
    describe_counter!(BATCHES_PROCESSED, "Total number of batches processed");
    describe_histogram!(BATCH_SIZE, "Size of processed batches");
    describe_histogram!(
        BATCH_LATENCY_SECONDS,
        "Latency of batch processing in seconds"
    );
    describe_counter!(MERKLE_TREES_CREATED, "Total number of Merkle trees created");
}
