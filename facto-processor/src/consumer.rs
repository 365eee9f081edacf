//! Work-queue consumer
//!
//! Pulls events off the durable JetStream work queue, buffers them, and
//! flushes through the commit pipeline when either the batch fills or the
//! flush timer ticks. Messages are acknowledged only after durable storage
//! succeeds; any storage failure NAKs the whole batch for redelivery.
//!
//! Two cooperating tasks: a puller that fetches message batches into a
//! bounded channel, and the committer loop that owns the buffers. The
//! pending-ack cap on the consumer throttles the broker if storage stalls.

use async_nats::jetstream::{
    self,
    consumer::{pull, AckPolicy, PullConsumer},
    stream::{RetentionPolicy, StorageType},
    AckKind,
};
use futures::StreamExt;
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use facto_core::constants::{ACK_WAIT_SECS, EVENT_SUBJECT, STREAM_NAME};
use facto_core::types::FactoEvent;
use facto_db::EventStore;

use crate::config::ProcessorConfig;
use crate::pipeline::commit_batch;
use crate::telemetry::{
    BATCHES_PROCESSED, BATCH_LATENCY_SECONDS, BATCH_SIZE, EVENTS_CONSUMED, EVENTS_FAILED,
    EVENTS_PROCESSED,
};

#[derive(Error, Debug)]
pub enum ConsumerError {
    #[error("NATS error: {0}")]
    Nats(String),
}

/// Batching work-queue consumer
pub struct Consumer {
    config: ProcessorConfig,
    store: Arc<dyn EventStore>,
    consumer: PullConsumer,
}

impl Consumer {
    /// Connect to NATS and ensure the stream and durable consumer exist
    pub async fn connect(
        config: ProcessorConfig,
        store: Arc<dyn EventStore>,
    ) -> Result<Self, ConsumerError> {
        let client = async_nats::connect(&config.nats_url)
            .await
            .map_err(|e| ConsumerError::Nats(e.to_string()))?;
        let context = jetstream::new(client);

        // The stream captures the full subject space; consumers narrow it
        let stream = context
            .get_or_create_stream(jetstream::stream::Config {
                name: STREAM_NAME.to_string(),
                subjects: vec![EVENT_SUBJECT.to_string()],
                retention: RetentionPolicy::WorkQueue,
                storage: StorageType::File,
                max_messages: 10_000_000,
                max_bytes: 10 * 1024 * 1024 * 1024,
                ..Default::default()
            })
            .await
            .map_err(|e| ConsumerError::Nats(e.to_string()))?;

        if config.reset_consumer {
            info!(durable = %config.durable_name, "Deleting consumer for reset");
            if let Err(e) = stream.delete_consumer(&config.durable_name).await {
                warn!(error = %e, "Failed to delete consumer (maybe it didn't exist)");
            }
        }

        let consumer = stream
            .get_or_create_consumer(
                &config.durable_name,
                pull::Config {
                    durable_name: Some(config.durable_name.clone()),
                    filter_subject: config.filter_subject.clone(),
                    ack_policy: AckPolicy::Explicit,
                    max_ack_pending: (config.batch_size * 2) as i64,
                    ack_wait: Duration::from_secs(ACK_WAIT_SECS),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| ConsumerError::Nats(e.to_string()))?;

        info!(
            durable = %config.durable_name,
            subject = %config.filter_subject,
            "Consuming from {} stream", STREAM_NAME
        );

        Ok(Self {
            config,
            store,
            consumer,
        })
    }

    /// Run until a shutdown signal arrives, then drain through a final flush
    pub async fn run(self, mut shutdown: mpsc::Receiver<()>) {
        let (tx, mut rx) = mpsc::channel::<jetstream::Message>(self.config.batch_size);
        let puller = spawn_puller(
            self.consumer.clone(),
            tx,
            self.config.batch_size,
            self.config.flush_interval,
        );

        let mut ticker = tokio::time::interval(self.config.flush_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        let mut events: Vec<FactoEvent> = Vec::with_capacity(self.config.batch_size);
        let mut messages: Vec<jetstream::Message> = Vec::with_capacity(self.config.batch_size);

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Shutdown signal received, flushing remainder");
                    self.flush(&mut events, &mut messages).await;
                    break;
                }
                received = rx.recv() => {
                    match received {
                        Some(message) => {
                            self.buffer(message, &mut events, &mut messages).await;
                            if events.len() >= self.config.batch_size {
                                self.flush(&mut events, &mut messages).await;
                            }
                        }
                        None => {
                            self.flush(&mut events, &mut messages).await;
                            break;
                        }
                    }
                }
                _ = ticker.tick() => {
                    if !events.is_empty() {
                        self.flush(&mut events, &mut messages).await;
                    }
                }
            }
        }

        puller.abort();
        info!("Consumer stopped");
    }

    /// Decode and buffer one message; malformed payloads are NAKed here
    async fn buffer(
        &self,
        message: jetstream::Message,
        events: &mut Vec<FactoEvent>,
        messages: &mut Vec<jetstream::Message>,
    ) {
        counter!(EVENTS_CONSUMED).increment(1);

        let event: FactoEvent = match serde_json::from_slice(&message.payload) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Failed to decode event payload");
                nak(&message).await;
                counter!(EVENTS_FAILED).increment(1);
                return;
            }
        };

        if !is_hex64(&event.proof.event_hash) {
            warn!(facto_id = %event.facto_id, "Event carries malformed event_hash");
            nak(&message).await;
            counter!(EVENTS_FAILED).increment(1);
            return;
        }

        events.push(event);
        messages.push(message);
    }

    /// Flush the buffer through the pipeline; buffers are cleared either way
    async fn flush(&self, events: &mut Vec<FactoEvent>, messages: &mut Vec<jetstream::Message>) {
        if events.is_empty() {
            return;
        }

        let start = Instant::now();
        let count = events.len();
        debug!(count, "Processing batch");

        match commit_batch(self.store.as_ref(), events).await {
            Ok(record) => {
                for message in messages.iter() {
                    if let Err(e) = message.ack().await {
                        warn!(error = %e, "Failed to ack message");
                    }
                }
                counter!(EVENTS_PROCESSED).increment(count as u64);
                info!(
                    count,
                    merkle_root = record.as_ref().map(|r| r.root_hash.as_str()).unwrap_or(""),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Batch processed"
                );
            }
            Err(e) => {
                error!(error = %e, count, "Failed to store batch, requesting redelivery");
                for message in messages.iter() {
                    nak(message).await;
                }
                counter!(EVENTS_FAILED).increment(count as u64);
            }
        }

        counter!(BATCHES_PROCESSED).increment(1);
        histogram!(BATCH_SIZE).record(count as f64);
        histogram!(BATCH_LATENCY_SECONDS).record(start.elapsed().as_secs_f64());

        events.clear();
        messages.clear();
    }
}

/// Fetch message batches in parallel with processing
fn spawn_puller(
    consumer: PullConsumer,
    tx: mpsc::Sender<jetstream::Message>,
    batch_size: usize,
    flush_interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let fetch = consumer
                .fetch()
                .max_messages(batch_size)
                .expires(flush_interval)
                .messages()
                .await;

            let mut batch = match fetch {
                Ok(batch) => batch,
                Err(e) => {
                    debug!(error = %e, "Fetch returned");
                    tokio::time::sleep(Duration::from_millis(250)).await;
                    continue;
                }
            };

            while let Some(message) = batch.next().await {
                match message {
                    Ok(message) => {
                        // Receiver gone means we are shutting down
                        if tx.send(message).await.is_err() {
                            return;
                        }
                    }
                    Err(e) => debug!(error = %e, "Fetch batch error"),
                }
            }
        }
    })
}

async fn nak(message: &jetstream::Message) {
    if let Err(e) = message.ack_with(AckKind::Nak(None)).await {
        warn!(error = %e, "Failed to nak message");
    }
}

fn is_hex64(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_hex64() {
        assert!(is_hex64(&"0".repeat(64)));
        assert!(is_hex64(&"f".repeat(64)));
        assert!(!is_hex64(&"f".repeat(63)));
        assert!(!is_hex64(&"g".repeat(64)));
        assert!(!is_hex64(""));
    }
}
