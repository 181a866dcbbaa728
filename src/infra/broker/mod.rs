//! Event broker adapters.
//!
//! Every adapter routes a [`ForumEvent`] to its topic and keys it by question
//! so the events of one question stay ordered within a partition.

#[cfg(feature = "kafka")]
pub mod kafka;

use std::{
    collections::HashMap,
    io,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::{
    app::use_case,
    domain::{
        event::{ForumEvent, TOPICS, TOPIC_ANSWERS, TOPIC_PARTITIONS, TOPIC_QUESTIONS},
        repository::NotificationRepository,
        service::{EventPublisher, RecordHandler},
    },
    error::service::{DispatchError, PublishError},
};

/// Record consumer feeding the notification use cases.
pub struct ForumEventConsumer {
    notifications: Arc<dyn NotificationRepository>,
}

impl ForumEventConsumer {
    pub fn new(notifications: Arc<dyn NotificationRepository>) -> Self {
        Self { notifications }
    }
}

#[async_trait]
impl RecordHandler for ForumEventConsumer {
    async fn handle(&self, topic: &str, payload: &[u8]) {
        let event: ForumEvent = match serde_json::from_slice(payload) {
            Ok(event) => event,
            Err(err) => {
                tracing::error!(
                    topic,
                    payload = %String::from_utf8_lossy(payload),
                    "failed to decode event: {err}"
                );
                return;
            }
        };

        match topic {
            TOPIC_QUESTIONS => tracing::info!(
                event_type = %event.event_type,
                question_id = ?event.question_id,
                "received question event"
            ),
            TOPIC_ANSWERS => {
                tracing::info!(
                    event_type = %event.event_type,
                    question_id = ?event.question_id,
                    answer_id = ?event.answer_id,
                    "received answer event"
                );
                if let Err(err) =
                    use_case::notification::handle_event(self.notifications.as_ref(), &event).await
                {
                    tracing::error!(
                        event_type = %event.event_type,
                        "failed to process answer event: {err}"
                    );
                }
            }
            other => tracing::warn!(topic = other, "event from unknown topic dropped"),
        }
    }
}

/// Publisher used while the broker is disabled, events are only logged.
#[derive(Debug, Default)]
pub struct LoggingPublisher;

impl LoggingPublisher {
    pub fn new() -> Self {
        tracing::warn!("event broker disabled, events will be logged only");
        Self
    }
}

#[async_trait]
impl EventPublisher for LoggingPublisher {
    async fn publish(&self, event: &ForumEvent) -> Result<(), PublishError> {
        let payload = serde_json::to_string(event)?;
        tracing::info!(
            event_type = %event.event_type,
            topic = event.topic(),
            key = ?event.key(),
            payload = %payload,
            "broker disabled, event not sent"
        );
        Ok(())
    }
}

#[derive(Debug)]
struct Record {
    offset: u64,
    key: Option<String>,
    payload: Vec<u8>,
}

#[derive(Debug)]
struct Partition {
    sender: mpsc::UnboundedSender<Record>,
    next_offset: AtomicU64,
}

/// In-process broker with the same topic layout as the Kafka deployment.
///
/// Each partition is drained by its own task, so records sharing a key are
/// handled in publish order.
#[derive(Debug)]
pub struct LocalBroker {
    topics: HashMap<&'static str, Vec<Partition>>,
}

impl LocalBroker {
    /// Spawn one consumer task per partition of every topic.
    pub fn start(handler: Arc<dyn RecordHandler>) -> Self {
        let mut topics = HashMap::new();

        for topic in TOPICS {
            let partitions = (0..TOPIC_PARTITIONS)
                .map(|partition| {
                    let (sender, receiver) = mpsc::unbounded_channel();
                    tokio::spawn(consume(topic, partition, receiver, handler.clone()));
                    Partition {
                        sender,
                        next_offset: AtomicU64::new(0),
                    }
                })
                .collect();
            topics.insert(topic, partitions);
        }

        tracing::info!(
            topics = ?TOPICS,
            partitions = TOPIC_PARTITIONS,
            "local event broker started"
        );

        Self { topics }
    }

    /// Offset the next record of a partition will receive.
    pub fn next_offset(&self, topic: &str, partition: u32) -> Option<u64> {
        self.topics
            .get(topic)?
            .get(partition as usize)
            .map(|p| p.next_offset.load(Ordering::SeqCst))
    }
}

async fn consume(
    topic: &'static str,
    partition: u32,
    mut receiver: mpsc::UnboundedReceiver<Record>,
    handler: Arc<dyn RecordHandler>,
) {
    while let Some(record) = receiver.recv().await {
        tracing::debug!(
            topic,
            partition,
            offset = record.offset,
            key = ?record.key,
            "consuming record"
        );
        handler.handle(topic, &record.payload).await;
    }
    tracing::debug!(topic, partition, "partition consumer stopped");
}

#[async_trait]
impl EventPublisher for LocalBroker {
    async fn publish(&self, event: &ForumEvent) -> Result<(), PublishError> {
        let payload = serde_json::to_vec(event)?;
        let topic = event.topic();
        let partition_id = event.partition();

        let partition = self
            .topics
            .get(topic)
            .and_then(|partitions| partitions.get(partition_id as usize))
            .ok_or(DispatchError::InvalidInput(None))?;

        let offset = partition.next_offset.fetch_add(1, Ordering::SeqCst);
        let key = event.key();
        partition
            .sender
            .send(Record {
                offset,
                key: key.clone(),
                payload,
            })
            .map_err(|_| DispatchError::IO(io::ErrorKind::BrokenPipe.into()))?;

        tracing::info!(
            event_type = %event.event_type,
            topic,
            partition = partition_id,
            offset,
            key = ?key,
            "event published"
        );
        Ok(())
    }
}
