use std::{collections::BTreeMap, collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use rskafka::{
    client::{
        consumer::{StartOffset, StreamConsumerBuilder},
        partition::{Compression, PartitionClient, UnknownTopicHandling},
        Client, ClientBuilder,
    },
    record::Record,
};

use crate::{
    domain::{
        event::{ForumEvent, TOPICS, TOPIC_PARTITIONS, TOPIC_REPLICAS},
        service::{EventPublisher, RecordHandler},
    },
    error::{
        service::{DispatchError, PublishError},
        UnknownError,
    },
};

const CREATE_TOPIC_TIMEOUT_MS: i32 = 5_000;
const FETCH_MAX_WAIT_MS: i32 = 500;
const RETRY_DELAY: Duration = Duration::from_secs(1);

fn dispatch_error(err: rskafka::client::error::Error) -> DispatchError {
    DispatchError::Unknown(UnknownError::new(Box::new(err)))
}

/// Kafka backed broker.
///
/// Consumers start at the latest offset of every partition, the client has
/// no consumer group coordination.
pub struct KafkaBroker {
    partitions: HashMap<(&'static str, u32), Arc<PartitionClient>>,
}

impl KafkaBroker {
    pub async fn connect(
        bootstrap_servers: Vec<String>,
        auto_create_topics: bool,
        handler: Arc<dyn RecordHandler>,
    ) -> Result<Self, DispatchError> {
        tracing::info!(servers = ?bootstrap_servers, "connecting to kafka");
        let client = ClientBuilder::new(bootstrap_servers)
            .build()
            .await
            .map_err(dispatch_error)?;

        if auto_create_topics {
            create_topics(&client).await?;
        }

        let mut partitions = HashMap::new();
        for topic in TOPICS {
            for partition in 0..TOPIC_PARTITIONS {
                let partition_client = client
                    .partition_client(topic, partition as i32, UnknownTopicHandling::Retry)
                    .await
                    .map_err(dispatch_error)?;
                let partition_client = Arc::new(partition_client);

                tokio::spawn(consume(topic, partition, partition_client.clone(), handler.clone()));
                partitions.insert((topic, partition), partition_client);
            }
        }

        Ok(Self { partitions })
    }
}

async fn create_topics(client: &Client) -> Result<(), DispatchError> {
    let controller = client.controller_client().map_err(dispatch_error)?;
    for topic in TOPICS {
        match controller
            .create_topic(
                topic,
                TOPIC_PARTITIONS as i32,
                TOPIC_REPLICAS as i16,
                CREATE_TOPIC_TIMEOUT_MS,
            )
            .await
        {
            Ok(()) => tracing::info!(topic, partitions = TOPIC_PARTITIONS, "topic created"),
            // most often the topic already exists
            Err(err) => tracing::warn!(topic, "topic not created: {err}"),
        }
    }
    Ok(())
}

async fn consume(
    topic: &'static str,
    partition: u32,
    client: Arc<PartitionClient>,
    handler: Arc<dyn RecordHandler>,
) {
    let mut stream = StreamConsumerBuilder::new(client, StartOffset::Latest)
        .with_max_wait_ms(FETCH_MAX_WAIT_MS)
        .build();

    while let Some(next) = stream.next().await {
        match next {
            Ok((record, _high_watermark)) => {
                tracing::debug!(topic, partition, offset = record.offset, "consuming record");
                if let Some(payload) = record.record.value {
                    handler.handle(topic, &payload).await;
                }
            }
            Err(err) => {
                tracing::error!(topic, partition, "kafka fetch failed: {err}");
                tokio::time::sleep(RETRY_DELAY).await;
            }
        }
    }
    tracing::warn!(topic, partition, "kafka consumer stopped");
}

#[async_trait]
impl EventPublisher for KafkaBroker {
    async fn publish(&self, event: &ForumEvent) -> Result<(), PublishError> {
        let payload = serde_json::to_vec(event)?;
        let topic = event.topic();
        let partition = event.partition();

        let client = self
            .partitions
            .get(&(topic, partition))
            .ok_or(DispatchError::InvalidInput(None))?;

        let key = event.key();
        let record = Record {
            key: key.clone().map(String::into_bytes),
            value: Some(payload),
            headers: BTreeMap::new(),
            timestamp: Utc::now(),
        };

        let offsets = client
            .produce(vec![record], Compression::NoCompression)
            .await
            .map_err(|err| DispatchError::Unknown(UnknownError::new(Box::new(err))))?;

        tracing::info!(
            event_type = %event.event_type,
            topic,
            partition,
            offset = ?offsets.first(),
            key = ?key,
            "event published"
        );
        Ok(())
    }
}
