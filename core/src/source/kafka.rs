use std::collections::HashMap;
use std::time::Duration;

use chrono::DateTime;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::{ClientConfig, Offset, TopicPartitionList};
use tokio::time::timeout;
use tracing::{debug, info};

use crate::config::ConsumerConfig;
use crate::errors::ConsumerError;
use crate::source::{LogConsumer, LogMessage};

/// Upper bound on a single `read` call. The per-batch deadline is enforced
/// by the batch assembler, which polls repeatedly; this slice only bounds
/// how long one poll can sit waiting on the broker.
const POLL_SLICE: Duration = Duration::from_millis(500);

/// Kafka-backed [`LogConsumer`] using a high-level consumer with manual
/// offset commit. The committed offset lives in the broker's coordination
/// service; nothing is persisted locally.
pub struct KafkaLogConsumer {
    consumer: StreamConsumer,
    config: ConsumerConfig,
    /// Highest offset read per partition since the last successful commit.
    uncommitted: HashMap<i32, i64>,
}

impl KafkaLogConsumer {
    /// Builds the consumer client without contacting the broker; partition
    /// assignment happens in [`LogConsumer::connect`].
    pub fn new(config: &ConsumerConfig) -> Result<Self, ConsumerError> {
        let mut client_config = ClientConfig::new();

        client_config
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("group.id", &config.consumer_group)
            .set("enable.partition.eof", "false")
            .set("session.timeout.ms", "6000")
            .set("enable.auto.commit", "false")
            .set(
                "auto.offset.reset",
                config.auto_offset_reset.as_deref().unwrap_or("earliest"),
            );

        if let Some(session_timeout) = config.session_timeout_ms {
            client_config.set("session.timeout.ms", session_timeout.to_string());
        }

        // opaque passthrough, applied last so operator overrides win
        for (key, value) in &config.properties {
            client_config.set(key, value);
        }

        let consumer: StreamConsumer =
            client_config
                .create()
                .map_err(|e| ConsumerError::Creation {
                    reason: e.to_string(),
                })?;

        Ok(Self {
            consumer,
            config: config.clone(),
            uncommitted: HashMap::new(),
        })
    }
}

impl LogConsumer for KafkaLogConsumer {
    async fn connect(&mut self) -> Result<(), ConsumerError> {
        self.consumer
            .subscribe(&[self.config.topic.as_str()])
            .map_err(|e| ConsumerError::Subscription {
                topic: self.config.topic.clone(),
                reason: e.to_string(),
            })?;

        info!("Subscribed to topic: {}", self.config.topic);
        Ok(())
    }

    async fn read(&mut self) -> Result<Option<LogMessage>, ConsumerError> {
        let message = match timeout(POLL_SLICE, self.consumer.recv()).await {
            Err(_) => return Ok(None),
            Ok(Err(e)) => {
                return Err(ConsumerError::Read {
                    reason: e.to_string(),
                });
            }
            Ok(Ok(message)) => message,
        };

        debug!(
            "Received message from partition {} offset {}",
            message.partition(),
            message.offset()
        );
        self.uncommitted.insert(message.partition(), message.offset());

        // Tombstones advance the committable position but carry no data.
        let Some(payload) = message.payload() else {
            return Ok(None);
        };

        Ok(Some(LogMessage {
            topic: message.topic().to_string(),
            partition: message.partition(),
            offset: message.offset(),
            key: message.key().map(|k| k.to_vec()),
            payload: payload.to_vec(),
            timestamp: message
                .timestamp()
                .to_millis()
                .and_then(DateTime::from_timestamp_millis),
        }))
    }

    async fn commit(&mut self) -> Result<(), ConsumerError> {
        if self.uncommitted.is_empty() {
            return Ok(());
        }

        let mut tpl = TopicPartitionList::new();
        for (&partition, &offset) in &self.uncommitted {
            tpl.add_partition_offset(&self.config.topic, partition, Offset::Offset(offset + 1))
                .map_err(|e| ConsumerError::OffsetCommit {
                    reason: e.to_string(),
                })?;
        }

        self.consumer
            .commit(&tpl, CommitMode::Sync)
            .map_err(|e| ConsumerError::OffsetCommit {
                reason: e.to_string(),
            })?;

        debug!(
            "Committed offsets for {} partition(s) of topic {}",
            self.uncommitted.len(),
            self.config.topic
        );
        self.uncommitted.clear();
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ConsumerError> {
        self.consumer.unsubscribe();
        Ok(())
    }
}
