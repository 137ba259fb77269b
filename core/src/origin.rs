use tracing::{debug, info, warn};

use crate::batch::{BatchAssembler, BatchSink};
use crate::config::{ConsumerConfig, ExecutionMode};
use crate::errors::{OriginError, Result};
use crate::records::RecordFactory;
use crate::source::LogConsumer;
use crate::source::kafka::KafkaLogConsumer;
use crate::telemetry::OriginMetrics;

/// Lifecycle of one origin instance. `Destroyed` is terminal; any
/// operation invoked after it fails with `IllegalState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginState {
    Uninitialized,
    Ready,
    Destroyed,
}

/// Commit-log origin stage: repeatedly assembles bounded batches from one
/// consumer and advances the broker-side committed offset only when the
/// runtime reports a batch durable downstream. A crash between read and
/// commit re-delivers the same messages on restart; that is the
/// at-least-once contract.
///
/// All operations take `&mut self`, so produce and commit can never
/// overlap for one instance. A host that shares an origin across tasks
/// must serialize access, e.g. behind a `tokio::sync::Mutex`.
pub struct Origin<L: LogConsumer> {
    config: ConsumerConfig,
    consumer: L,
    factory: RecordFactory,
    assembler: BatchAssembler,
    state: OriginState,
    metrics: OriginMetrics,
}

pub type KafkaOrigin = Origin<KafkaLogConsumer>;

impl KafkaOrigin {
    /// Builds a Kafka-backed origin. The preview wait override and
    /// validation run before the consumer client is constructed.
    pub fn from_config(config: ConsumerConfig, mode: ExecutionMode) -> Result<Self> {
        let config = config.effective_for(mode);
        config.validate()?;
        let consumer = KafkaLogConsumer::new(&config).map_err(OriginError::Initialization)?;
        Ok(Origin::new(consumer, config, mode))
    }
}

impl<L: LogConsumer> Origin<L> {
    pub fn new(consumer: L, config: ConsumerConfig, mode: ExecutionMode) -> Self {
        let config = config.effective_for(mode);
        let factory = RecordFactory::for_payload(config.payload_type);
        let assembler = BatchAssembler::new(config.max_batch_size, config.max_wait_ms);
        Self {
            config,
            consumer,
            factory,
            assembler,
            state: OriginState::Uninitialized,
            metrics: OriginMetrics::default(),
        }
    }

    /// Connects the consumer. Fatal on failure; there is no retry at this
    /// layer.
    pub async fn init(&mut self) -> Result<()> {
        if self.state != OriginState::Uninitialized {
            return Err(OriginError::IllegalState {
                operation: "init",
                state: self.state,
            });
        }
        self.consumer
            .connect()
            .await
            .map_err(OriginError::Initialization)?;
        self.state = OriginState::Ready;
        info!("Successfully initialized log consumer");
        Ok(())
    }

    /// Runs one bounded collection cycle, appending records to `sink`.
    ///
    /// Returns `last_offset_token` unchanged: continuation is tracked on
    /// the broker side, the token is only round-tripped to satisfy the
    /// runtime's batch-continuation contract.
    pub async fn produce<S: BatchSink>(
        &mut self,
        last_offset_token: Option<String>,
        requested_max_batch_size: usize,
        sink: &mut S,
    ) -> Result<Option<String>> {
        self.check_ready("produce")?;
        debug!("Reading messages from the log");

        let produced = self
            .assembler
            .fill(&mut self.consumer, &self.factory, requested_max_batch_size, sink)
            .await?;

        self.metrics.batches_produced += 1;
        self.metrics.records_produced += produced;
        if produced == 0 {
            self.metrics.empty_batches += 1;
        }
        info!("Produced {} records in this batch", produced);
        Ok(last_offset_token)
    }

    /// Advances the committed offset to the position of the last message
    /// read. Must only be called once the batch produced with
    /// `offset_token` is durable downstream. Failures are reported, not
    /// retried; an uncommitted offset only means re-delivery.
    pub async fn commit(&mut self, _offset_token: Option<&str>) -> Result<()> {
        self.check_ready("commit")?;
        info!("Committing offsets for topic {}", self.config.topic);
        self.consumer.commit().await.map_err(OriginError::Commit)?;
        self.metrics.commits += 1;
        Ok(())
    }

    /// Releases the consumer unconditionally. Best-effort: a close failure
    /// is logged and swallowed. Idempotent.
    pub async fn destroy(&mut self) {
        if self.state == OriginState::Destroyed {
            return;
        }
        info!("Destroying log consumer");
        if let Err(e) = self.consumer.close().await {
            warn!("Failed to close consumer cleanly: {e}");
        }
        self.state = OriginState::Destroyed;
    }

    pub fn state(&self) -> OriginState {
        self.state
    }

    pub fn metrics(&self) -> &OriginMetrics {
        &self.metrics
    }

    pub fn config(&self) -> &ConsumerConfig {
        &self.config
    }

    fn check_ready(&self, operation: &'static str) -> Result<()> {
        if self.state != OriginState::Ready {
            return Err(OriginError::IllegalState {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }
}
