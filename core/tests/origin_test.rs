//! End-to-end origin behavior over a scripted in-memory consumer.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::time::Instant;

use origin_core::config::{ConsumerConfig, ExecutionMode, PayloadType, PREVIEW_MAX_WAIT_MS};
use origin_core::errors::{ConsumerError, OriginError};
use origin_core::origin::{Origin, OriginState};
use origin_core::records::Record;
use origin_core::source::{LogConsumer, LogMessage};

const SLICE: Duration = Duration::from_millis(100);

fn config(max_batch_size: usize, max_wait_ms: u64) -> ConsumerConfig {
    ConsumerConfig {
        bootstrap_servers: "localhost:9092".to_string(),
        topic: "events".to_string(),
        consumer_group: "origin-test".to_string(),
        payload_type: PayloadType::Text,
        max_batch_size,
        max_wait_ms,
        auto_offset_reset: None,
        session_timeout_ms: None,
        properties: Default::default(),
    }
}

fn message(offset: i64, payload: &[u8]) -> LogMessage {
    LogMessage {
        topic: "events".to_string(),
        partition: 0,
        offset,
        key: None,
        payload: payload.to_vec(),
        timestamp: None,
    }
}

/// Scripted stand-in for the broker consumer. Shared counters stay
/// observable after the instance moves into the origin.
struct FakeConsumer {
    script: VecDeque<LogMessage>,
    commits: Arc<AtomicUsize>,
    reads: Arc<AtomicUsize>,
    fail_close: bool,
}

impl FakeConsumer {
    fn new(script: Vec<LogMessage>) -> Self {
        Self {
            script: script.into(),
            commits: Arc::new(AtomicUsize::new(0)),
            reads: Arc::new(AtomicUsize::new(0)),
            fail_close: false,
        }
    }

    fn silent() -> Self {
        Self::new(vec![])
    }
}

impl LogConsumer for FakeConsumer {
    async fn connect(&mut self) -> Result<(), ConsumerError> {
        Ok(())
    }

    async fn read(&mut self) -> Result<Option<LogMessage>, ConsumerError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        match self.script.pop_front() {
            Some(message) => Ok(Some(message)),
            None => {
                tokio::time::sleep(SLICE).await;
                Ok(None)
            }
        }
    }

    async fn commit(&mut self) -> Result<(), ConsumerError> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ConsumerError> {
        if self.fail_close {
            return Err(ConsumerError::Read {
                reason: "session already gone".to_string(),
            });
        }
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn produce_and_commit_before_init_fail() {
    let mut origin = Origin::new(
        FakeConsumer::silent(),
        config(10, 1000),
        ExecutionMode::Standard,
    );
    let mut sink: Vec<Record> = Vec::new();

    let err = origin.produce(None, 10, &mut sink).await.unwrap_err();
    assert!(matches!(
        err,
        OriginError::IllegalState {
            operation: "produce",
            state: OriginState::Uninitialized,
        }
    ));

    let err = origin.commit(None).await.unwrap_err();
    assert!(matches!(err, OriginError::IllegalState { .. }));
}

#[tokio::test(start_paused = true)]
async fn operations_after_destroy_fail() {
    let mut origin = Origin::new(
        FakeConsumer::silent(),
        config(10, 1000),
        ExecutionMode::Standard,
    );
    origin.init().await.unwrap();
    origin.destroy().await;
    assert_eq!(origin.state(), OriginState::Destroyed);

    let mut sink: Vec<Record> = Vec::new();
    let err = origin.produce(None, 10, &mut sink).await.unwrap_err();
    assert!(matches!(
        err,
        OriginError::IllegalState {
            state: OriginState::Destroyed,
            ..
        }
    ));
    let err = origin.commit(None).await.unwrap_err();
    assert!(matches!(err, OriginError::IllegalState { .. }));
    let err = origin.init().await.unwrap_err();
    assert!(matches!(err, OriginError::IllegalState { .. }));

    // destroy stays idempotent
    origin.destroy().await;
    assert_eq!(origin.state(), OriginState::Destroyed);
}

#[tokio::test(start_paused = true)]
async fn double_init_fails() {
    let mut origin = Origin::new(
        FakeConsumer::silent(),
        config(10, 1000),
        ExecutionMode::Standard,
    );
    origin.init().await.unwrap();
    let err = origin.init().await.unwrap_err();
    assert!(matches!(
        err,
        OriginError::IllegalState {
            operation: "init",
            state: OriginState::Ready,
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn produce_delivers_records_in_order_and_round_trips_token() {
    let script = vec![
        message(0, b"first\nsecond"),
        message(1, b"third"),
    ];
    let mut origin = Origin::new(FakeConsumer::new(script), config(3, 1000), ExecutionMode::Standard);
    origin.init().await.unwrap();

    let mut sink: Vec<Record> = Vec::new();
    let token = origin
        .produce(Some("token-42".to_string()), 100, &mut sink)
        .await
        .unwrap();

    assert_eq!(token.as_deref(), Some("token-42"));
    let ids: Vec<&str> = sink.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["events::0::0::0", "events::0::0::1", "events::0::1::2"]
    );
    assert_eq!(origin.metrics().records_produced, 3);
    assert_eq!(origin.metrics().batches_produced, 1);
}

#[tokio::test(start_paused = true)]
async fn empty_wait_window_is_a_valid_batch() {
    let mut origin = Origin::new(
        FakeConsumer::silent(),
        config(10, 1000),
        ExecutionMode::Standard,
    );
    origin.init().await.unwrap();

    let mut sink: Vec<Record> = Vec::new();
    let start = Instant::now();
    let token = origin.produce(None, 10, &mut sink).await.unwrap();

    assert!(token.is_none());
    assert!(sink.is_empty());
    assert!(start.elapsed() >= Duration::from_millis(1000));
    assert_eq!(origin.metrics().empty_batches, 1);
}

#[tokio::test(start_paused = true)]
async fn preview_mode_bounds_the_wait_regardless_of_config() {
    // configured wait is 5 seconds, preview forces 1 second
    let mut origin = Origin::new(
        FakeConsumer::silent(),
        config(10, 5000),
        ExecutionMode::Preview,
    );
    assert_eq!(origin.config().max_wait_ms, PREVIEW_MAX_WAIT_MS);
    origin.init().await.unwrap();

    let mut sink: Vec<Record> = Vec::new();
    let start = Instant::now();
    origin.produce(None, 10, &mut sink).await.unwrap();
    let elapsed = start.elapsed();

    assert!(elapsed >= Duration::from_millis(PREVIEW_MAX_WAIT_MS));
    assert!(elapsed <= Duration::from_millis(PREVIEW_MAX_WAIT_MS) + SLICE);
}

#[tokio::test(start_paused = true)]
async fn commit_is_idempotent_for_the_caller() {
    let consumer = FakeConsumer::new(vec![message(0, b"payload")]);
    let commits = consumer.commits.clone();
    let mut origin = Origin::new(consumer, config(10, 1000), ExecutionMode::Standard);
    origin.init().await.unwrap();

    let mut sink: Vec<Record> = Vec::new();
    origin.produce(None, 10, &mut sink).await.unwrap();

    origin.commit(None).await.unwrap();
    origin.commit(None).await.unwrap();

    assert_eq!(commits.load(Ordering::SeqCst), 2);
    assert_eq!(origin.metrics().commits, 2);
}

#[tokio::test(start_paused = true)]
async fn conversion_failure_keeps_earlier_records_in_sink() {
    let script = vec![message(0, b"fine"), message(1, &[0xff, 0xfe])];
    let mut origin = Origin::new(
        FakeConsumer::new(script),
        config(10, 1000),
        ExecutionMode::Standard,
    );
    origin.init().await.unwrap();

    let mut sink: Vec<Record> = Vec::new();
    let err = origin.produce(None, 10, &mut sink).await.unwrap_err();

    assert!(matches!(err, OriginError::RecordConversion(_)));
    assert!(err.to_string().contains("offset 1"));
    assert_eq!(sink.len(), 1);
    // the stage stays usable, the runtime decides halt-vs-continue
    assert_eq!(origin.state(), OriginState::Ready);
}

#[tokio::test(start_paused = true)]
async fn destroy_swallows_close_failure() {
    let mut consumer = FakeConsumer::silent();
    consumer.fail_close = true;
    let mut origin = Origin::new(consumer, config(10, 1000), ExecutionMode::Standard);
    origin.init().await.unwrap();

    origin.destroy().await;
    assert_eq!(origin.state(), OriginState::Destroyed);
}

#[tokio::test(start_paused = true)]
async fn overshoot_is_kept_and_stops_reads() {
    let script = (0..4).map(|i| message(i, b"a\nb\nc\nd")).collect();
    let consumer = FakeConsumer::new(script);
    let reads = consumer.reads.clone();
    let mut origin = Origin::new(consumer, config(10, 60_000), ExecutionMode::Standard);
    origin.init().await.unwrap();

    let mut sink: Vec<Record> = Vec::new();
    origin.produce(None, 10, &mut sink).await.unwrap();

    assert_eq!(sink.len(), 12);
    assert_eq!(reads.load(Ordering::SeqCst), 3);
}
