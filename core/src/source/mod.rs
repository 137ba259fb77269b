pub mod kafka;

use chrono::{DateTime, Utc};

use crate::errors::ConsumerError;

/// A single message read from the commit log, together with its
/// partition-scoped offset. Offsets are strictly increasing in arrival
/// order within a partition.
#[derive(Debug, Clone)]
pub struct LogMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<Vec<u8>>,
    /// Raw payload bytes, interpreted by the record factory.
    pub payload: Vec<u8>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Handle to the broker-side consumer session. Owns the connection, the
/// partition assignment and the committed offset for the consumer group.
///
/// At most one produce cycle and one commit may be active against a given
/// consumer at a time; callers go through `&mut self`, which makes the
/// exclusivity structural.
#[allow(async_fn_in_trait)]
pub trait LogConsumer {
    /// Joins the consumer group and subscribes to the configured topic.
    async fn connect(&mut self) -> Result<(), ConsumerError>;

    /// Waits at most one internal poll slice for the next message.
    /// `Ok(None)` means nothing arrived within the slice; it is not an
    /// error and not end of stream.
    async fn read(&mut self) -> Result<Option<LogMessage>, ConsumerError>;

    /// Advances the committed offset for the consumer group to just past
    /// the last read position. A commit with nothing new read is a no-op;
    /// the offset never moves backward.
    async fn commit(&mut self) -> Result<(), ConsumerError>;

    /// Releases the consumer session.
    async fn close(&mut self) -> Result<(), ConsumerError>;
}
