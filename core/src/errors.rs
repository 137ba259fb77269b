use thiserror::Error;

use crate::origin::OriginState;

/// Stage-level error surfaced to the caller of an origin operation.
///
/// The origin never retries internally; every failure is returned and the
/// enclosing runtime decides halt-vs-continue semantics.
#[derive(Error, Debug)]
pub enum OriginError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to initialize the log consumer: {0}")]
    Initialization(#[source] ConsumerError),

    #[error("Failed to read from the log: {0}")]
    Read(#[source] ConsumerError),

    #[error("Record conversion failed: {0}")]
    RecordConversion(#[from] RecordConversionError),

    #[error("Failed to commit offsets: {0}")]
    Commit(#[source] ConsumerError),

    #[error("{operation} called in {state:?} state")]
    IllegalState {
        operation: &'static str,
        state: OriginState,
    },
}

/// Transport-level failure from the log consumer.
#[derive(Error, Debug)]
pub enum ConsumerError {
    #[error("Failed to create consumer: {reason}")]
    Creation { reason: String },

    #[error("Failed to subscribe to topic {topic}: {reason}")]
    Subscription { topic: String, reason: String },

    #[error("Failed to read messages: {reason}")]
    Read { reason: String },

    #[error("Failed to commit offsets: {reason}")]
    OffsetCommit { reason: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Failed to load configuration from {path}: {reason}")]
    LoadFailed { path: String, reason: String },
}

/// Per-message conversion failure. Carries the partition and offset so the
/// bad message can be located on the broker.
#[derive(Error, Debug)]
pub enum RecordConversionError {
    #[error("Invalid UTF-8 payload at partition {partition} offset {offset}: {reason}")]
    InvalidUtf8 {
        partition: i32,
        offset: i64,
        reason: String,
    },

    #[error("Invalid JSON payload at partition {partition} offset {offset}: {reason}")]
    InvalidJson {
        partition: i32,
        offset: i64,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, OriginError>;

impl OriginError {
    /// A fatal error means the stage cannot make progress and should stop.
    /// Commit and per-message conversion failures are recoverable under the
    /// at-least-once contract: uncommitted offsets are simply re-delivered.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            OriginError::Config(_)
                | OriginError::Initialization(_)
                | OriginError::IllegalState { .. }
        )
    }
}
