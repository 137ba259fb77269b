pub mod batch;
pub mod config;
pub mod errors;
pub mod origin;
pub mod records;
pub mod source;
pub mod telemetry;

pub use batch::{BatchAssembler, BatchSink};
pub use config::{ConsumerConfig, ExecutionMode, PayloadType};
pub use errors::{OriginError, Result};
pub use origin::{KafkaOrigin, Origin, OriginState};
pub use records::{Record, RecordFactory, RecordValue};
pub use source::{LogConsumer, LogMessage};
