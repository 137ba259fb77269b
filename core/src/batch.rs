use std::time::Duration;

use tokio::time::Instant;

use crate::errors::{OriginError, Result};
use crate::records::{Record, RecordFactory};
use crate::source::LogConsumer;

/// Caller-supplied destination for the records of one batch. Append-only
/// and order-preserving.
pub trait BatchSink {
    fn add_record(&mut self, record: Record);
}

impl BatchSink for Vec<Record> {
    fn add_record(&mut self, record: Record) {
        self.push(record);
    }
}

/// The bounded collection loop. A batch is done when either the record
/// count bound or the wall-clock deadline is crossed, whichever comes
/// first.
#[derive(Debug, Clone, Copy)]
pub struct BatchAssembler {
    max_batch_size: usize,
    max_wait: Duration,
}

impl BatchAssembler {
    pub fn new(max_batch_size: usize, max_wait_ms: u64) -> Self {
        Self {
            max_batch_size,
            max_wait: Duration::from_millis(max_wait_ms),
        }
    }

    /// Reads messages until either bound trips and appends the converted
    /// records to `sink`. Returns the number of records appended.
    ///
    /// The effective count bound is `min(configured, requested)`; the
    /// caller may ask for a smaller batch than configured, never a larger
    /// one. The bound counts emitted records, not raw messages, so a
    /// message expanding into several records may overshoot it; the
    /// overshoot is kept, not trimmed, and no further reads are issued.
    ///
    /// A wait window that elapses without any message is a valid, empty
    /// batch. Conversion and read failures propagate immediately; records
    /// already appended stay in the sink.
    pub async fn fill<L, S>(
        &self,
        consumer: &mut L,
        factory: &RecordFactory,
        requested_max_batch_size: usize,
        sink: &mut S,
    ) -> Result<usize>
    where
        L: LogConsumer,
        S: BatchSink,
    {
        let batch_size = self.max_batch_size.min(requested_max_batch_size);
        let deadline = Instant::now() + self.max_wait;
        let mut records_produced = 0;

        while records_produced < batch_size && Instant::now() < deadline {
            let message = consumer.read().await.map_err(OriginError::Read)?;
            if let Some(message) = message {
                let records = factory.create_records(&message, records_produced)?;
                records_produced += records.len();
                for record in records {
                    sink.add_record(record);
                }
            }
        }

        Ok(records_produced)
    }
}
