use serde::Serialize;
use serde_json::Value;

use crate::config::PayloadType;
use crate::errors::RecordConversionError;
use crate::source::LogMessage;

/// A unit of pipeline data derived from a log message. Owned by the batch
/// assembler until handed to the sink, after which the pipeline runtime
/// owns it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Provenance id: `<topic>::<partition>::<offset>::<n>` where `n` is
    /// the record's index within its batch.
    pub id: String,
    pub value: RecordValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordValue {
    Text(String),
    Json(Value),
    Binary(Vec<u8>),
}

/// Converts one raw log message into zero or more records. One variant per
/// payload type; a single message may expand into many records, so callers
/// must account by emitted records, not by messages.
#[derive(Debug, Clone, Copy)]
pub enum RecordFactory {
    /// One record per line of UTF-8 text.
    Text,
    /// One record per top-level JSON value; an array yields one per element.
    Json,
    /// The raw payload as a single record.
    Binary,
}

impl RecordFactory {
    pub fn for_payload(payload_type: PayloadType) -> Self {
        match payload_type {
            PayloadType::Text => RecordFactory::Text,
            PayloadType::Json => RecordFactory::Json,
            PayloadType::Binary => RecordFactory::Binary,
        }
    }

    /// `batch_record_index` is the number of records already produced in
    /// the current batch; it seeds the provenance ids of the emitted
    /// records.
    pub fn create_records(
        &self,
        message: &LogMessage,
        batch_record_index: usize,
    ) -> Result<Vec<Record>, RecordConversionError> {
        match self {
            RecordFactory::Text => {
                let text = std::str::from_utf8(&message.payload).map_err(|e| {
                    RecordConversionError::InvalidUtf8 {
                        partition: message.partition,
                        offset: message.offset,
                        reason: e.to_string(),
                    }
                })?;
                Ok(text
                    .lines()
                    .enumerate()
                    .map(|(n, line)| Record {
                        id: record_id(message, batch_record_index + n),
                        value: RecordValue::Text(line.to_string()),
                    })
                    .collect())
            }
            RecordFactory::Json => {
                let value: Value = serde_json::from_slice(&message.payload).map_err(|e| {
                    RecordConversionError::InvalidJson {
                        partition: message.partition,
                        offset: message.offset,
                        reason: e.to_string(),
                    }
                })?;
                let values = match value {
                    Value::Array(items) => items,
                    other => vec![other],
                };
                Ok(values
                    .into_iter()
                    .enumerate()
                    .map(|(n, item)| Record {
                        id: record_id(message, batch_record_index + n),
                        value: RecordValue::Json(item),
                    })
                    .collect())
            }
            RecordFactory::Binary => Ok(vec![Record {
                id: record_id(message, batch_record_index),
                value: RecordValue::Binary(message.payload.clone()),
            }]),
        }
    }
}

fn record_id(message: &LogMessage, n: usize) -> String {
    format!(
        "{}::{}::{}::{}",
        message.topic, message.partition, message.offset, n
    )
}
