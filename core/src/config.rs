use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::ConfigError;

/// Wait bound forced onto every batch when the pipeline runs in preview
/// mode, so interactive runs always get feedback within a second.
pub const PREVIEW_MAX_WAIT_MS: u64 = 1000;

/// Execution mode of the enclosing pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    Standard,
    Preview,
}

/// Shape of the message payload, selects the record factory variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadType {
    /// Line-delimited UTF-8 text, one record per line.
    Text,
    /// One JSON value per message; a top-level array expands into one
    /// record per element.
    Json,
    /// Opaque bytes, one record per message.
    Binary,
}

/// Connection and tuning parameters for one consumer instance. Set once at
/// initialization and never mutated afterward; the preview wait override is
/// applied by [`ConsumerConfig::effective_for`] before the consumer is
/// constructed.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConsumerConfig {
    /// Broker address list, comma separated.
    pub bootstrap_servers: String,
    pub topic: String,
    pub consumer_group: String,
    pub payload_type: PayloadType,
    /// Maximum number of records collected into one batch.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    /// Maximum time to wait to fill a batch, in milliseconds.
    #[serde(default = "default_max_wait_ms")]
    pub max_wait_ms: u64,
    pub auto_offset_reset: Option<String>,
    pub session_timeout_ms: Option<u32>,
    /// Additional properties passed through opaquely to the broker client.
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

fn default_max_batch_size() -> usize {
    1000
}

fn default_max_wait_ms() -> u64 {
    1000
}

impl ConsumerConfig {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let content = std::env::var("ORIGIN_CONFIG").map_err(|_| ConfigError::LoadFailed {
            path: "ORIGIN_CONFIG".to_string(),
            reason: "environment variable not set".to_string(),
        })?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
            path: "ORIGIN_CONFIG".to_string(),
            reason: e.to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bootstrap_servers.is_empty() {
            return Err(ConfigError::Invalid {
                message: "bootstrap servers cannot be empty".to_string(),
            });
        }
        if self.topic.is_empty() {
            return Err(ConfigError::Invalid {
                message: "topic cannot be empty".to_string(),
            });
        }
        if self.consumer_group.is_empty() {
            return Err(ConfigError::Invalid {
                message: "consumer group cannot be empty".to_string(),
            });
        }
        if self.max_batch_size == 0 {
            return Err(ConfigError::Invalid {
                message: "max batch size must be greater than zero".to_string(),
            });
        }
        if self.max_wait_ms == 0 {
            return Err(ConfigError::Invalid {
                message: "max wait time must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Returns the config as it must be used for the given execution mode.
    /// Preview runs get a fixed one second wait bound regardless of the
    /// configured value.
    pub fn effective_for(mut self, mode: ExecutionMode) -> Self {
        if mode == ExecutionMode::Preview {
            self.max_wait_ms = PREVIEW_MAX_WAIT_MS;
        }
        self
    }
}
