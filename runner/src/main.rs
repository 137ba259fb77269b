use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use origin_core::config::{ConsumerConfig, ExecutionMode};
use origin_core::origin::KafkaOrigin;
use origin_core::records::Record;
use origin_core::telemetry::init_tracing;

/// Stand-in for the pipeline runtime: drives init -> produce -> deliver ->
/// commit cycles against a Kafka origin until a shutdown signal arrives,
/// then destroys the consumer. Delivery writes records as JSON lines on
/// stdout, one per record.
///
/// Config comes from a YAML file given as the first argument, or from the
/// ORIGIN_CONFIG environment variable. PREVIEW=true selects preview mode.
#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = match std::env::args().nth(1) {
        Some(path) => ConsumerConfig::from_file(&path),
        None => ConsumerConfig::from_env(),
    }
    .context("Failed to load configuration")?;

    let mode = if std::env::var("PREVIEW").map(|v| v == "true").unwrap_or(false) {
        ExecutionMode::Preview
    } else {
        ExecutionMode::Standard
    };

    let max_batch_size = config.max_batch_size;
    let mut origin = KafkaOrigin::from_config(config, mode)?;
    origin.init().await?;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received, finishing the current batch");
                shutdown.store(true, Ordering::SeqCst);
            }
        });
    }

    // The in-flight batch always completes; shutdown is only observed
    // between cycles, so nothing is cancelled mid-call.
    let mut offset_token: Option<String> = None;
    while !shutdown.load(Ordering::SeqCst) {
        let mut batch: Vec<Record> = Vec::new();
        match origin.produce(offset_token.take(), max_batch_size, &mut batch).await {
            Ok(token) => {
                offset_token = token;
                deliver(&batch)?;
                if let Err(e) = origin.commit(offset_token.as_deref()).await {
                    warn!(
                        "Commit failed, messages will be re-delivered after the next \
                         successful commit: {e}"
                    );
                }
            }
            Err(e) if e.is_fatal() => {
                error!("Fatal error, stopping: {e}");
                origin.destroy().await;
                return Err(e.into());
            }
            Err(e) => {
                warn!("Batch failed: {e}");
            }
        }
    }

    origin.destroy().await;
    info!(
        "Final metrics: {}",
        serde_json::to_string(origin.metrics()).unwrap_or_default()
    );
    Ok(())
}

fn deliver(batch: &[Record]) -> Result<()> {
    for record in batch {
        let line = serde_json::to_string(record).context("Failed to serialize record")?;
        println!("{line}");
    }
    Ok(())
}
