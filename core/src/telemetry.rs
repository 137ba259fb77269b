use serde::Serialize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "origin_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Counters for one origin instance, updated across produce/commit cycles.
#[derive(Debug, Default, Clone, Serialize)]
pub struct OriginMetrics {
    pub batches_produced: usize,
    pub records_produced: usize,
    pub empty_batches: usize,
    pub commits: usize,
}
