// Logging setup and resolver counters
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` is used. Output goes
/// to stderr so stdout stays free for the bridge protocol. Calling this twice
/// is harmless: the second call returns an error that callers may ignore.
pub fn init_logging(default_filter: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .try_init()?;

    info!(target: "telemetry", filter = %default_filter, "Logging initialized");
    Ok(())
}

/// Lock-free counters describing how requests were answered.
#[derive(Debug, Default)]
pub struct ResolverMetrics {
    disk_hits: AtomicU64,
    memory_hits: AtomicU64,
    primary_synth: AtomicU64,
    fallback_synth: AtomicU64,
    failures: AtomicU64,
    disk_write_errors: AtomicU64,
}

/// Point-in-time copy of [`ResolverMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverMetricsSnapshot {
    pub disk_hits: u64,
    pub memory_hits: u64,
    pub primary_synth: u64,
    pub fallback_synth: u64,
    pub failures: u64,
    pub disk_write_errors: u64,
}

impl ResolverMetricsSnapshot {
    pub fn total_requests(&self) -> u64 {
        self.disk_hits + self.memory_hits + self.primary_synth + self.fallback_synth + self.failures
    }

    /// Share of requests served without calling the provider.
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            return 0.0;
        }
        (self.disk_hits + self.memory_hits) as f64 / total as f64
    }
}

impl ResolverMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_disk_hit(&self) {
        self.disk_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_memory_hit(&self) {
        self.memory_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_primary(&self) {
        self.primary_synth.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback(&self) {
        self.fallback_synth.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_disk_write_error(&self) {
        self.disk_write_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ResolverMetricsSnapshot {
        ResolverMetricsSnapshot {
            disk_hits: self.disk_hits.load(Ordering::Relaxed),
            memory_hits: self.memory_hits.load(Ordering::Relaxed),
            primary_synth: self.primary_synth.load(Ordering::Relaxed),
            fallback_synth: self.fallback_synth.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            disk_write_errors: self.disk_write_errors.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_and_hit_rate() {
        let metrics = ResolverMetrics::new();
        assert_eq!(metrics.snapshot().hit_rate(), 0.0);

        metrics.record_disk_hit();
        metrics.record_memory_hit();
        metrics.record_primary();
        metrics.record_failure();
        metrics.record_disk_write_error();

        let snap = metrics.snapshot();
        assert_eq!(snap.total_requests(), 4);
        assert_eq!(snap.disk_write_errors, 1);
        assert!((snap.hit_rate() - 0.5).abs() < f64::EPSILON);
    }
}
