//! Disk cache retention.
//!
//! The janitor deletes disk entries older than the retention window. It
//! runs shortly after startup, then on a fixed interval, and on demand via
//! [`JanitorHandle::run_now`]. Sweeps are serialized; a sweep never blocks
//! resolves, which may see an entry disappear mid-read and treat it as a miss.
//! Leftover temp files from interrupted writes are removed once they are
//! older than an hour. The memory tier is never touched.

use crate::cache::CacheStore;
use crate::config::JanitorConfig;
use crate::{Result, TtsError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Temp files younger than this may belong to a write in progress.
const STALE_TEMP_AGE_SECS: i64 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JanitorState {
    Idle,
    Scanning,
}

/// Outcome of one sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub started_at: DateTime<Utc>,
    pub scanned: usize,
    pub deleted: usize,
    /// Expired entries that could not be deleted
    pub failed: usize,
    pub freed_bytes: u64,
    /// Orphaned temp files removed
    pub temp_removed: usize,
}

/// True when an entry modified at `modified_at` has outlived `retention`.
/// An age exactly equal to the window is kept.
pub fn is_expired(modified_at: DateTime<Utc>, now: DateTime<Utc>, retention: Duration) -> bool {
    let age = now.signed_duration_since(modified_at);
    match chrono::Duration::from_std(retention) {
        Ok(window) => age > window,
        // Window too large to represent: nothing can be older than it
        Err(_) => false,
    }
}

pub struct CacheJanitor {
    disk: Arc<dyn CacheStore>,
    config: JanitorConfig,
    scanning: AtomicBool,
    sweep_lock: Mutex<()>,
}

impl CacheJanitor {
    pub fn new(disk: Arc<dyn CacheStore>, config: JanitorConfig) -> Self {
        Self {
            disk,
            config,
            scanning: AtomicBool::new(false),
            sweep_lock: Mutex::new(()),
        }
    }

    pub fn state(&self) -> JanitorState {
        if self.scanning.load(Ordering::Acquire) {
            JanitorState::Scanning
        } else {
            JanitorState::Idle
        }
    }

    pub fn config(&self) -> &JanitorConfig {
        &self.config
    }

    pub async fn sweep(&self) -> Result<SweepReport> {
        self.sweep_at(Utc::now()).await
    }

    /// Sweep using `now` as the reference time.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let _guard = self.sweep_lock.lock().await;
        self.scanning.store(true, Ordering::Release);
        let result = self.scan(now).await;
        self.scanning.store(false, Ordering::Release);
        result
    }

    async fn scan(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let retention = self.config.retention();
        let entries = self.disk.list_entries().await?;

        let mut report = SweepReport {
            started_at: now,
            scanned: entries.len(),
            deleted: 0,
            failed: 0,
            freed_bytes: 0,
            temp_removed: 0,
        };

        for entry in entries {
            if !is_expired(entry.modified_at, now, retention) {
                continue;
            }
            match self.disk.delete(&entry.key).await {
                Ok(()) => {
                    debug!(target: "janitor", key = %entry.key, age_secs = entry.age_at(now).num_seconds(), "Deleted expired entry");
                    report.deleted += 1;
                    report.freed_bytes += entry.size_bytes;
                }
                Err(e) => {
                    warn!(target: "janitor", path = ?entry.path, error = %e, "Failed to delete expired entry");
                    report.failed += 1;
                }
            }
        }

        let temp_cutoff = now - chrono::Duration::seconds(STALE_TEMP_AGE_SECS);
        match self.disk.purge_stale_temp(temp_cutoff).await {
            Ok(removed) => report.temp_removed = removed,
            Err(e) => warn!(target: "janitor", error = %e, "Failed to purge stale temp files"),
        }

        info!(
            target: "janitor",
            scanned = report.scanned,
            deleted = report.deleted,
            failed = report.failed,
            freed_bytes = report.freed_bytes,
            temp_removed = report.temp_removed,
            "Cache sweep finished"
        );
        Ok(report)
    }

    /// Run the janitor as a background task: first sweep after the startup
    /// delay, then every interval, plus manual triggers through the handle.
    pub fn spawn(self: Arc<Self>) -> JanitorHandle {
        let (trigger_tx, mut trigger_rx) = mpsc::channel::<oneshot::Sender<Result<SweepReport>>>(8);
        let start = tokio::time::Instant::now() + self.config.startup_delay();
        // interval_at panics on a zero period
        let period = self.config.interval().max(Duration::from_secs(1));
        let janitor = self;

        info!(
            target: "janitor",
            startup_delay_secs = janitor.config.startup_delay_secs,
            interval_secs = janitor.config.interval_secs,
            retention_secs = janitor.config.retention_secs,
            "Starting cache janitor"
        );

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = janitor.sweep().await {
                            error!(target: "janitor", error = %e, "Scheduled sweep failed");
                        }
                    }
                    trigger = trigger_rx.recv() => {
                        let Some(reply) = trigger else {
                            debug!(target: "janitor", "All handles dropped, stopping");
                            break;
                        };
                        let result = janitor.sweep().await;
                        if let Err(e) = &result {
                            error!(target: "janitor", error = %e, "Manual sweep failed");
                        }
                        let _ = reply.send(result);
                    }
                }
            }
        });

        JanitorHandle {
            trigger: trigger_tx,
            task,
        }
    }
}

/// Control handle for a spawned janitor. Dropping it stops the task.
pub struct JanitorHandle {
    trigger: mpsc::Sender<oneshot::Sender<Result<SweepReport>>>,
    task: JoinHandle<()>,
}

impl JanitorHandle {
    /// Run a sweep now and wait for its report. Runs the same algorithm as
    /// the scheduled sweep, serialized with it.
    pub async fn run_now(&self) -> Result<SweepReport> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.trigger
            .send(reply_tx)
            .await
            .map_err(|_| TtsError::Janitor("janitor task is not running".into()))?;
        reply_rx
            .await
            .map_err(|_| TtsError::Janitor("janitor task stopped before replying".into()))?
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop after any in-flight sweep completes.
    pub async fn shutdown(self) {
        let JanitorHandle { trigger, task } = self;
        drop(trigger);
        let _ = task.await;
    }

    /// Stop immediately.
    pub fn abort(&self) {
        self.task.abort();
    }
}
