use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reverso_core::{
    Audio, CacheEntry, CacheJanitor, CacheKey, CacheStore, DiskCache, JanitorConfig,
    JanitorState, TtsError,
};
use std::io;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::tempdir;

const THIRTY_DAYS: u64 = 2_592_000;

fn config(startup_delay_secs: u64) -> JanitorConfig {
    JanitorConfig {
        retention_secs: THIRTY_DAYS,
        interval_secs: 86_400,
        startup_delay_secs,
    }
}

fn key(text: &str) -> CacheKey {
    CacheKey::derive("Vittorio22k_NT", 1.0, text)
}

// Backdate a cache file's mtime
fn backdate(disk: &DiskCache, key: &CacheKey, age: Duration) {
    let file = std::fs::File::options()
        .write(true)
        .open(disk.path_for(key))
        .unwrap();
    file.set_modified(SystemTime::now() - age).unwrap();
}

// Disk store that refuses to delete one key
struct StubbornStore {
    inner: DiskCache,
    protected: CacheKey,
}

#[async_trait]
impl CacheStore for StubbornStore {
    async fn exists(&self, key: &CacheKey) -> bool {
        self.inner.exists(key).await
    }

    async fn read(&self, key: &CacheKey) -> reverso_core::Result<Audio> {
        self.inner.read(key).await
    }

    async fn write(&self, key: &CacheKey, audio: &[u8]) -> reverso_core::Result<()> {
        self.inner.write(key, audio).await
    }

    async fn delete(&self, key: &CacheKey) -> reverso_core::Result<()> {
        if *key == self.protected {
            return Err(TtsError::IoError(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "read-only entry",
            )));
        }
        self.inner.delete(key).await
    }

    async fn list_entries(&self) -> reverso_core::Result<Vec<CacheEntry>> {
        self.inner.list_entries().await
    }

    async fn purge_stale_temp(&self, cutoff: DateTime<Utc>) -> reverso_core::Result<usize> {
        self.inner.purge_stale_temp(cutoff).await
    }
}

#[tokio::test]
async fn test_retention_boundary() {
    let dir = tempdir().unwrap();
    let disk = Arc::new(DiskCache::new(dir.path()));
    let k = key("confine");
    disk.write(&k, b"audio").await.unwrap();

    let modified_at = disk.list_entries().await.unwrap()[0].modified_at;
    let janitor = CacheJanitor::new(disk.clone(), config(60));

    // Age exactly equal to the window: kept
    let at_window = modified_at + chrono::Duration::seconds(THIRTY_DAYS as i64);
    let report = janitor.sweep_at(at_window).await.unwrap();
    assert_eq!(report.scanned, 1);
    assert_eq!(report.deleted, 0);
    assert!(disk.exists(&k).await);

    // One second past: deleted
    let report = janitor
        .sweep_at(at_window + chrono::Duration::seconds(1))
        .await
        .unwrap();
    assert_eq!(report.deleted, 1);
    assert_eq!(report.freed_bytes, 5);
    assert!(!disk.exists(&k).await);
}

#[tokio::test]
async fn test_sweep_only_removes_expired_entries() {
    let dir = tempdir().unwrap();
    let disk = Arc::new(DiskCache::new(dir.path()));
    for text in ["vecchio", "antico", "nuovo"] {
        disk.write(&key(text), b"audio").await.unwrap();
    }
    backdate(&disk, &key("vecchio"), Duration::from_secs(THIRTY_DAYS + 3600));
    backdate(&disk, &key("antico"), Duration::from_secs(THIRTY_DAYS * 3));
    std::fs::write(dir.path().join("README.txt"), b"not audio").unwrap();

    let janitor = CacheJanitor::new(disk.clone(), config(60));
    let report = janitor.sweep().await.unwrap();

    assert_eq!(report.scanned, 3);
    assert_eq!(report.deleted, 2);
    assert_eq!(report.failed, 0);
    assert!(disk.exists(&key("nuovo")).await);
    assert!(dir.path().join("README.txt").exists());
    assert_eq!(janitor.state(), JanitorState::Idle);
}

#[tokio::test]
async fn test_sweep_on_missing_directory_is_empty() {
    let dir = tempdir().unwrap();
    let disk = Arc::new(DiskCache::new(dir.path().join("mai-creata")));
    let janitor = CacheJanitor::new(disk, config(60));

    let report = janitor.sweep().await.unwrap();
    assert_eq!(report.scanned, 0);
    assert_eq!(report.deleted, 0);
}

#[tokio::test]
async fn test_run_now_through_handle() {
    let dir = tempdir().unwrap();
    let disk = Arc::new(DiskCache::new(dir.path()));
    disk.write(&key("manuale"), b"audio").await.unwrap();
    backdate(&disk, &key("manuale"), Duration::from_secs(THIRTY_DAYS * 2));
    disk.write(&key("recente"), b"audio").await.unwrap();

    // Startup delay far away: only the manual trigger can sweep
    let handle = Arc::new(CacheJanitor::new(disk.clone(), config(3600))).spawn();
    assert!(handle.is_running());

    let report = handle.run_now().await.unwrap();
    assert_eq!(report.scanned, 2);
    assert_eq!(report.deleted, 1);
    assert!(!disk.exists(&key("manuale")).await);

    let again = handle.run_now().await.unwrap();
    assert_eq!(again.scanned, 1);
    assert_eq!(again.deleted, 0);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_scheduled_sweep_runs_after_startup_delay() {
    let dir = tempdir().unwrap();
    let disk = Arc::new(DiskCache::new(dir.path()));
    disk.write(&key("scaduto"), b"audio").await.unwrap();
    backdate(&disk, &key("scaduto"), Duration::from_secs(THIRTY_DAYS + 60));

    let handle = Arc::new(CacheJanitor::new(disk.clone(), config(0))).spawn();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while disk.exists(&key("scaduto")).await {
        assert!(
            tokio::time::Instant::now() < deadline,
            "scheduled sweep did not run"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    handle.shutdown().await;
}

#[tokio::test]
async fn test_run_now_after_abort_fails() {
    let dir = tempdir().unwrap();
    let disk = Arc::new(DiskCache::new(dir.path()));
    let handle = Arc::new(CacheJanitor::new(disk, config(3600))).spawn();

    handle.abort();
    tokio::time::sleep(Duration::from_millis(20)).await;

    match handle.run_now().await {
        Err(TtsError::Janitor(_)) => {}
        other => panic!("expected janitor error, got {:?}", other),
    }
    assert!(!handle.is_running());
}

#[tokio::test]
async fn test_failed_delete_is_counted_and_sweep_continues() {
    let dir = tempdir().unwrap();
    let store = Arc::new(StubbornStore {
        inner: DiskCache::new(dir.path()),
        protected: key("bloccato"),
    });
    for text in ["primo", "bloccato", "ultimo"] {
        store.write(&key(text), b"audio").await.unwrap();
        backdate(&store.inner, &key(text), Duration::from_secs(THIRTY_DAYS * 2));
    }

    let janitor = CacheJanitor::new(store.clone(), config(60));
    let report = janitor.sweep().await.unwrap();

    assert_eq!(report.scanned, 3);
    assert_eq!(report.deleted, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.freed_bytes, 10);
    assert!(store.exists(&key("bloccato")).await);
    assert!(!store.exists(&key("primo")).await);
    assert!(!store.exists(&key("ultimo")).await);
    assert_eq!(janitor.state(), JanitorState::Idle);
}

#[tokio::test]
async fn test_sweep_removes_only_stale_temp_files() {
    let dir = tempdir().unwrap();
    let disk = Arc::new(DiskCache::new(dir.path()));
    disk.write(&key("intatto"), b"audio").await.unwrap();
    let orphan = dir.path().join(".reverso-tmp-orphan.tmp");
    std::fs::write(&orphan, b"half-written").unwrap();

    let janitor = CacheJanitor::new(disk.clone(), config(60));

    // A fresh temp file may belong to a write in progress
    let report = janitor.sweep().await.unwrap();
    assert_eq!(report.temp_removed, 0);
    assert!(orphan.exists());

    let report = janitor
        .sweep_at(Utc::now() + chrono::Duration::hours(2))
        .await
        .unwrap();
    assert_eq!(report.temp_removed, 1);
    assert_eq!(report.scanned, 1);
    assert_eq!(report.deleted, 0);
    assert!(!orphan.exists());
    assert!(disk.exists(&key("intatto")).await);
}
