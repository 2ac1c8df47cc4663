//! On-disk audio tier.
//!
//! Layout is a single flat directory of `<hex-key>.mp3` files. Files are
//! written once (temp file + rename) and afterwards only read or deleted.
//! The directory is created lazily on first write or listing.

use super::{CacheKey, CacheStore};
use crate::{Audio, Result, TtsError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;
use tracing::{debug, info, warn};

/// Extension used for every cache file.
pub const AUDIO_EXTENSION: &str = "mp3";

const TEMP_PREFIX: &str = ".reverso-tmp-";

/// One file in the disk tier, as seen by the janitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Age of the entry at `now`. Negative when the mtime lies in the future.
    pub fn age_at(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.modified_at)
    }
}

pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a key is (or would be) stored at.
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.{}", key, AUDIO_EXTENSION))
    }

    /// Create the cache directory if missing. Safe to call concurrently.
    pub async fn ensure_dir(&self) -> Result<()> {
        match fs::create_dir_all(&self.dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists && self.dir.is_dir() => Ok(()),
            Err(e) => {
                warn!(target: "disk_cache", dir = ?self.dir, error = %e, "Failed to create cache directory");
                Err(TtsError::IoError(e))
            }
        }
    }
}

#[async_trait]
impl CacheStore for DiskCache {
    async fn exists(&self, key: &CacheKey) -> bool {
        fs::metadata(self.path_for(key))
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    async fn read(&self, key: &CacheKey) -> Result<Audio> {
        let path = self.path_for(key);
        match fs::read(&path).await {
            Ok(data) => {
                debug!(target: "disk_cache", path = ?path, bytes = data.len(), "Disk cache read");
                Ok(Audio::from(data))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(TtsError::NotFound(key.to_string())),
            Err(e) => Err(TtsError::IoError(e)),
        }
    }

    /// Data goes to a temp file in the cache directory and is renamed into
    /// place, so readers never see a partial file.
    async fn write(&self, key: &CacheKey, audio: &[u8]) -> Result<()> {
        self.ensure_dir().await?;

        let final_path = self.path_for(key);
        let temp_path = self.dir.join(format!(
            "{}{}-{}-{}.tmp",
            TEMP_PREFIX,
            key,
            std::process::id(),
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0)
        ));

        if let Err(e) = fs::write(&temp_path, audio).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(TtsError::IoError(e));
        }
        if let Err(e) = fs::rename(&temp_path, &final_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(TtsError::IoError(e));
        }

        info!(target: "disk_cache", path = ?final_path, bytes = audio.len(), "Stored audio on disk");
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<()> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TtsError::IoError(e)),
        }
    }

    /// Temp files and anything not named like a key are skipped; so are
    /// files that vanish or report no mtime while being listed.
    async fn list_entries(&self) -> Result<Vec<CacheEntry>> {
        let mut dir = match fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(TtsError::IoError(e)),
        };

        let mut entries = Vec::new();
        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            if path.extension().and_then(|e| e.to_str()) != Some(AUDIO_EXTENSION) {
                continue;
            }
            let Some(key) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(CacheKey::parse)
            else {
                continue;
            };

            let metadata = match item.metadata().await {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(e) => {
                    debug!(target: "disk_cache", path = ?path, error = %e, "Entry vanished during listing");
                    continue;
                }
            };
            let modified = match metadata.modified() {
                Ok(t) => t,
                Err(e) => {
                    warn!(target: "disk_cache", path = ?path, error = %e, "No modification time, skipping entry");
                    continue;
                }
            };

            entries.push(CacheEntry {
                key,
                path,
                size_bytes: metadata.len(),
                modified_at: DateTime::<Utc>::from(modified),
            });
        }

        Ok(entries)
    }

    async fn purge_stale_temp(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut dir = match fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(TtsError::IoError(e)),
        };

        let mut removed = 0;
        while let Some(item) = dir.next_entry().await? {
            let is_temp = item
                .file_name()
                .to_str()
                .map(|name| name.starts_with(TEMP_PREFIX))
                .unwrap_or(false);
            if !is_temp {
                continue;
            }
            let path = item.path();
            let modified = match item.metadata().await.and_then(|m| m.modified()) {
                Ok(t) => DateTime::<Utc>::from(t),
                Err(e) => {
                    debug!(target: "disk_cache", path = ?path, error = %e, "Temp file not inspectable");
                    continue;
                }
            };
            if modified >= cutoff {
                continue;
            }
            match fs::remove_file(&path).await {
                Ok(()) => {
                    debug!(target: "disk_cache", path = ?path, "Removed stale temp file");
                    removed += 1;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(target: "disk_cache", path = ?path, error = %e, "Failed to remove stale temp file");
                }
            }
        }

        Ok(removed)
    }
}
