//! Durable cache tier contract.
//!
//! The resolver and the janitor talk to the disk tier through this trait;
//! `DiskCache` is the production implementation.

use super::{CacheEntry, CacheKey};
use crate::{Audio, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn exists(&self, key: &CacheKey) -> bool;

    /// `TtsError::NotFound` when absent; other failures are I/O errors.
    async fn read(&self, key: &CacheKey) -> Result<Audio>;

    async fn write(&self, key: &CacheKey, audio: &[u8]) -> Result<()>;

    /// Deleting an absent key succeeds.
    async fn delete(&self, key: &CacheKey) -> Result<()>;

    async fn list_entries(&self) -> Result<Vec<CacheEntry>>;

    /// Remove leftovers of interrupted writes last modified before `cutoff`.
    /// Returns how many were removed.
    async fn purge_stale_temp(&self, cutoff: DateTime<Utc>) -> Result<usize>;
}
