//! In-memory audio tier.
//!
//! Unbounded and never evicted; entries live as long as the process. Uses
//! DashMap for concurrent access. Racing writers for one key store the same
//! audio, so last-writer-wins is harmless.

use super::CacheKey;
use crate::Audio;
use dashmap::DashMap;
use tracing::trace;

#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<CacheKey, Audio>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<Audio> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn put(&self, key: CacheKey, audio: Audio) {
        trace!(target: "memory_cache", key = %key, bytes = audio.len(), "Storing audio in memory");
        self.entries.insert(key, audio);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
