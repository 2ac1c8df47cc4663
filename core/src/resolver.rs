//! Request resolution across cache tiers and the synthesis provider.
//!
//! Order per request, each step short-circuiting on success:
//! 1. disk tier (a hit is final; a vanished or unreadable file is a miss)
//! 2. memory tier (not promoted to disk)
//! 3. live synthesis with the requested voice, stored in both tiers
//! 4. one live synthesis with the fallback voice, never cached
//!
//! If both synthesis attempts fail the result is `None`. Concurrent
//! resolves for the same key are not deduplicated; both tiers tolerate
//! repeated writes of the same content.

use crate::cache::{CacheKey, CacheStore, DiskCache, MemoryCache};
use crate::config::TtsConfig;
use crate::provider::{ReversoProvider, SynthesisProvider};
use crate::request::SynthesisRequest;
use crate::telemetry::{ResolverMetrics, ResolverMetricsSnapshot};
use crate::{Audio, TtsError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Where the returned audio came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    Disk,
    Memory,
    /// Fresh synthesis with the requested voice
    Primary,
    /// Fresh synthesis with the fallback voice
    Fallback,
}

impl ResolutionSource {
    pub fn is_cached(&self) -> bool {
        matches!(self, ResolutionSource::Disk | ResolutionSource::Memory)
    }
}

/// Successful resolution with provenance.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Key derived from the request, independent of the voice that spoke
    pub key: CacheKey,
    pub source: ResolutionSource,
    pub audio: Audio,
    /// Voice that produced the audio
    pub voice_id: String,
}

pub struct TtsResolver {
    disk: Arc<dyn CacheStore>,
    memory: Arc<MemoryCache>,
    provider: Arc<dyn SynthesisProvider>,
    metrics: Arc<ResolverMetrics>,
}

impl TtsResolver {
    pub fn new(
        disk: Arc<dyn CacheStore>,
        memory: Arc<MemoryCache>,
        provider: Arc<dyn SynthesisProvider>,
    ) -> Self {
        Self {
            disk,
            memory,
            provider,
            metrics: Arc::new(ResolverMetrics::new()),
        }
    }

    /// Resolver over `config.cache_dir` with a fresh memory tier.
    pub fn from_config(config: &TtsConfig, provider: Arc<dyn SynthesisProvider>) -> Self {
        Self::new(
            Arc::new(DiskCache::new(&config.cache_dir)),
            Arc::new(MemoryCache::new()),
            provider,
        )
    }

    /// Resolver backed by the Reverso HTTP provider.
    pub fn with_reverso(config: &TtsConfig) -> Self {
        let provider = Arc::new(ReversoProvider::with_config(config.provider.clone()));
        Self::from_config(config, provider)
    }

    /// Resolve a request to audio. `None` means speech is unavailable for
    /// now; callers should report it and not retry in a loop.
    pub async fn resolve(&self, request: &SynthesisRequest, fallback_voice: &str) -> Option<Audio> {
        self.resolve_detailed(request, fallback_voice)
            .await
            .map(|r| r.audio)
    }

    pub async fn resolve_detailed(
        &self,
        request: &SynthesisRequest,
        fallback_voice: &str,
    ) -> Option<Resolution> {
        let key = request.cache_key();
        let start = Instant::now();

        if self.disk.exists(&key).await {
            if let Some(audio) = self.read_disk_hit(&key).await {
                self.metrics.record_disk_hit();
                debug!(target: "resolver", key = %key, bytes = audio.len(), "Disk cache hit");
                return Some(Resolution {
                    key,
                    source: ResolutionSource::Disk,
                    audio,
                    voice_id: request.voice_id().to_string(),
                });
            }
        }

        if let Some(audio) = self.memory.get(&key) {
            self.metrics.record_memory_hit();
            debug!(target: "resolver", key = %key, bytes = audio.len(), "Memory cache hit");
            return Some(Resolution {
                key,
                source: ResolutionSource::Memory,
                audio,
                voice_id: request.voice_id().to_string(),
            });
        }

        let primary_err = match self
            .provider
            .synthesize(request.text(), request.voice_id(), request.speed(), request.format())
            .await
        {
            Ok(audio) => {
                self.store(&key, &audio).await;
                self.metrics.record_primary();
                info!(
                    target: "resolver",
                    key = %key,
                    voice = %request.voice_id(),
                    bytes = audio.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Synthesized and cached"
                );
                return Some(Resolution {
                    key,
                    source: ResolutionSource::Primary,
                    audio,
                    voice_id: request.voice_id().to_string(),
                });
            }
            Err(e) => e,
        };

        warn!(
            target: "resolver",
            key = %key,
            voice = %request.voice_id(),
            fallback = %fallback_voice,
            kind = primary_err.kind(),
            error = %primary_err,
            "Primary voice failed, trying fallback"
        );

        match self
            .provider
            .synthesize(request.text(), fallback_voice, request.speed(), request.format())
            .await
        {
            Ok(audio) => {
                self.metrics.record_fallback();
                info!(
                    target: "resolver",
                    key = %key,
                    voice = %fallback_voice,
                    bytes = audio.len(),
                    "Fallback voice succeeded; result not cached"
                );
                Some(Resolution {
                    key,
                    source: ResolutionSource::Fallback,
                    audio,
                    voice_id: fallback_voice.to_string(),
                })
            }
            Err(e) => {
                self.metrics.record_failure();
                error!(
                    target: "resolver",
                    key = %key,
                    voice = %fallback_voice,
                    kind = e.kind(),
                    error = %e,
                    "Fallback voice failed; no audio"
                );
                None
            }
        }
    }

    /// Read an entry that `exists` just reported. The janitor may have
    /// deleted it in between, or it may be unreadable; both count as a miss.
    async fn read_disk_hit(&self, key: &CacheKey) -> Option<Audio> {
        match self.disk.read(key).await {
            Ok(audio) => Some(audio),
            Err(TtsError::NotFound(_)) => {
                debug!(target: "resolver", key = %key, "Disk entry vanished before read");
                None
            }
            Err(e) => {
                warn!(target: "resolver", key = %key, error = %e, "Disk entry unreadable, treating as miss");
                None
            }
        }
    }

    /// Memory first, then disk. A failed disk write leaves the memory entry
    /// in place and does not fail the request.
    async fn store(&self, key: &CacheKey, audio: &Audio) {
        self.memory.put(key.clone(), audio.clone());
        if let Err(e) = self.disk.write(key, audio).await {
            self.metrics.record_disk_write_error();
            warn!(target: "resolver", key = %key, error = %e, "Failed to persist audio to disk");
        }
    }

    pub fn disk(&self) -> &Arc<dyn CacheStore> {
        &self.disk
    }

    pub fn memory(&self) -> &Arc<MemoryCache> {
        &self.memory
    }

    pub fn metrics(&self) -> ResolverMetricsSnapshot {
        self.metrics.snapshot()
    }
}
