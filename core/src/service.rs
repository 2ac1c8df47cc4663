/// TTS service facade
///
/// Ties configuration, the resolver and the janitor together behind the
/// calls an integration needs: speak an inbound request, run cleanup, report
/// stats. All configuration is passed in explicitly.
use crate::cache::{CacheKey, CacheStore};
use crate::config::TtsConfig;
use crate::janitor::{CacheJanitor, JanitorHandle, SweepReport};
use crate::provider::{ReversoProvider, SynthesisProvider};
use crate::request::{parse_speed, InboundRequest, SpeedParse, SynthesisRequest};
use crate::resolver::{ResolutionSource, TtsResolver};
use crate::telemetry::ResolverMetricsSnapshot;
use crate::voices::resolve_voice_id;
use crate::{Audio, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a speak call. `audio` is `None` when speech is unavailable,
/// which callers report as a non-fatal playback failure.
#[derive(Debug, Clone)]
pub struct SpeechOutcome {
    pub format: Option<String>,
    pub audio: Option<Audio>,
    pub key: CacheKey,
    pub source: Option<ResolutionSource>,
    /// Voice that produced the audio, if any
    pub voice_id: Option<String>,
}

impl SpeechOutcome {
    pub fn is_available(&self) -> bool {
        self.audio.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStats {
    pub memory_entries: usize,
    pub disk_entries: usize,
    pub disk_bytes: u64,
    pub resolver: ResolverMetricsSnapshot,
}

pub struct TtsService {
    config: TtsConfig,
    resolver: Arc<TtsResolver>,
    janitor: Arc<CacheJanitor>,
}

impl TtsService {
    pub fn new(config: TtsConfig, provider: Arc<dyn SynthesisProvider>) -> Result<Self> {
        config.validate()?;
        let resolver = Arc::new(TtsResolver::from_config(&config, provider));
        let janitor = Arc::new(CacheJanitor::new(
            Arc::clone(resolver.disk()),
            config.janitor.clone(),
        ));

        info!(
            target: "tts_service",
            cache_dir = ?config.cache_dir,
            default_voice = %config.default_voice,
            fallback_voice = %config.fallback_voice,
            "TTS service ready"
        );

        Ok(Self {
            config,
            resolver,
            janitor,
        })
    }

    /// Service backed by the Reverso HTTP provider.
    pub fn with_reverso(config: TtsConfig) -> Result<Self> {
        let provider = Arc::new(ReversoProvider::with_config(config.provider.clone()));
        Self::new(config, provider)
    }

    /// Normalize an inbound request: pick the voice, parse the speed, and
    /// fix up the text.
    pub fn build_request(&self, inbound: &InboundRequest) -> Result<SynthesisRequest> {
        // Configured language applies when the request names none
        let language = inbound
            .language
            .as_deref()
            .or(Some(self.config.language.as_str()));
        let voice = resolve_voice_id(
            language,
            inbound.voice_id.as_deref(),
            &self.config.default_voice,
        );

        let speed = match parse_speed(inbound.speed.as_ref()) {
            SpeedParse::Parsed(v) => v,
            SpeedParse::Missing => self.config.default_speed,
            SpeedParse::Invalid(raw) => {
                warn!(target: "tts_service", raw = %raw, fallback = %self.config.default_speed, "Unparseable speed, using default");
                self.config.default_speed
            }
        };

        SynthesisRequest::with_format(&inbound.message, &voice, speed, &self.config.format)
    }

    /// Produce audio for an inbound request. Errors only for requests that
    /// cannot be built (empty message); synthesis failure yields no audio.
    pub async fn speak(&self, inbound: &InboundRequest) -> Result<SpeechOutcome> {
        let request = self.build_request(inbound)?;
        debug!(
            target: "tts_service",
            voice = %request.voice_id(),
            speed = %request.speed(),
            target_id = ?inbound.target,
            "Speak request"
        );

        let key = request.cache_key();
        let outcome = match self
            .resolver
            .resolve_detailed(&request, &self.config.fallback_voice)
            .await
        {
            Some(resolution) => SpeechOutcome {
                format: Some(request.format().to_string()),
                audio: Some(resolution.audio),
                key: resolution.key,
                source: Some(resolution.source),
                voice_id: Some(resolution.voice_id),
            },
            None => {
                warn!(target: "tts_service", key = %key, "Speech unavailable");
                SpeechOutcome {
                    format: None,
                    audio: None,
                    key,
                    source: None,
                    voice_id: None,
                }
            }
        };
        Ok(outcome)
    }

    /// Spawn the background janitor for this service's disk tier.
    pub fn start_janitor(&self) -> JanitorHandle {
        Arc::clone(&self.janitor).spawn()
    }

    /// Sweep inline, without a spawned janitor.
    pub async fn cleanup_now(&self) -> Result<SweepReport> {
        self.janitor.sweep().await
    }

    pub async fn stats(&self) -> Result<ServiceStats> {
        let entries = self.resolver.disk().list_entries().await?;
        Ok(ServiceStats {
            memory_entries: self.resolver.memory().len(),
            disk_entries: entries.len(),
            disk_bytes: entries.iter().map(|e| e.size_bytes).sum(),
            resolver: self.resolver.metrics(),
        })
    }

    pub fn config(&self) -> &TtsConfig {
        &self.config
    }

    pub fn resolver(&self) -> &Arc<TtsResolver> {
        &self.resolver
    }

    pub fn janitor(&self) -> &Arc<CacheJanitor> {
        &self.janitor
    }
}
