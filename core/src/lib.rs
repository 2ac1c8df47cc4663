// Reverso TTS Core Library
// Cached speech synthesis: disk + memory tiers, fallback voice, cache janitor

pub mod cache;
pub mod config;
pub mod janitor;
pub mod provider;
pub mod request;
pub mod resolver;
pub mod service;
pub mod telemetry;
pub mod voices;

// Export core types
pub use cache::{CacheEntry, CacheKey, CacheStore, DiskCache, MemoryCache};
pub use config::{JanitorConfig, ProviderConfig, TtsConfig};
pub use janitor::{CacheJanitor, JanitorHandle, JanitorState, SweepReport};
pub use provider::{ReversoProvider, SpeedOutcome, SynthesisError, SynthesisProvider};
pub use request::{InboundRequest, SpeedParse, SynthesisRequest};
pub use resolver::{Resolution, ResolutionSource, TtsResolver};
pub use service::{ServiceStats, SpeechOutcome, TtsService};
pub use telemetry::{ResolverMetrics, ResolverMetricsSnapshot};

/// Raw encoded audio as returned by the synthesis endpoint.
pub type Audio = bytes::Bytes;

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TtsError {
    #[error("Cache entry not found: {0}")]
    NotFound(String),

    #[error("Synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Janitor error: {0}")]
    Janitor(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
pub type Result<T> = std::result::Result<T, TtsError>;
