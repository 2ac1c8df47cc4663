//! Speech synthesis providers.
//!
//! `SynthesisProvider` is the seam between the resolver and the network.
//! The resolver never sees HTTP details; it only distinguishes success from
//! the `SynthesisError` classes below.

pub mod reverso;

pub use reverso::ReversoProvider;

use crate::Audio;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Lowest speed the remote endpoint accepts.
pub const MIN_SPEED: f64 = 0.5;
/// Highest speed the remote endpoint accepts.
pub const MAX_SPEED: f64 = 2.0;
/// Speed sent when the requested one is out of range.
pub const NORMALIZED_SPEED: f64 = 1.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SynthesisError {
    #[error("network failure: {0}")]
    Network(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("rejected by remote (status {status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("blocked by anti-automation challenge")]
    Blocked,

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl SynthesisError {
    /// Short class name for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SynthesisError::Network(_) => "network",
            SynthesisError::Timeout(_) => "timeout",
            SynthesisError::Rejected { .. } => "rejected",
            SynthesisError::Blocked => "blocked",
            SynthesisError::Malformed(_) => "malformed",
        }
    }
}

/// Result of checking a speed against the supported range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpeedOutcome {
    InRange(f64),
    /// Out of range or non-finite; `NORMALIZED_SPEED` is sent instead
    Normalized { requested: f64 },
}

impl SpeedOutcome {
    pub fn value(&self) -> f64 {
        match self {
            SpeedOutcome::InRange(v) => *v,
            SpeedOutcome::Normalized { .. } => NORMALIZED_SPEED,
        }
    }
}

pub fn normalize_speed(speed: f64) -> SpeedOutcome {
    if speed.is_finite() && (MIN_SPEED..=MAX_SPEED).contains(&speed) {
        SpeedOutcome::InRange(speed)
    } else {
        SpeedOutcome::Normalized { requested: speed }
    }
}

/// A remote voice synthesis capability.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SynthesisProvider: Send + Sync {
    /// Synthesize `text` with `voice_id`. Implementations normalize `speed`
    /// themselves and must return within a bounded time.
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        speed: f64,
        format: &str,
    ) -> std::result::Result<Audio, SynthesisError>;
}
