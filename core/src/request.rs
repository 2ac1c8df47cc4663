//! Request types and input normalization.
//!
//! `InboundRequest` is what an external caller sends; `SynthesisRequest` is
//! the immutable, normalized form the resolver works with.

use crate::cache::CacheKey;
use crate::config::DEFAULT_FORMAT;
use crate::{Result, TtsError};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SPEED: f64 = 1.0;

/// Request as received from the caller. Only `message` is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboundRequest {
    pub message: String,
    /// Playback target; opaque to the core and passed through untouched
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default, alias = "voice")]
    pub voice_id: Option<String>,
    /// Number or string; see [`parse_speed`]
    #[serde(default)]
    pub speed: Option<serde_json::Value>,
    #[serde(default)]
    pub language: Option<String>,
}

impl InboundRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_voice(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = Some(voice_id.into());
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(serde_json::json!(speed));
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// Normalized synthesis request. Fields are fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    text: String,
    voice_id: String,
    speed: f64,
    format: String,
}

impl SynthesisRequest {
    /// Build a request with the default `mp3` format. Typographic quotes in
    /// `text` are normalized; empty text or voice is rejected.
    pub fn new(text: &str, voice_id: &str, speed: f64) -> Result<Self> {
        Self::with_format(text, voice_id, speed, DEFAULT_FORMAT)
    }

    pub fn with_format(text: &str, voice_id: &str, speed: f64, format: &str) -> Result<Self> {
        let text = normalize_quotes(text);
        if text.trim().is_empty() {
            return Err(TtsError::InvalidRequest("message must not be empty".into()));
        }
        if voice_id.trim().is_empty() {
            return Err(TtsError::InvalidRequest("voice id must not be empty".into()));
        }
        Ok(Self {
            text,
            voice_id: voice_id.trim().to_string(),
            speed,
            format: format.to_string(),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn voice_id(&self) -> &str {
        &self.voice_id
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::derive(&self.voice_id, self.speed, &self.text)
    }
}

/// Replace typographic quotes with their ASCII counterparts.
pub fn normalize_quotes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2018}' | '\u{2019}' => '\'',
            other => other,
        })
        .collect()
}

/// Outcome of reading a caller-supplied speed.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeedParse {
    /// Absent, null or blank
    Missing,
    Parsed(f64),
    /// Present but not a finite number; holds the raw value for logging
    Invalid(String),
}

impl SpeedParse {
    pub fn or_default(&self, default: f64) -> f64 {
        match self {
            SpeedParse::Parsed(v) => *v,
            SpeedParse::Missing | SpeedParse::Invalid(_) => default,
        }
    }
}

/// Parse a speed given as a JSON number or string. Strings may use a comma
/// as decimal separator (`"1,25"`).
pub fn parse_speed(raw: Option<&serde_json::Value>) -> SpeedParse {
    match raw {
        None | Some(serde_json::Value::Null) => SpeedParse::Missing,
        Some(serde_json::Value::Number(n)) => match n.as_f64() {
            Some(v) if v.is_finite() => SpeedParse::Parsed(v),
            _ => SpeedParse::Invalid(n.to_string()),
        },
        Some(serde_json::Value::String(s)) => parse_speed_str(s),
        Some(other) => SpeedParse::Invalid(other.to_string()),
    }
}

pub fn parse_speed_str(raw: &str) -> SpeedParse {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return SpeedParse::Missing;
    }
    match trimmed.replace(',', ".").parse::<f64>() {
        Ok(v) if v.is_finite() => SpeedParse::Parsed(v),
        _ => SpeedParse::Invalid(raw.to_string()),
    }
}
