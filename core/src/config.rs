//! Runtime configuration.
//!
//! Defaults come from environment variables; `TtsConfig::load()` overlays an
//! optional TOML file on top of them (path via `REVERSO_TTS_CONFIG` or
//! `./reverso_tts.toml`).
//!
//! Env overrides:
//! - REVERSO_CACHE_DIR, REVERSO_LANGUAGE, REVERSO_DEFAULT_VOICE,
//!   REVERSO_FALLBACK_VOICE, REVERSO_SPEED
//! - REVERSO_BASE_URL, REVERSO_API_KEY, REVERSO_TIMEOUT_MS, REVERSO_USER_AGENT
//! - REVERSO_RETENTION_SECS, REVERSO_JANITOR_INTERVAL_SECS,
//!   REVERSO_JANITOR_STARTUP_DELAY_SECS

use crate::request::{parse_speed_str, DEFAULT_SPEED};
use crate::{Result, TtsError};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_LANGUAGE: &str = "it-IT";
pub const DEFAULT_VOICE: &str = "Vittorio22k_NT";
pub const FALLBACK_VOICE: &str = "Chiara22k_NT";
pub const DEFAULT_FORMAT: &str = "mp3";

pub const DEFAULT_BASE_URL: &str = "https://voice.reverso.net/api/v1/tts";
pub const DEFAULT_API_KEY: &str = "test-api-key-123456";
pub const DEFAULT_ORIGIN: &str = "https://voice.reverso.net";
pub const DEFAULT_REFERER: &str = "https://voice.reverso.net/text-to-speech";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.6099.71 Safari/537.36";
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;

/// 30 days.
pub const DEFAULT_RETENTION_SECS: u64 = 2_592_000;
/// 24 hours.
pub const DEFAULT_JANITOR_INTERVAL_SECS: u64 = 86_400;
pub const DEFAULT_JANITOR_STARTUP_DELAY_SECS: u64 = 60;

/// Top-level configuration handed to the service and resolver.
#[derive(Clone, Debug)]
pub struct TtsConfig {
    pub cache_dir: PathBuf,
    /// Language used when the caller does not name one
    pub language: String,
    /// Voice used when neither the caller nor the language picks one
    pub default_voice: String,
    /// Voice for the single retry after a failed primary synthesis
    pub fallback_voice: String,
    pub default_speed: f64,
    pub format: String,
    pub provider: ProviderConfig,
    pub janitor: JanitorConfig,
}

/// Remote synthesis endpoint settings.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_ms: u64,
    pub user_agent: String,
    pub origin: String,
    pub referer: String,
}

/// Disk cache retention settings.
#[derive(Clone, Debug)]
pub struct JanitorConfig {
    pub retention_secs: u64,
    pub interval_secs: u64,
    pub startup_delay_secs: u64,
}

impl JanitorConfig {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_secs(self.startup_delay_secs)
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: env_string("REVERSO_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            api_key: env_string("REVERSO_API_KEY").unwrap_or_else(|| DEFAULT_API_KEY.into()),
            timeout_ms: env_u64("REVERSO_TIMEOUT_MS", DEFAULT_TIMEOUT_MS),
            user_agent: env_string("REVERSO_USER_AGENT")
                .unwrap_or_else(|| DEFAULT_USER_AGENT.into()),
            origin: DEFAULT_ORIGIN.into(),
            referer: DEFAULT_REFERER.into(),
        }
    }
}

impl Default for JanitorConfig {
    fn default() -> Self {
        Self {
            retention_secs: env_u64("REVERSO_RETENTION_SECS", DEFAULT_RETENTION_SECS),
            interval_secs: env_u64("REVERSO_JANITOR_INTERVAL_SECS", DEFAULT_JANITOR_INTERVAL_SECS),
            startup_delay_secs: env_u64(
                "REVERSO_JANITOR_STARTUP_DELAY_SECS",
                DEFAULT_JANITOR_STARTUP_DELAY_SECS,
            ),
        }
    }
}

impl Default for TtsConfig {
    fn default() -> Self {
        let cache_dir = env_string("REVERSO_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("reverso_tts"));
        let default_speed = env_string("REVERSO_SPEED")
            .map(|s| parse_speed_str(&s).or_default(DEFAULT_SPEED))
            .unwrap_or(DEFAULT_SPEED);

        Self {
            cache_dir,
            language: env_string("REVERSO_LANGUAGE").unwrap_or_else(|| DEFAULT_LANGUAGE.into()),
            default_voice: env_string("REVERSO_DEFAULT_VOICE")
                .unwrap_or_else(|| DEFAULT_VOICE.into()),
            fallback_voice: env_string("REVERSO_FALLBACK_VOICE")
                .unwrap_or_else(|| FALLBACK_VOICE.into()),
            default_speed,
            format: DEFAULT_FORMAT.into(),
            provider: ProviderConfig::default(),
            janitor: JanitorConfig::default(),
        }
    }
}

impl TtsConfig {
    /// Load configuration from a TOML file (path via REVERSO_TTS_CONFIG or
    /// ./reverso_tts.toml), overlaying values onto env-driven defaults.
    pub fn load() -> Self {
        let path =
            std::env::var("REVERSO_TTS_CONFIG").unwrap_or_else(|_| "reverso_tts.toml".into());
        let p = Path::new(&path);
        if !p.exists() {
            tracing::info!(target: "config", path = %path, "No TOML config found; using defaults/env");
            return Self::default();
        }
        match Self::load_from(p) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(target: "config", path = %path, error = %e, "Failed to load TOML; using defaults");
                Self::default()
            }
        }
    }

    /// Load and overlay a specific TOML file. Errors are returned, not swallowed.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }

    /// Overlay a TOML document onto the defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let overlay: TtsToml =
            toml::from_str(raw).map_err(|e| TtsError::Config(format!("invalid TOML: {}", e)))?;
        Ok(overlay.overlay(Self::default()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_voice.trim().is_empty() {
            return Err(TtsError::Config("default_voice must not be empty".into()));
        }
        if self.fallback_voice.trim().is_empty() {
            return Err(TtsError::Config("fallback_voice must not be empty".into()));
        }
        if self.format.trim().is_empty() {
            return Err(TtsError::Config("format must not be empty".into()));
        }
        if self.provider.base_url.trim().is_empty() {
            return Err(TtsError::Config("provider.base_url must not be empty".into()));
        }
        if self.provider.timeout_ms == 0 {
            return Err(TtsError::Config("provider.timeout_ms must be > 0".into()));
        }
        if self.janitor.retention_secs == 0 || self.janitor.interval_secs == 0 {
            return Err(TtsError::Config(
                "janitor retention and interval must be > 0".into(),
            ));
        }
        Ok(())
    }
}

// =========================
// TOML overlay definitions
// =========================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TtsToml {
    pub cache_dir: Option<PathBuf>,
    pub language: Option<String>,
    pub default_voice: Option<String>,
    pub fallback_voice: Option<String>,
    /// Accepts a number or a string such as "1,25"
    pub default_speed: Option<toml::Value>,
    pub format: Option<String>,
    pub provider: Option<ProviderToml>,
    pub janitor: Option<JanitorToml>,
}

impl TtsToml {
    fn overlay(self, mut base: TtsConfig) -> TtsConfig {
        if let Some(x) = self.cache_dir {
            base.cache_dir = x;
        }
        if let Some(x) = self.language {
            base.language = x;
        }
        if let Some(x) = self.default_voice {
            base.default_voice = x;
        }
        if let Some(x) = self.fallback_voice {
            base.fallback_voice = x;
        }
        if let Some(x) = self.default_speed {
            let parsed = match x {
                toml::Value::Float(f) => parse_speed_str(&f.to_string()),
                toml::Value::Integer(i) => parse_speed_str(&i.to_string()),
                toml::Value::String(s) => parse_speed_str(&s),
                other => parse_speed_str(&other.to_string()),
            };
            base.default_speed = parsed.or_default(DEFAULT_SPEED);
        }
        if let Some(x) = self.format {
            base.format = x;
        }
        if let Some(p) = self.provider {
            p.apply(&mut base.provider);
        }
        if let Some(j) = self.janitor {
            j.apply(&mut base.janitor);
        }
        base
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProviderToml {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_ms: Option<u64>,
    pub user_agent: Option<String>,
    pub origin: Option<String>,
    pub referer: Option<String>,
}

impl ProviderToml {
    fn apply(self, p: &mut ProviderConfig) {
        if let Some(x) = self.base_url {
            p.base_url = x;
        }
        if let Some(x) = self.api_key {
            p.api_key = x;
        }
        if let Some(x) = self.timeout_ms {
            p.timeout_ms = x;
        }
        if let Some(x) = self.user_agent {
            p.user_agent = x;
        }
        if let Some(x) = self.origin {
            p.origin = x;
        }
        if let Some(x) = self.referer {
            p.referer = x;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct JanitorToml {
    pub retention_secs: Option<u64>,
    pub interval_secs: Option<u64>,
    pub startup_delay_secs: Option<u64>,
}

impl JanitorToml {
    fn apply(self, j: &mut JanitorConfig) {
        if let Some(x) = self.retention_secs {
            j.retention_secs = x;
        }
        if let Some(x) = self.interval_secs {
            j.interval_secs = x;
        }
        if let Some(x) = self.startup_delay_secs {
            j.startup_delay_secs = x;
        }
    }
}
