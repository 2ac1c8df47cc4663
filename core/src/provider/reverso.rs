/// Reverso voice provider
///
/// POSTs `{text, speed, voiceName, format}` to `<base_url>/<voice_id>` and
/// returns the raw audio body. The endpoint sits behind an anti-bot
/// challenge that answers with an HTML interstitial instead of audio; those
/// responses are reported as `SynthesisError::Blocked`.
use super::{normalize_speed, SpeedOutcome, SynthesisError, SynthesisProvider};
use crate::config::ProviderConfig;
use crate::Audio;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, ORIGIN, REFERER};
use serde::Serialize;
use tracing::{debug, error, warn};

/// Max characters of a rejected body kept in the error.
const ERROR_DETAIL_LIMIT: usize = 300;

const SOFT_BLOCK_MARKERS: &[&str] = &["Just a moment...", "Attention Required! | Cloudflare"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesisPayload<'a> {
    text: &'a str,
    speed: f64,
    voice_name: &'a str,
    format: &'a str,
}

pub struct ReversoProvider {
    config: ProviderConfig,
    http_client: reqwest::Client,
}

impl ReversoProvider {
    pub fn new() -> Self {
        Self::with_config(ProviderConfig::default())
    }

    pub fn with_config(config: ProviderConfig) -> Self {
        let http_client = build_client(&config);
        Self {
            config,
            http_client,
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn endpoint(&self, voice_id: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), voice_id)
    }

    fn map_transport_error(&self, err: reqwest::Error) -> SynthesisError {
        if err.is_timeout() {
            SynthesisError::Timeout(self.config.timeout())
        } else {
            SynthesisError::Network(err.to_string())
        }
    }
}

/// Client with the configured timeout and user agent. A rejected user agent
/// is dropped; the timeout is kept in every case.
fn build_client(config: &ProviderConfig) -> reqwest::Client {
    match reqwest::Client::builder()
        .timeout(config.timeout())
        .user_agent(&config.user_agent)
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            warn!(target: "reverso", error = %e, "HTTP client rejected configuration, retrying without user agent");
            reqwest::Client::builder()
                .timeout(config.timeout())
                .build()
                .unwrap_or_else(|_| reqwest::Client::new())
        }
    }
}

impl Default for ReversoProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SynthesisProvider for ReversoProvider {
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        speed: f64,
        format: &str,
    ) -> std::result::Result<Audio, SynthesisError> {
        let speed = match normalize_speed(speed) {
            SpeedOutcome::InRange(v) => v,
            outcome @ SpeedOutcome::Normalized { requested } => {
                debug!(target: "reverso", requested = %requested, sent = %outcome.value(), "Speed out of range, normalized");
                outcome.value()
            }
        };

        let url = self.endpoint(voice_id);
        let payload = SynthesisPayload {
            text,
            speed,
            voice_name: voice_id,
            format,
        };
        debug!(target: "reverso", voice = %voice_id, chars = text.chars().count(), speed = %speed, "Requesting synthesis");

        let response = self
            .http_client
            .post(&url)
            .timeout(self.config.timeout())
            .header(ACCEPT, "*/*")
            .header(ORIGIN, &self.config.origin)
            .header(REFERER, &self.config.referer)
            .header("apikey", &self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                let err = self.map_transport_error(e);
                warn!(target: "reverso", voice = %voice_id, kind = err.kind(), error = %err, "Synthesis request failed");
                err
            })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(|e| {
            let err = self.map_transport_error(e);
            warn!(target: "reverso", voice = %voice_id, kind = err.kind(), error = %err, "Failed to read synthesis body");
            err
        })?;

        match classify_response(status, content_type.as_deref(), body) {
            Ok(audio) => {
                debug!(target: "reverso", voice = %voice_id, bytes = audio.len(), "Synthesis succeeded");
                Ok(audio)
            }
            Err(SynthesisError::Blocked) => {
                error!(target: "reverso", voice = %voice_id, status = status, "Blocked by anti-bot challenge; back off before retrying");
                Err(SynthesisError::Blocked)
            }
            Err(err) => {
                warn!(target: "reverso", voice = %voice_id, kind = err.kind(), error = %err, "Synthesis rejected");
                Err(err)
            }
        }
    }
}

/// True if `body` looks like an anti-bot interstitial page.
pub fn is_soft_block(body: &[u8]) -> bool {
    let text = String::from_utf8_lossy(body);
    SOFT_BLOCK_MARKERS.iter().any(|m| text.contains(m))
}

/// Decide what a completed HTTP exchange means. The soft-block check runs
/// first because the challenge page can arrive with any status.
pub fn classify_response(
    status: u16,
    content_type: Option<&str>,
    body: Audio,
) -> std::result::Result<Audio, SynthesisError> {
    if is_soft_block(&body) {
        return Err(SynthesisError::Blocked);
    }

    if !(200..300).contains(&status) {
        let detail: String = String::from_utf8_lossy(&body)
            .chars()
            .take(ERROR_DETAIL_LIMIT)
            .collect();
        return Err(SynthesisError::Rejected { status, detail });
    }

    if body.is_empty() {
        return Err(SynthesisError::Malformed("empty body".into()));
    }

    if let Some(ct) = content_type {
        let ct = ct.to_ascii_lowercase();
        if ct.starts_with("text/html") || ct.starts_with("application/json") {
            return Err(SynthesisError::Malformed(format!(
                "unexpected content type {}",
                ct
            )));
        }
    }

    Ok(body)
}
