//! JSON-lines bridge between a host automation and the TTS core.
//!
//! Each input line is one command object tagged by `op`; each command gets
//! exactly one reply line, in order. Malformed lines get an error reply and
//! the loop keeps going. A speak that yields no audio is an error reply too;
//! the host treats it as a failed playback.
//!
//! ```text
//! {"op":"speak","message":"Ciao","voice":"Vittorio22k_HQ","speed":"1,2"}
//! {"op":"cleanup"}
//! {"op":"voices","language":"it-IT"}
//! {"op":"stats"}
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use reverso_core::janitor::JanitorHandle;
use reverso_core::request::InboundRequest;
use reverso_core::voices::{self, SUPPORTED_LANGUAGES};
use reverso_core::{SpeechOutcome, TtsError, TtsService};

#[derive(thiserror::Error, Debug)]
pub enum BridgeError {
    #[error("core error: {0}")]
    Core(#[from] TtsError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("speech generation unavailable")]
    Unavailable,
}

pub type Result<T> = std::result::Result<T, BridgeError>;

/// One command line.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BridgeCommand {
    Speak {
        #[serde(flatten)]
        request: InboundRequest,
        /// Where to write the audio; defaults to `<out_dir>/<key>.<format>`
        #[serde(default)]
        output: Option<PathBuf>,
    },
    Cleanup,
    Voices {
        #[serde(default)]
        language: Option<String>,
    },
    Stats,
}

/// One reply line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeReply {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl BridgeReply {
    pub fn success(data: Value) -> Self {
        Self {
            ok: true,
            error: None,
            data: Some(data),
        }
    }

    pub fn failure(error: impl ToString) -> Self {
        Self {
            ok: false,
            error: Some(error.to_string()),
            data: None,
        }
    }
}

pub struct Bridge {
    service: Arc<TtsService>,
    janitor: Option<JanitorHandle>,
    out_dir: PathBuf,
}

impl Bridge {
    pub fn new(service: Arc<TtsService>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            service,
            janitor: None,
            out_dir: out_dir.into(),
        }
    }

    /// Route `cleanup` through a running janitor so manual and scheduled
    /// sweeps never overlap.
    pub fn with_janitor(mut self, handle: JanitorHandle) -> Self {
        self.janitor = Some(handle);
        self
    }

    pub fn service(&self) -> &Arc<TtsService> {
        &self.service
    }

    /// Handle one raw input line. Never fails; errors become replies.
    pub async fn handle_line(&self, line: &str) -> BridgeReply {
        let command: BridgeCommand = match serde_json::from_str(line) {
            Ok(cmd) => cmd,
            Err(e) => {
                warn!(target: "bridge", error = %e, "Malformed command");
                return BridgeReply::failure(BridgeError::Protocol(e.to_string()));
            }
        };
        match self.dispatch(command).await {
            Ok(data) => BridgeReply::success(data),
            Err(e) => {
                warn!(target: "bridge", error = %e, "Command failed");
                BridgeReply::failure(e)
            }
        }
    }

    pub async fn dispatch(&self, command: BridgeCommand) -> Result<Value> {
        match command {
            BridgeCommand::Speak { request, output } => self.speak(request, output).await,
            BridgeCommand::Cleanup => {
                let report = match &self.janitor {
                    Some(handle) => handle.run_now().await?,
                    None => self.service.cleanup_now().await?,
                };
                Ok(serde_json::to_value(report)?)
            }
            BridgeCommand::Voices { language } => voices_reply(language.as_deref()),
            BridgeCommand::Stats => Ok(serde_json::to_value(self.service.stats().await?)?),
        }
    }

    async fn speak(&self, request: InboundRequest, output: Option<PathBuf>) -> Result<Value> {
        let SpeechOutcome {
            format,
            audio,
            key,
            source,
            voice_id,
        } = self.service.speak(&request).await?;
        let (Some(format), Some(audio)) = (format, audio) else {
            info!(target: "bridge", key = %key, target_id = ?request.target, "No audio produced");
            return Err(BridgeError::Unavailable);
        };

        let path = output.unwrap_or_else(|| self.out_dir.join(format!("{}.{}", key, format)));
        write_audio(&path, &audio).await?;
        debug!(target: "bridge", path = ?path, bytes = audio.len(), "Audio written");

        Ok(json!({
            "format": format,
            "path": path,
            "bytes": audio.len(),
            "key": key,
            "source": source,
            "voice_id": voice_id,
            "target": request.target,
        }))
    }

    /// Serve commands from `reader` until EOF, one reply line per command.
    pub async fn run<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let reply = self.handle_line(line).await;
            let mut encoded = serde_json::to_vec(&reply)?;
            encoded.push(b'\n');
            writer.write_all(&encoded).await?;
            writer.flush().await?;
        }
        info!(target: "bridge", "Input closed");
        Ok(())
    }

    /// Stop the janitor, if one was attached.
    pub async fn shutdown(self) {
        if let Some(handle) = self.janitor {
            handle.shutdown().await;
        }
    }
}

fn voices_reply(language: Option<&str>) -> Result<Value> {
    match language {
        None => Ok(json!({
            "languages": SUPPORTED_LANGUAGES,
            "defaults": voices::LANGUAGE_DEFAULT_VOICE
                .iter()
                .map(|(lang, voice)| (lang.to_string(), Value::from(*voice)))
                .collect::<serde_json::Map<_, _>>(),
        })),
        Some(lang) => {
            let list = voices::voices_for(lang)
                .ok_or_else(|| BridgeError::Protocol(format!("unknown language: {}", lang)))?;
            Ok(json!({
                "language": lang,
                "default": voices::language_default_voice(lang),
                "voices": list,
            }))
        }
    }
}

async fn write_audio(path: &Path, audio: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, audio).await?;
    Ok(())
}
