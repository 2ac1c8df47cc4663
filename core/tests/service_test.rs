use async_trait::async_trait;
use reverso_core::{
    Audio, InboundRequest, ResolutionSource, SynthesisError, SynthesisProvider, TtsConfig,
    TtsError, TtsService,
};
use serde_json::json;
use std::sync::Arc;
use tempfile::tempdir;
use tokio::sync::Mutex;

// Provider that records (voice, speed, text) and succeeds unless the voice is listed
struct RecordingProvider {
    calls: Mutex<Vec<(String, f64, String)>>,
    failing: Vec<&'static str>,
}

impl RecordingProvider {
    fn new(failing: Vec<&'static str>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing,
        }
    }
}

#[async_trait]
impl SynthesisProvider for RecordingProvider {
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        speed: f64,
        _format: &str,
    ) -> Result<Audio, SynthesisError> {
        self.calls
            .lock()
            .await
            .push((voice_id.to_string(), speed, text.to_string()));
        if self.failing.contains(&voice_id) {
            return Err(SynthesisError::Rejected {
                status: 429,
                detail: "too many requests".into(),
            });
        }
        Ok(Audio::from(format!("{}:{}", voice_id, text).into_bytes()))
    }
}

fn config(dir: &std::path::Path) -> TtsConfig {
    TtsConfig {
        cache_dir: dir.to_path_buf(),
        language: "it-IT".into(),
        default_voice: "Vittorio22k_NT".into(),
        fallback_voice: "Chiara22k_NT".into(),
        default_speed: 1.0,
        format: "mp3".into(),
        ..TtsConfig::default()
    }
}

#[tokio::test]
async fn test_speak_returns_mp3_and_normalizes_text() {
    let dir = tempdir().unwrap();
    let provider = Arc::new(RecordingProvider::new(vec![]));
    let service = TtsService::new(config(dir.path()), provider.clone()).unwrap();

    let inbound: InboundRequest = serde_json::from_value(json!({
        "message": "\u{201C}Ciao\u{201D}",
        "target": "media_player.cucina",
        "speed": "1,25"
    }))
    .unwrap();
    let outcome = service.speak(&inbound).await.unwrap();

    assert_eq!(outcome.format.as_deref(), Some("mp3"));
    assert_eq!(outcome.audio, Some(Audio::from_static(b"Vittorio22k_NT:\"Ciao\"")));
    assert_eq!(outcome.source, Some(ResolutionSource::Primary));

    let calls = provider.calls.lock().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0], ("Vittorio22k_NT".to_string(), 1.25, "\"Ciao\"".to_string()));
}

#[tokio::test]
async fn test_speak_uses_fallback_voice_from_config() {
    let dir = tempdir().unwrap();
    let provider = Arc::new(RecordingProvider::new(vec!["Vittorio22k_HQ"]));
    let service = TtsService::new(config(dir.path()), provider.clone()).unwrap();

    let outcome = service
        .speak(&InboundRequest::new("Ciao").with_voice("Vittorio22k_HQ"))
        .await
        .unwrap();
    assert_eq!(outcome.source, Some(ResolutionSource::Fallback));
    assert_eq!(outcome.voice_id.as_deref(), Some("Chiara22k_NT"));

    let stats = service.stats().await.unwrap();
    assert_eq!(stats.disk_entries, 0);
    assert_eq!(stats.memory_entries, 0);
    assert_eq!(stats.resolver.fallback_synth, 1);
}

#[tokio::test]
async fn test_speak_without_audio_is_not_an_error() {
    let dir = tempdir().unwrap();
    let provider = Arc::new(RecordingProvider::new(vec!["Vittorio22k_NT", "Chiara22k_NT"]));
    let service = TtsService::new(config(dir.path()), provider).unwrap();

    let outcome = service.speak(&InboundRequest::new("Ciao")).await.unwrap();
    assert!(!outcome.is_available());
    assert!(outcome.format.is_none());
}

#[tokio::test]
async fn test_speak_rejects_empty_message() {
    let dir = tempdir().unwrap();
    let provider = Arc::new(RecordingProvider::new(vec![]));
    let service = TtsService::new(config(dir.path()), provider.clone()).unwrap();

    let result = service.speak(&InboundRequest::new("   ")).await;
    assert!(matches!(result, Err(TtsError::InvalidRequest(_))));
    assert!(provider.calls.lock().await.is_empty());
}

#[tokio::test]
async fn test_stats_and_cleanup_after_speaking() {
    let dir = tempdir().unwrap();
    let provider = Arc::new(RecordingProvider::new(vec![]));
    let service = TtsService::new(config(dir.path()), provider).unwrap();

    for text in ["uno", "due", "tre"] {
        service.speak(&InboundRequest::new(text)).await.unwrap();
    }
    // Cached: no new entries
    service.speak(&InboundRequest::new("uno")).await.unwrap();

    let stats = service.stats().await.unwrap();
    assert_eq!(stats.disk_entries, 3);
    assert_eq!(stats.memory_entries, 3);
    assert_eq!(stats.resolver.primary_synth, 3);
    assert_eq!(stats.resolver.disk_hits, 1);

    // Fresh entries survive cleanup
    let report = service.cleanup_now().await.unwrap();
    assert_eq!(report.scanned, 3);
    assert_eq!(report.deleted, 0);
}

#[tokio::test]
async fn test_language_selects_default_voice() {
    let dir = tempdir().unwrap();
    let provider = Arc::new(RecordingProvider::new(vec![]));
    let service = TtsService::new(config(dir.path()), provider.clone()).unwrap();

    service
        .speak(&InboundRequest::new("Guten Tag").with_language("de-DE"))
        .await
        .unwrap();
    assert_eq!(provider.calls.lock().await[0].0, "Klaus22k_NT");
}

#[tokio::test]
async fn test_configured_language_applies_without_request_language() {
    let dir = tempdir().unwrap();
    let provider = Arc::new(RecordingProvider::new(vec![]));
    let config = TtsConfig {
        language: "en-US".into(),
        ..config(dir.path())
    };
    let service = TtsService::new(config, provider.clone()).unwrap();

    service.speak(&InboundRequest::new("Hello")).await.unwrap();
    service
        .speak(&InboundRequest::new("Bonjour").with_language("fr-FR"))
        .await
        .unwrap();

    let calls = provider.calls.lock().await;
    assert_eq!(calls[0].0, "Ryan22k_NT");
    assert_eq!(calls[1].0, "Bruno22k_NT");
}
