use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::BufReader;

use reverso_bridge::Bridge;
use reverso_core::telemetry::init_logging;
use reverso_core::{TtsConfig, TtsService};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    // stdout carries the protocol; logs go to stderr
    init_logging("info,reverso_core=info,reverso_bridge=info")
        .map_err(|e| e as Box<dyn std::error::Error>)?;

    let config = TtsConfig::load();
    let out_dir: PathBuf = std::env::var("REVERSO_BRIDGE_OUT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| std::env::temp_dir().join("reverso_tts_out"));

    let service = Arc::new(TtsService::with_reverso(config)?);
    let janitor = service.start_janitor();
    let bridge = Bridge::new(service, out_dir.clone()).with_janitor(janitor);

    tracing::info!(out_dir = ?out_dir, "Reverso bridge reading commands from stdin");

    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();

    let result = tokio::select! {
        res = bridge.run(stdin, stdout) => res,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, shutting down");
            Ok(())
        }
    };

    bridge.shutdown().await;
    result.map_err(|e| e.into())
}
