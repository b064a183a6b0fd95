//! wardend - moderation and engagement workflow daemon.
//!
//! Reads platform events as line-delimited JSON on stdin and emits
//! adapter calls on stdout; all workflow state is persisted under the
//! configured data directory.

use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use wardend::platform::stdio::StdioPlatform;
use wardend::platform::{Event, Platform};
use wardend::{Config, Engine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    info!(
        suggestions = %config.channels.suggestions,
        welcome = %config.channels.welcome,
        data_dir = %config.data_dir.display(),
        "Starting wardend"
    );

    let platform: Arc<dyn Platform> = Arc::new(StdioPlatform::new());
    let engine = Arc::new(Engine::new(config, platform).await?);

    // One task per event: handlers interleave at their await points and
    // rely on per-family serialization inside the workflows.
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Event>(&line) {
            Ok(event) => {
                let engine = Arc::clone(&engine);
                tokio::spawn(async move {
                    engine.handle_event(event).await;
                });
            }
            Err(e) => warn!(error = %e, "Unparsable event line skipped"),
        }
    }

    info!("Event feed closed, shutting down");
    Ok(())
}
