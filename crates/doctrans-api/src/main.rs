//! doctrans-api - HTTP API server for doctrans

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use doctrans_api::{router, AppState};
use doctrans_core::defaults::{
    ENV_OUTPUT_DIR, ENV_UPLOAD_DIR, OUTPUT_DIR, SERVER_HOST, SERVER_PORT, UPLOAD_DIR,
};
use doctrans_core::ConfigStore;
use doctrans_jobs::{CommandCallbackEngine, CommandStreamingEngine, EngineSet, Orchestrator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: "doctrans_api=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "doctrans_api=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    // Optionally create a file appender with daily rotation
    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("doctrans-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(non_blocking);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            } else {
                layer = layer.with_ansi(false); // no ANSI in files
            }
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        // Console-only output
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    // Get configuration from environment
    let host = std::env::var("HOST").unwrap_or_else(|_| SERVER_HOST.to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| SERVER_PORT.to_string())
        .parse()
        .unwrap_or(SERVER_PORT);
    let upload_dir = std::env::var(ENV_UPLOAD_DIR).unwrap_or_else(|_| UPLOAD_DIR.to_string());
    let output_dir = std::env::var(ENV_OUTPUT_DIR).unwrap_or_else(|_| OUTPUT_DIR.to_string());

    std::fs::create_dir_all(&upload_dir)?;
    std::fs::create_dir_all(&output_dir)?;
    info!(
        upload_dir = %upload_dir,
        output_dir = %output_dir,
        "Directories initialized"
    );

    // Load persisted default settings
    let store = ConfigStore::from_env();
    let base = store.load()?;
    info!(config_file = %store.path().display(), "Default settings loaded");

    // Wire the translation engines
    let streaming = CommandStreamingEngine::from_env();
    let callback = CommandCallbackEngine::from_env();
    info!(
        streaming = %streaming.command(),
        callback = %callback.command(),
        "Engines configured"
    );
    let engines = EngineSet::new(Arc::new(streaming), Arc::new(callback));

    // Create the orchestrator and app state
    let orchestrator = Arc::new(Orchestrator::new(
        base, store, engines, upload_dir, output_dir,
    ));
    let state = AppState::new(orchestrator);

    // Build router
    let app = router(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
