// Daemon bootstrap: config resolution, wiring, HTTP serving, shutdown.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::batch::BatchCoordinator;
use crate::convert::CommandConverter;
use crate::models::ConverterConfig;
use crate::patterns::PatternExpander;
use crate::pool::WorkerPool;
use crate::server::{self, AppState};
use crate::store::JobStatusStore;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the ConverterConfig using the resolution order:
///   1. --config CLI flag (passed as config_path)
///   2. MBC_CONFIG_DIR environment variable
///   3. Platform config dir (dirs::config_dir()/markdown-batch-converter/config.json)
///   4. If no config file exists, use ConverterConfig::default()
pub fn load_config(config_path: Option<&Path>) -> Result<ConverterConfig> {
    // 1. Explicit config path
    if let Some(path) = config_path {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            let config: ConverterConfig =
                serde_json::from_str(&content).context("Failed to parse config file")?;
            tracing::info!("Loaded config from: {}", path.display());
            return Ok(config);
        }
        return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
    }

    // 2. MBC_CONFIG_DIR env var
    if let Ok(config_dir) = std::env::var("MBC_CONFIG_DIR") {
        let path = PathBuf::from(&config_dir).join("config.json");
        if path.exists() {
            let content = std::fs::read_to_string(&path)
                .context("Failed to read config from MBC_CONFIG_DIR")?;
            let config: ConverterConfig = serde_json::from_str(&content)
                .context("Failed to parse config from MBC_CONFIG_DIR")?;
            tracing::info!("Loaded config from MBC_CONFIG_DIR: {}", path.display());
            return Ok(config);
        }
    }

    // 3. Platform config dir
    if let Some(config_dir) = dirs::config_dir() {
        let path = config_dir.join("markdown-batch-converter").join("config.json");
        if path.exists() {
            let content = std::fs::read_to_string(&path)
                .context("Failed to read config from platform config dir")?;
            let config: ConverterConfig = serde_json::from_str(&content)
                .context("Failed to parse config from platform config dir")?;
            tracing::info!("Loaded config from: {}", path.display());
            return Ok(config);
        }
    }

    // 4. Use defaults
    tracing::info!("No config file found, using defaults");
    Ok(ConverterConfig::default())
}

// ---------------------------------------------------------------------------
// Daemon bootstrap
// ---------------------------------------------------------------------------

/// Build the application state: status store, worker pool running the
/// external converter command, and batch coordinator.
///
/// Store and pool are created exactly once here and live for the process
/// lifetime; every boundary (HTTP handlers, health) receives them through
/// this state rather than ambient globals.
pub fn build_state(config: Arc<ConverterConfig>) -> Arc<AppState> {
    let store = Arc::new(JobStatusStore::new());
    let converter = Arc::new(CommandConverter::new(
        &config.converter_cmd,
        &config.output_extension,
    ));
    let pool = WorkerPool::start(
        config.worker_count(),
        Arc::clone(&store),
        converter,
        Duration::from_secs(config.timeout_secs),
    );
    let coordinator = BatchCoordinator::new(
        PatternExpander::new(&config.extensions),
        Arc::clone(&store),
        pool,
    );

    Arc::new(AppState {
        coordinator,
        store,
        config,
        start_time: Instant::now(),
    })
}

/// Start the conversion daemon: load config, wire the components, serve the
/// HTTP API until Ctrl+C or SIGTERM.
pub async fn start_daemon(
    config_path: Option<&Path>,
    host_override: Option<&str>,
    port_override: Option<u16>,
    workers_override: Option<usize>,
    timeout_override: Option<u64>,
) -> Result<()> {
    let mut config = load_config(config_path)?;

    if let Some(h) = host_override {
        config.host = h.to_string();
    }
    if let Some(p) = port_override {
        config.port = p;
    }
    if let Some(w) = workers_override {
        config.workers = w;
    }
    if let Some(t) = timeout_override {
        config.timeout_secs = t;
    }

    let config = Arc::new(config);
    let state = build_state(Arc::clone(&config));
    let router = server::create_router(state);

    let bind_addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .context(format!("Failed to bind to {}", bind_addr))?;

    tracing::info!("Markdown batch converter listening on http://{}", bind_addr);
    tracing::info!(
        "Workers: {} ({} CPU cores available)",
        config.worker_count(),
        num_cpus::get()
    );
    tracing::info!("Converter command: {}", config.converter_cmd);
    tracing::info!("Supported extensions: {}", config.extensions.join(", "));
    tracing::info!("Per-job timeout: {}s", config.timeout_secs);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("Daemon exited cleanly.");
    Ok(())
}

/// Resolve when Ctrl+C (all platforms) or SIGTERM (Unix) arrives.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            Ok(signal) => signal,
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C signal");
            }
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM signal");
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Received Ctrl+C signal");
    }
}
