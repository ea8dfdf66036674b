//! Dashboard Server

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use dashboard::config::{DashboardConfig, SourceMode, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
use dashboard::state::AppState;

/// Dashboard Server
#[derive(Parser, Debug)]
#[command(name = "dashboard")]
#[command(about = "Web dashboard for the Assaba vector layers and rasters")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8501", env = "DASHBOARD_LISTEN_ADDR")]
    listen: String,

    /// Read local files (standalone) or call the data service (client)
    #[arg(long, value_enum, default_value = "standalone", env = "DASHBOARD_MODE")]
    mode: SourceMode,

    /// Data root for standalone mode
    #[arg(long, default_value = ".", env = "DATA_ROOT")]
    data_root: PathBuf,

    /// Data service base URL for client mode
    #[arg(long, default_value = DEFAULT_API_URL, env = "DATA_API_URL")]
    api_url: String,

    /// Timeout in seconds for data service calls
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS, env = "DATA_API_TIMEOUT_SECS")]
    timeout_secs: u64,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    let config = DashboardConfig {
        mode: args.mode,
        data_root: args.data_root,
        api_url: args.api_url,
        timeout: Duration::from_secs(args.timeout_secs),
        ..Default::default()
    };
    let source = config.build_source()?;
    info!(mode = ?config.mode, source = %source.describe(), "Starting dashboard");

    let state = Arc::new(AppState::new(source, config.catalog.clone()));
    let app = dashboard::build_router(state);

    let addr: SocketAddr = args
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address: {}", args.listen))?;
    info!("Dashboard listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}
