//! ROI Time-Series Server

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use roi_timeseries::earth_engine::{
    EarthEngineClient, EarthEngineConfig, DEFAULT_API_URL, DEFAULT_PROJECT,
};
use roi_timeseries::platform::AnalysisPlatform;
use roi_timeseries::roi::{SessionStore, DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_TTL_MINUTES};
use roi_timeseries::state::AppState;

/// ROI Time-Series Server
#[derive(Parser, Debug)]
#[command(name = "roi-timeseries")]
#[command(about = "Regional time series and period comparison on Earth Engine")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8502", env = "ROI_LISTEN_ADDR")]
    listen: String,

    /// Cloud project used for Earth Engine requests
    #[arg(long, default_value = DEFAULT_PROJECT, env = "EE_PROJECT")]
    ee_project: String,

    /// OAuth access token for Earth Engine
    #[arg(long, env = "EE_ACCESS_TOKEN", hide_env_values = true)]
    ee_access_token: Option<String>,

    /// Earth Engine REST base URL
    #[arg(long, default_value = DEFAULT_API_URL, env = "EE_API_URL")]
    ee_api_url: String,

    /// Minutes of inactivity after which a session is dropped
    #[arg(long, default_value_t = DEFAULT_SESSION_TTL_MINUTES, env = "ROI_SESSION_TTL_MINUTES")]
    session_ttl_minutes: i64,

    /// Maximum number of sessions kept in memory
    #[arg(long, default_value_t = DEFAULT_MAX_SESSIONS, env = "ROI_MAX_SESSIONS")]
    max_sessions: usize,

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

    if args.ee_access_token.is_none() {
        warn!("EE_ACCESS_TOKEN not set, Earth Engine requests will be unauthenticated");
    }

    let platform: Arc<dyn AnalysisPlatform> = Arc::new(EarthEngineClient::new(EarthEngineConfig {
        api_url: args.ee_api_url,
        project: args.ee_project,
        access_token: args.ee_access_token,
    }));
    info!(platform = %platform.name(), "Starting ROI time-series service");

    let sessions = SessionStore::with_limits(
        chrono::Duration::minutes(args.session_ttl_minutes),
        args.max_sessions,
    );
    info!(
        ttl_minutes = args.session_ttl_minutes,
        max_sessions = args.max_sessions,
        "Session limits"
    );
    let state = Arc::new(AppState::with_sessions(platform, sessions));
    let app = roi_timeseries::build_router(state);

    let addr: SocketAddr = args
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address: {}", args.listen))?;
    info!("ROI service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}
