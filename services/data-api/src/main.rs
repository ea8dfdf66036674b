//! Data Service
//!
//! HTTP API over the Assaba shapefiles and GeoTIFFs.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use data_api::config::DataApiConfig;
use data_api::state::AppState;

/// Data Service
#[derive(Parser, Debug)]
#[command(name = "data-api")]
#[command(about = "GeoJSON and raster data service for the Assaba region")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8000", env = "DATA_API_LISTEN_ADDR")]
    listen: String,

    /// Directory the dataset paths are resolved against
    #[arg(long, default_value = ".", env = "DATA_ROOT")]
    data_root: PathBuf,

    /// Optional YAML file overriding dataset path templates and years
    #[arg(long, env = "DATA_API_DATASETS")]
    datasets: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Number of worker threads
    #[arg(long, env = "DATA_API_WORKER_THREADS")]
    worker_threads: Option<usize>,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(run_server(args))
}

async fn run_server(args: Args) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    info!("Prometheus metrics exporter initialized");

    info!(data_root = %args.data_root.display(), "Starting data service");

    let config = DataApiConfig::load(args.data_root.clone(), args.datasets.as_deref())?;
    let state = Arc::new(AppState::new(config, Some(prometheus_handle)));
    let app = data_api::build_router(state);

    let addr: SocketAddr = args
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address: {}", args.listen))?;

    info!("Data service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}
