//! Layer classification server
//!
//! Serves `/get_columns` and `/classify` on top of a GeoServer instance.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use classify_api::routes::build_router;
use classify_api::state::AppState;
use geoserver_client::GeoServerArgs;

/// Layer classification server
#[derive(Parser, Debug)]
#[command(name = "classify-api")]
#[command(about = "Classifies GeoServer vector layers into colored map classes")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:9091", env = "CLASSIFY_LISTEN_ADDR")]
    listen: String,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Number of worker threads
    #[arg(long, env = "CLASSIFY_WORKER_THREADS")]
    worker_threads: Option<usize>,

    #[command(flatten)]
    geoserver: GeoServerArgs,

    /// Return errors with HTTP 200 instead of a matching status code
    #[arg(long, env = "CLASSIFY_LEGACY_ERROR_STATUS")]
    legacy_error_status: bool,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Build runtime with configured threads
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

    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    classify_api::metrics::describe();

    let config = args
        .geoserver
        .to_config()
        .context("Invalid GeoServer configuration")?;
    info!(
        geoserver = %config.base_url,
        timeout_secs = config.timeout.as_secs(),
        legacy_error_status = args.legacy_error_status,
        "Starting classification server"
    );

    let state = AppState::from_config(config)
        .context("Failed to build GeoServer client")?
        .with_legacy_error_status(args.legacy_error_status);
    let app = build_router(Arc::new(state), prometheus_handle);

    let addr: SocketAddr = args.listen.parse().context("Invalid listen address")?;
    info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}
