//! Clipo API server binary.
//!
//! Wires the record store, media and ML capabilities into the clip pipeline,
//! starts the scheduler and its promoter, and serves the HTTP API.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use clipo_api::{create_router, metrics, ApiConfig, AppState};
use clipo_media::{check_ffmpeg, check_ytdlp, AcquireConfig, Acquirer, FfmpegEncoder, WatermarkConfig};
use clipo_ml_client::{ChatCompletionClient, WhisperClient};
use clipo_queue::{Scheduler, SchedulerConfig};
use clipo_store::{JsonFileStore, RecordStore};
use clipo_worker::pipeline::PipelineDeps;
use clipo_worker::{ClipPipeline, WorkerConfig};

const DEFAULT_LOG_FILTER: &str = "info,clipo=debug,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting clipo-api");

    let config = ApiConfig::from_env();
    let scheduler_config = SchedulerConfig::from_env();
    let worker_config = WorkerConfig::from_env();
    info!(
        host = %config.host,
        port = config.port,
        max_processes = scheduler_config.max_processes,
        render_workers = worker_config.render_workers,
        "Configuration loaded"
    );

    let metrics_enabled = std::env::var("METRICS_ENABLED")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(true);
    let metrics_handle = if metrics_enabled {
        let handle = metrics::init_metrics().context("failed to install metrics recorder")?;
        info!("Prometheus metrics enabled at /metrics");
        Some(handle)
    } else {
        None
    };

    if let Err(e) = check_ffmpeg() {
        warn!("FFmpeg not available, renders will fail: {}", e);
    }
    if let Err(e) = check_ytdlp() {
        warn!("yt-dlp not available, acquisition will fail: {}", e);
    }

    let store: Arc<dyn RecordStore> = Arc::new(
        JsonFileStore::open(config.storage_dir.clone())
            .await
            .context("failed to open record store")?,
    );

    let encoder = Arc::new(
        FfmpegEncoder::new(
            WatermarkConfig::default().with_image_path(worker_config.watermark_path.clone()),
        )
        .with_timeout(worker_config.render_timeout_secs),
    );
    let pipeline = ClipPipeline::new(
        worker_config,
        PipelineDeps {
            store: store.clone(),
            acquirer: Acquirer::with_ytdlp(AcquireConfig::from_env()),
            encoder,
            transcriber: Arc::new(WhisperClient::from_env().context("transcription client")?),
            reasoning: Arc::new(ChatCompletionClient::from_env().context("reasoning client")?),
        },
    );

    let scheduler = Scheduler::new(scheduler_config, Arc::new(pipeline))
        .await
        .context("failed to start scheduler")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let promoter = scheduler.spawn_promoter(shutdown_rx);

    let state = AppState::new(config.clone(), scheduler, store);
    let app = create_router(state, metrics_handle);

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .with_context(|| format!("invalid bind address {}", config.bind_address()))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("Listening on {}", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    let _ = shutdown_tx.send(true);
    if let Err(e) = promoter.await {
        warn!("Promoter task ended abnormally: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}

/// JSON lines when `LOG_FORMAT=json`, coloured text otherwise.
fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
