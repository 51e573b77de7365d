//! Well Log DT Prediction - Main Entry Point
//!
//! Loads the DT model once at startup and serves the prediction form.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use well_log_dt::{
    config::{AppConfig, LoggingConfig},
    metrics::{MetricsReporter, PredictionMetrics},
    models::{ModelLoader, ModelService},
    web::{create_router, AppState},
};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| AppConfig::DEFAULT_PATH.to_string());
    let config = AppConfig::load_from_path(&config_path)?;

    init_tracing(&config.logging);
    info!(config = %config_path, "Starting Well Log DT Prediction App");

    // Initialize model service, reading the model file exactly once
    let loader = ModelLoader::from_config(&config.model)?;
    info!(
        path = %loader.location().display(),
        strategies = ?loader.strategy_names(),
        "Loading DT model"
    );
    let service = Arc::new(ModelService::eager(loader));
    match service.handle() {
        Some(handle) => info!(
            strategy = handle.strategy(),
            path = %handle.path().display(),
            "Model ready"
        ),
        None => warn!("Model unavailable, the form will show an error until restart"),
    }

    let metrics = Arc::new(PredictionMetrics::new());
    if config.metrics.report_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs);
        tokio::spawn(reporter.start());
    }

    let app = create_router(AppState::new(service, metrics.clone()));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down...");
    metrics.print_summary();

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "well_log_dt={level},tower_http={level}",
            level = logging.level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
