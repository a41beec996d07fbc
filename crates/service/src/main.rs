//! Freshcast service - perishable food prediction API
//!
//! Serves expiry, demand, anomaly, freshness and recipe predictions over HTTP
//! together with health, readiness and Prometheus endpoints.

use anyhow::Result;
use engine_lib::{InferenceMonitor, PredictionEngine};
use freshcast_service::{
    api::{self, AppState, SERVICE_VERSION},
    config::ServiceConfig,
    health::{components, HealthRegistry},
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // JSON logs, filtered by RUST_LOG
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting freshcast-service");

    let config = ServiceConfig::load()?;
    info!(
        instance = %config.instance_name,
        port = config.api_port,
        inference_buffer = config.inference_buffer,
        retraining_buffer = config.retraining_buffer,
        image_dir = ?config.image_dir,
        "Service configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::ENGINE).await;
    health_registry.register(components::MONITOR).await;

    let monitor = Arc::new(InferenceMonitor::with_capacity(
        config.inference_buffer,
        config.retraining_buffer,
    ));
    let engine = Arc::new(PredictionEngine::new(&config.instance_name).with_monitor(monitor));
    engine.logger().log_startup(SERVICE_VERSION);

    let app_state = Arc::new(
        AppState::new(engine.clone(), health_registry.clone())
            .with_image_dir(config.image_dir.clone().map(PathBuf::from)),
    );
    health_registry.set_ready(true).await;

    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    tokio::select! {
        result = api_handle => {
            match result {
                Ok(Err(e)) => error!(error = %e, "API server stopped"),
                Err(e) => error!(error = %e, "API server task failed"),
                Ok(Ok(())) => {}
            }
        }
        _ = tokio::signal::ctrl_c() => {
            engine.logger().log_shutdown("SIGINT received");
        }
    }

    info!("Shutting down");
    Ok(())
}
