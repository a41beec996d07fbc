//! HTTP API for predictions, health checks and metrics

use crate::health::{components, ComponentStatus, HealthRegistry};
use crate::validation::{self, ValidationError};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use engine_lib::{
    AnomalyDetectionRequest, AnomalyReport, BatchExpiryRequest, BatchExpiryResult,
    ClassificationResult, DemandForecastRequest, EngineError, ExpiryRequest, ExpiryResult,
    ForecastResult, ImageClassificationRequest, ImageSource, ModelStatus, PredictionEngine,
    RecipeRequest, RecipeSuggestions,
};
use prometheus::{Encoder, TextEncoder};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{error, info, warn};

pub const SERVICE_NAME: &str = "Freshcast prediction service";
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<PredictionEngine>,
    pub health_registry: HealthRegistry,
    /// Directory `file_path` images are resolved against; unset disables them
    pub image_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(engine: Arc<PredictionEngine>, health_registry: HealthRegistry) -> Self {
        Self {
            engine,
            health_registry,
            image_dir: None,
        }
    }

    pub fn with_image_dir(mut self, image_dir: Option<PathBuf>) -> Self {
        self.image_dir = image_dir;
        self
    }

    /// Fold engine-side faults into the health registry
    pub async fn refresh_health(&self) {
        let faults = self.engine.monitor_faults();
        if faults > 0 {
            self.health_registry
                .set_degraded(
                    components::MONITOR,
                    format!("{} monitoring events could not be recorded", faults),
                )
                .await;
        }
    }
}

/// Errors returned by handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("prediction task failed: {0}")]
    Task(#[from] JoinError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Validation(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": e.to_string(), "field": e.field }),
            ),
            ApiError::Engine(_) | ApiError::Task(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": self.to_string() }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

async fn root() -> Json<Value> {
    Json(json!({
        "service": SERVICE_NAME,
        "status": "healthy",
        "version": SERVICE_VERSION,
        "timestamp": Utc::now(),
    }))
}

/// Returns 200 if healthy or degraded, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.refresh_health().await;
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.refresh_health().await;
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// JSON snapshot of the inference monitor
async fn monitoring_metrics(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "timestamp": Utc::now(),
        "metrics": state.engine.metrics(),
    }))
}

async fn predict_expiry(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExpiryRequest>,
) -> ApiResult<ExpiryResult> {
    validation::validate_expiry(&request, Utc::now().date_naive())?;
    info!(product = %request.product_name, "Generating expiry prediction");
    Ok(Json(state.engine.predict_expiry(&request)))
}

async fn predict_expiry_batch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BatchExpiryRequest>,
) -> ApiResult<BatchExpiryResult> {
    validation::validate_batch(&request, Utc::now().date_naive())?;
    Ok(Json(state.engine.predict_expiry_batch(&request)))
}

/// Decoding and resizing run on the blocking pool
async fn classify_image(
    State(state): State<Arc<AppState>>,
    Json(mut request): Json<ImageClassificationRequest>,
) -> ApiResult<ClassificationResult> {
    validation::validate_image(&request, state.image_dir.as_deref())?;
    if request.image_type == ImageSource::FilePath {
        if let Some(dir) = &state.image_dir {
            request.image_data = dir.join(&request.image_data).to_string_lossy().into_owned();
        }
    }

    let engine = state.engine.clone();
    let result = tokio::task::spawn_blocking(move || engine.classify_image(&request)).await?;
    Ok(Json(result))
}

async fn suggest_recipes(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RecipeRequest>,
) -> ApiResult<RecipeSuggestions> {
    validation::validate_recipes(&request)?;
    Ok(Json(state.engine.suggest_recipes(&request)))
}

async fn forecast_demand(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DemandForecastRequest>,
) -> ApiResult<ForecastResult> {
    validation::validate_forecast(&request)?;
    info!(item = %request.item_name, horizon = request.horizon_days, "Generating demand forecast");
    Ok(Json(state.engine.forecast_demand(&request)?))
}

async fn detect_anomalies(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnomalyDetectionRequest>,
) -> ApiResult<AnomalyReport> {
    validation::validate_anomaly(&request)?;
    info!(metric = %request.metric_name, "Running anomaly detection");
    Ok(Json(state.engine.detect_anomalies(&request)?))
}

async fn models_status(State(state): State<Arc<AppState>>) -> Json<ModelStatus> {
    Json(state.engine.model_status())
}

#[derive(Debug, Default, Deserialize)]
pub struct RetrainRequest {
    #[serde(default)]
    pub initiated_by: Option<String>,
}

/// Starts retraining in the background and returns immediately
///
/// A failed run degrades the engine component until a later run succeeds.
async fn models_retrain(
    State(state): State<Arc<AppState>>,
    body: Option<Json<RetrainRequest>>,
) -> impl IntoResponse {
    let initiated_by = body.and_then(|Json(r)| r.initiated_by);
    let engine = state.engine.clone();
    let health = state.health_registry.clone();

    tokio::spawn(async move {
        let outcome =
            tokio::task::spawn_blocking(move || engine.retrain(initiated_by.as_deref())).await;
        match outcome {
            Ok(Ok(())) => health.register(components::ENGINE).await,
            Ok(Err(e)) => {
                warn!(error = %e, "Model retraining failed");
                health
                    .set_degraded(components::ENGINE, format!("Model retraining failed: {}", e))
                    .await;
            }
            Err(e) => {
                error!(error = %e, "Model retraining task panicked");
                health
                    .set_unhealthy(components::ENGINE, "Model retraining task panicked")
                    .await;
            }
        }
    });

    (
        StatusCode::ACCEPTED,
        Json(json!({
            "message": "Model retraining started",
            "timestamp": Utc::now(),
        })),
    )
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/monitoring/metrics", get(monitoring_metrics))
        .route("/predict-expiry", post(predict_expiry))
        .route("/predict-expiry/batch", post(predict_expiry_batch))
        .route("/classify-image", post(classify_image))
        .route("/suggest-recipes", post(suggest_recipes))
        .route("/forecast-demand", post(forecast_demand))
        .route("/detect-anomalies", post(detect_anomalies))
        .route("/models/status", get(models_status))
        .route("/models/retrain", post(models_retrain))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
