//! Integration tests for the service API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use engine_lib::{
    EngineError, InferenceMonitor, InferenceStatus, Metadata, MetricsSnapshot, ModelTrainer,
    MonitorError, MonitorSink, PredictionEngine, RetrainingStatus,
};
use freshcast_service::{
    create_router,
    health::{components, HealthRegistry},
    AppState,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde_json::{json, Value};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

async fn setup_test_app() -> (Router, Arc<AppState>) {
    let engine = PredictionEngine::new("api-test").with_monitor(Arc::new(InferenceMonitor::new()));
    app_with(engine, None).await
}

async fn app_with(engine: PredictionEngine, image_dir: Option<PathBuf>) -> (Router, Arc<AppState>) {
    let health_registry = HealthRegistry::new();
    health_registry.register(components::ENGINE).await;
    health_registry.register(components::MONITOR).await;

    let state = Arc::new(AppState::new(Arc::new(engine), health_registry).with_image_dir(image_dir));
    let router = create_router(state.clone());

    (router, state)
}

/// Sink that rejects every event
struct RejectingSink;

impl MonitorSink for RejectingSink {
    fn record_inference(
        &self,
        _model: &str,
        _operation: &str,
        _latency_ms: f64,
        _status: InferenceStatus,
        _metadata: Metadata,
    ) -> Result<(), MonitorError> {
        Err(MonitorError::EmptyModelName)
    }

    fn record_retraining_event(
        &self,
        _status: RetrainingStatus,
        _initiated_by: Option<&str>,
        _details: Metadata,
    ) -> Result<(), MonitorError> {
        Err(MonitorError::EmptyModelName)
    }

    fn metrics(&self) -> MetricsSnapshot {
        MetricsSnapshot::default()
    }
}

struct FailingTrainer;

impl ModelTrainer for FailingTrainer {
    fn train(&self) -> Result<(), EngineError> {
        Err(EngineError::Retraining("no labelled images".to_string()))
    }
}

fn red_png() -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, Rgb([210, 30, 20])));
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

async fn post(app: Router, uri: &str, payload: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

fn milk() -> Value {
    json!({
        "product_name": "Whole milk",
        "category": "dairy",
        "purchase_date": "2024-05-10",
        "storage": "fridge",
        "packaging": "plastic",
        "household_usage_rate_per_week": 2.0
    })
}

fn daily(values: &[f64], key: &str) -> Vec<Value> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| json!({ "date": format!("2024-06-{:02}", i + 1), key: v }))
        .collect()
}

#[tokio::test]
async fn test_root_banner() {
    let (app, _state) = setup_test_app().await;
    let (status, body) = get(app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_healthz_returns_503_when_unhealthy() {
    let (app, state) = setup_test_app().await;
    state
        .health_registry
        .set_unhealthy(components::ENGINE, "not initialised")
        .await;

    let (status, body) = get(app, "/healthz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
    assert!(body["components"]["engine"].is_object());
}

#[tokio::test]
async fn test_readyz_follows_registry() {
    let (app, state) = setup_test_app().await;
    let (status, body) = get(app.clone(), "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["ready"], false);

    state.health_registry.set_ready(true).await;
    let (status, body) = get(app, "/readyz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);
}

#[tokio::test]
async fn test_predict_expiry() {
    let (app, _state) = setup_test_app().await;
    let (status, body) = post(app, "/predict-expiry", milk()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predicted_expiry_date"], "2024-05-21");
    assert_eq!(body["model_version"], "1.0.0-rule-based");
    assert_eq!(body["spoilage_curve"][0]["prob_spoiled"], 0.0);
}

#[tokio::test]
async fn test_predict_expiry_rejects_out_of_range_usage() {
    let (app, _state) = setup_test_app().await;
    let mut request = milk();
    request["household_usage_rate_per_week"] = json!(9.0);

    let (status, body) = post(app, "/predict-expiry", request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "household_usage_rate_per_week");
}

#[tokio::test]
async fn test_batch_prediction() {
    let (app, _state) = setup_test_app().await;
    let (status, body) = post(
        app,
        "/predict-expiry/batch",
        json!({ "items": [milk(), milk()], "include_recommendations": false }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predictions"].as_array().unwrap().len(), 2);
    assert_eq!(body["predictions"][0]["recommendations"], json!([]));
    assert!(body["batch_id"].is_string());
}

#[tokio::test]
async fn test_forecast_demand() {
    let (app, _state) = setup_test_app().await;
    let (status, body) = post(
        app,
        "/forecast-demand",
        json!({
            "item_name": "eggs",
            "history": daily(&[4.0, 4.0, 4.0, 4.0, 4.0, 4.0], "quantity"),
            "horizon_days": 3
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["forecast"].as_array().unwrap().len(), 3);
    assert_eq!(body["forecast"][0]["predicted_quantity"], 4.0);
    assert_eq!(body["summary"]["model_version"], "1.1.0-trend-smoother");
}

#[tokio::test]
async fn test_forecast_rejects_short_history() {
    let (app, _state) = setup_test_app().await;
    let (status, body) = post(
        app,
        "/forecast-demand",
        json!({ "item_name": "eggs", "history": daily(&[1.0, 2.0], "quantity") }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "history");
}

#[tokio::test]
async fn test_detect_anomalies() {
    let (app, _state) = setup_test_app().await;
    let mut values = vec![5.0; 8];
    values.push(50.0);

    let (status, body) = post(
        app,
        "/detect-anomalies",
        json!({ "metric_name": "daily_waste_kg", "series": daily(&values, "value") }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["evaluated_points"], 9);
    let anomalies = body["anomalies"].as_array().unwrap();
    assert_eq!(anomalies.len(), 1);
    assert_eq!(anomalies[0]["date"], "2024-06-09");
}

#[tokio::test]
async fn test_classify_image() {
    let (app, _state) = setup_test_app().await;
    let (status, body) = post(
        app,
        "/classify-image",
        json!({ "image_data": STANDARD.encode(red_png()) }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predicted_category"], "fruits");
    assert_eq!(body["freshness_analysis"]["overall_freshness"], "good");
}

#[tokio::test]
async fn test_classify_garbage_returns_fallback() {
    let (app, _state) = setup_test_app().await;
    let (status, body) = post(app, "/classify-image", json!({ "image_data": "bm90IGFuIGltYWdl" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_version"], "1.0.0-fallback");
    assert_eq!(body["detected_objects"], json!(["Unknown"]));
}

#[tokio::test]
async fn test_suggest_recipes() {
    let (app, _state) = setup_test_app().await;
    let (status, body) = post(
        app,
        "/suggest-recipes",
        json!({ "expiring_items": ["tomato", "banana"] }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["suggestions"][0]["recipe_id"], "banana-bread-001");
    assert_eq!(body["suggestions"][1]["recipe_id"], "tomato-soup-001");
}

#[tokio::test]
async fn test_models_status() {
    let (app, _state) = setup_test_app().await;
    let (status, body) = get(app, "/models/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["expiry_model"]["loaded"], false);
    assert_eq!(body["image_model"]["type"], "rule-based");
}

#[tokio::test]
async fn test_retrain_is_accepted_and_recorded() {
    let (app, state) = setup_test_app().await;
    let (status, body) = post(app, "/models/retrain", json!({ "initiated_by": "ops" })).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["message"], "Model retraining started");

    let mut recorded = 0;
    for _ in 0..50 {
        recorded = state.engine.metrics().recent_retraining_events.len();
        if recorded == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(recorded, 2);
}

#[tokio::test]
async fn test_monitoring_metrics_reflect_calls() {
    let (app, _state) = setup_test_app().await;
    let (status, _) = post(app.clone(), "/predict-expiry", milk()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(app, "/monitoring/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metrics"]["models"]["expiry"]["count"], 1);
    assert_eq!(body["metrics"]["models"]["expiry"]["success_rate"], 1.0);
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let (app, _state) = setup_test_app().await;
    let (status, _) = post(app.clone(), "/predict-expiry", milk()).await;
    assert_eq!(status, StatusCode::OK);

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics_text = String::from_utf8(body.to_vec()).unwrap();
    assert!(metrics_text.contains("freshcast_inference_latency_seconds_bucket"));
    assert!(metrics_text.contains("freshcast_inferences_total"));
}

#[tokio::test]
async fn test_file_path_images_disabled_by_default() {
    let (app, _state) = setup_test_app().await;
    let (status, body) = post(
        app,
        "/classify-image",
        json!({ "image_data": "/etc/passwd", "image_type": "file_path" }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "image_type");
}

#[tokio::test]
async fn test_file_path_images_resolve_inside_image_dir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("apple.png"), red_png()).unwrap();

    let engine = PredictionEngine::new("api-test");
    let (app, _state) = app_with(engine, Some(dir.path().to_path_buf())).await;

    let (status, body) = post(
        app.clone(),
        "/classify-image",
        json!({ "image_data": "apple.png", "image_type": "file_path" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predicted_category"], "fruits");
    assert_eq!(body["model_version"], "1.0.0-rule-based");

    let (status, body) = post(
        app,
        "/classify-image",
        json!({ "image_data": "../apple.png", "image_type": "file_path" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "image_data");
}

#[tokio::test]
async fn test_monitor_faults_degrade_health() {
    let engine = PredictionEngine::new("api-test").with_monitor(Arc::new(RejectingSink));
    let (app, _state) = app_with(engine, None).await;

    let (_, body) = get(app.clone(), "/healthz").await;
    assert_eq!(body["status"], "healthy");

    let (status, _) = post(app.clone(), "/predict-expiry", milk()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["components"]["monitor"]["status"], "degraded");
    assert_eq!(body["components"]["engine"]["status"], "healthy");
}

#[tokio::test]
async fn test_failed_retraining_degrades_engine() {
    let engine = PredictionEngine::new("api-test").with_trainer(Arc::new(FailingTrainer));
    let (app, state) = app_with(engine, None).await;

    let (status, _) = post(app.clone(), "/models/retrain", json!({})).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let mut engine_status = Value::Null;
    for _ in 0..50 {
        let health = state.health_registry.health().await;
        engine_status = serde_json::to_value(health.components["engine"].status).unwrap();
        if engine_status == "degraded" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(engine_status, "degraded");

    let (status, body) = get(app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["components"]["engine"]["message"]
        .as_str()
        .unwrap()
        .contains("no labelled images"));
}
