//! Prediction engine facade
//!
//! Owns one instance of every predictor plus the optional monitor sink, the
//! Prometheus handle and the structured logger. Every public prediction call
//! runs inside an [`InferenceScope`] that records exactly one monitoring
//! event when it is dropped, including on early returns.

use crate::anomaly::AnomalyDetector;
use crate::error::{EngineError, Estimate};
use crate::expiry::{ExpiryPredictor, FALLBACK_MODEL_VERSION};
use crate::forecast::DemandForecaster;
use crate::models::{
    AnomalyDetectionRequest, AnomalyReport, AnomalySeverity, BatchExpiryRequest,
    BatchExpiryResult, ClassificationResult, DemandForecastRequest, ExpiryRequest, ExpiryResult,
    ForecastResult, ImageClassificationRequest, Metadata, ModelInfo, ModelStatus, RecipeRequest,
    RecipeSuggestions,
};
use crate::monitor::{InferenceStatus, MetricsSnapshot, MonitorSink, RetrainingStatus};
use crate::observability::{EngineMetrics, StructuredLogger};
use crate::recipes::RecipeSuggester;
use crate::vision::FreshnessClassifier;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

pub const EXPIRY_MODEL: &str = "expiry";
pub const FORECAST_MODEL: &str = "forecasting";
pub const ANOMALY_MODEL: &str = "anomaly";
pub const IMAGE_MODEL: &str = "image";
pub const RECIPE_MODEL: &str = "recipe";

/// Hook that rebuilds trained models
///
/// The engine ships rule-based predictors only, so the default hook does no
/// work.
pub trait ModelTrainer: Send + Sync {
    fn train(&self) -> Result<(), EngineError>;
}

/// Training hook that always succeeds without doing anything
#[derive(Debug, Clone, Copy, Default)]
pub struct InertTrainer;

impl ModelTrainer for InertTrainer {
    fn train(&self) -> Result<(), EngineError> {
        Ok(())
    }
}

/// Records one inference event when dropped
struct InferenceScope<'a> {
    engine: &'a PredictionEngine,
    model: &'static str,
    operation: &'static str,
    started: Instant,
    status: InferenceStatus,
    metadata: Metadata,
}

impl InferenceScope<'_> {
    fn fail(&mut self) {
        self.status = InferenceStatus::Failure;
    }
}

impl Drop for InferenceScope<'_> {
    fn drop(&mut self) {
        let elapsed = self.started.elapsed();
        self.engine
            .metrics
            .observe_inference(self.model, self.status.as_str(), elapsed.as_secs_f64());

        if let Some(sink) = &self.engine.monitor {
            let metadata = std::mem::take(&mut self.metadata);
            let latency_ms = elapsed.as_secs_f64() * 1000.0;
            if let Err(e) =
                sink.record_inference(self.model, self.operation, latency_ms, self.status, metadata)
            {
                self.engine.note_monitor_fault(self.model, &e.to_string());
            }
        }
    }
}

/// Facade over all predictors
pub struct PredictionEngine {
    expiry: ExpiryPredictor,
    forecaster: DemandForecaster,
    detector: AnomalyDetector,
    classifier: FreshnessClassifier,
    recipes: RecipeSuggester,
    monitor: Option<Arc<dyn MonitorSink>>,
    trainer: Arc<dyn ModelTrainer>,
    metrics: EngineMetrics,
    logger: StructuredLogger,
    initialized_at: DateTime<Utc>,
    monitor_faults: AtomicU64,
}

impl PredictionEngine {
    /// Create an engine without a monitor sink
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            expiry: ExpiryPredictor::new(),
            forecaster: DemandForecaster::new(),
            detector: AnomalyDetector::new(),
            classifier: FreshnessClassifier::new(),
            recipes: RecipeSuggester::new(),
            monitor: None,
            trainer: Arc::new(InertTrainer),
            metrics: EngineMetrics::new(),
            logger: StructuredLogger::new(instance),
            initialized_at: Utc::now(),
            monitor_faults: AtomicU64::new(0),
        }
    }

    /// Attach a sink that receives inference and retraining events
    pub fn with_monitor(mut self, monitor: Arc<dyn MonitorSink>) -> Self {
        self.monitor = Some(monitor);
        self
    }

    pub fn with_trainer(mut self, trainer: Arc<dyn ModelTrainer>) -> Self {
        self.trainer = trainer;
        self
    }

    pub fn logger(&self) -> &StructuredLogger {
        &self.logger
    }

    pub fn initialized_at(&self) -> DateTime<Utc> {
        self.initialized_at
    }

    /// Events the monitor sink rejected since the engine was created
    pub fn monitor_faults(&self) -> u64 {
        self.monitor_faults.load(Ordering::Relaxed)
    }

    fn note_monitor_fault(&self, source: &str, error: &str) {
        self.monitor_faults.fetch_add(1, Ordering::Relaxed);
        self.logger.log_monitor_fault(source, error);
    }

    fn scope(&self, model: &'static str, operation: &'static str, metadata: Metadata) -> InferenceScope<'_> {
        InferenceScope {
            engine: self,
            model,
            operation,
            started: Instant::now(),
            status: InferenceStatus::Success,
            metadata,
        }
    }

    /// Mark the scope failed and log the fallback if the estimate degraded
    fn settle<T>(&self, scope: &mut InferenceScope<'_>, estimate: Estimate<T>) -> T {
        if let Some(reason) = estimate.fallback_reason() {
            scope.fail();
            self.metrics.inc_fallbacks(scope.model);
            self.logger
                .log_prediction_fallback(scope.model, scope.operation, reason);
        }
        estimate.into_value()
    }

    pub fn predict_expiry(&self, request: &ExpiryRequest) -> ExpiryResult {
        let mut scope = self.scope(
            EXPIRY_MODEL,
            "predict_expiry",
            metadata([
                ("product", json!(request.product_name)),
                ("category", json!(request.category)),
                ("storage", json!(request.storage.as_str())),
            ]),
        );

        let result = self.settle(&mut scope, self.expiry.predict(request));
        self.logger.log_expiry_predicted(
            &request.product_name,
            &request.category,
            &result.predicted_expiry_date.to_string(),
            result.confidence,
            &result.model_version,
        );
        result
    }

    /// Predict every item independently; each item records its own event
    pub fn predict_expiry_batch(&self, request: &BatchExpiryRequest) -> BatchExpiryResult {
        let started = Instant::now();
        let predictions = request
            .items
            .iter()
            .map(|item| {
                let mut result = self.predict_expiry(item);
                if !request.include_recommendations {
                    result.recommendations.clear();
                }
                result
            })
            .collect();

        BatchExpiryResult {
            predictions,
            batch_id: Uuid::new_v4().to_string(),
            processing_time_ms: started.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        }
    }

    pub fn forecast_demand(&self, request: &DemandForecastRequest) -> Result<ForecastResult, EngineError> {
        let mut scope = self.scope(
            FORECAST_MODEL,
            "forecast_demand",
            metadata([
                ("item_id", json!(request.item_id)),
                ("item_name", json!(request.item_name)),
                ("location_id", json!(request.location_id)),
                ("horizon", json!(request.horizon_days)),
            ]),
        );

        match self.forecaster.forecast(request) {
            Ok(result) => {
                self.logger.log_forecast_generated(
                    &result.item_name,
                    request.horizon_days,
                    result.summary.data_points,
                    result.summary.recent_trend,
                );
                Ok(result)
            }
            Err(e) => {
                scope.fail();
                self.logger
                    .log_computation_error(FORECAST_MODEL, "forecast_demand", &e.to_string());
                Err(e)
            }
        }
    }

    pub fn detect_anomalies(&self, request: &AnomalyDetectionRequest) -> Result<AnomalyReport, EngineError> {
        let mut scope = self.scope(
            ANOMALY_MODEL,
            "detect_anomalies",
            metadata([
                ("metric", json!(request.metric_name)),
                ("window_days", json!(request.window_days)),
                ("sensitivity", json!(request.sensitivity)),
            ]),
        );

        match self.detector.detect(request) {
            Ok(report) => {
                let high = report
                    .anomalies
                    .iter()
                    .filter(|f| f.severity == AnomalySeverity::High)
                    .count();
                self.metrics.add_anomalies_flagged(report.anomalies.len());
                self.logger.log_anomalies_detected(
                    &report.metric_name,
                    report.evaluated_points,
                    report.anomalies.len(),
                    high,
                );
                Ok(report)
            }
            Err(e) => {
                scope.fail();
                self.logger
                    .log_computation_error(ANOMALY_MODEL, "detect_anomalies", &e.to_string());
                Err(e)
            }
        }
    }

    pub fn classify_image(&self, request: &ImageClassificationRequest) -> ClassificationResult {
        let mut scope = self.scope(
            IMAGE_MODEL,
            "classify_image",
            metadata([("image_type", json!(request.image_type.as_str()))]),
        );
        self.settle(&mut scope, self.classifier.classify_request(request))
    }

    pub fn suggest_recipes(&self, request: &RecipeRequest) -> RecipeSuggestions {
        let _scope = self.scope(
            RECIPE_MODEL,
            "suggest_recipes",
            metadata([
                ("expiring_items", json!(request.expiring_items.len())),
                ("preferences", json!(request.dietary_preferences.len())),
                ("user_id", json!(request.user_id)),
            ]),
        );

        RecipeSuggestions {
            suggestions: self
                .recipes
                .suggest(&request.expiring_items, &request.dietary_preferences),
            timestamp: Utc::now(),
        }
    }

    /// Status of the model slots; all predictors are rule-based
    pub fn model_status(&self) -> ModelStatus {
        let info = || ModelInfo {
            loaded: false,
            version: FALLBACK_MODEL_VERSION.to_string(),
            kind: "rule-based".to_string(),
            last_trained: self.initialized_at,
        };
        ModelStatus {
            expiry_model: info(),
            image_model: info(),
            recipe_model: info(),
        }
    }

    /// Run the training hook, recording its lifecycle
    pub fn retrain(&self, initiated_by: Option<&str>) -> Result<(), EngineError> {
        self.record_retraining(RetrainingStatus::Started, initiated_by, Metadata::new());

        match self.trainer.train() {
            Ok(()) => {
                self.record_retraining(RetrainingStatus::Completed, initiated_by, Metadata::new());
                Ok(())
            }
            Err(e) => {
                self.record_retraining(
                    RetrainingStatus::Failed,
                    initiated_by,
                    metadata([("error", json!(e.to_string()))]),
                );
                Err(e)
            }
        }
    }

    fn record_retraining(&self, status: RetrainingStatus, initiated_by: Option<&str>, details: Metadata) {
        self.metrics.inc_retraining_events(status.as_str());
        self.logger.log_retraining(status.as_str(), initiated_by);
        if let Some(sink) = &self.monitor {
            if let Err(e) = sink.record_retraining_event(status, initiated_by, details) {
                self.note_monitor_fault("retraining", &e.to_string());
            }
        }
    }

    /// Monitor snapshot, empty when no sink is attached
    pub fn metrics(&self) -> MetricsSnapshot {
        self.monitor
            .as_ref()
            .map(|sink| sink.metrics())
            .unwrap_or_default()
    }
}

fn metadata<const N: usize>(entries: [(&str, Value); N]) -> Metadata {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}
