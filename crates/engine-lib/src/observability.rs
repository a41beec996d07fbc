//! Observability infrastructure for the prediction engine
//!
//! Provides:
//! - Prometheus metrics (inference latency and outcomes per model, fallbacks,
//!   flagged anomalies, retraining transitions)
//! - Structured JSON logging with tracing

use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, HistogramVec,
    IntCounter, IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for inference latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<EngineMetricsInner> = OnceLock::new();

struct EngineMetricsInner {
    inference_latency_seconds: HistogramVec,
    inferences_total: IntCounterVec,
    fallbacks_total: IntCounterVec,
    anomalies_flagged_total: IntCounter,
    retraining_events_total: IntCounterVec,
}

impl EngineMetricsInner {
    fn new() -> Self {
        Self {
            inference_latency_seconds: register_histogram_vec!(
                "freshcast_inference_latency_seconds",
                "Time spent serving one prediction call",
                &["model"],
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register inference_latency_seconds"),

            inferences_total: register_int_counter_vec!(
                "freshcast_inferences_total",
                "Prediction calls by model and outcome",
                &["model", "status"]
            )
            .expect("Failed to register inferences_total"),

            fallbacks_total: register_int_counter_vec!(
                "freshcast_fallbacks_total",
                "Predictions answered with a conservative fallback",
                &["model"]
            )
            .expect("Failed to register fallbacks_total"),

            anomalies_flagged_total: register_int_counter!(
                "freshcast_anomalies_flagged_total",
                "Total number of anomalous points reported"
            )
            .expect("Failed to register anomalies_flagged_total"),

            retraining_events_total: register_int_counter_vec!(
                "freshcast_retraining_events_total",
                "Retraining lifecycle transitions",
                &["status"]
            )
            .expect("Failed to register retraining_events_total"),
        }
    }
}

/// Engine metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the same
/// underlying collectors.
#[derive(Clone)]
pub struct EngineMetrics {
    _private: (),
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(EngineMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &EngineMetricsInner {
        GLOBAL_METRICS.get_or_init(EngineMetricsInner::new)
    }

    /// Record one finished inference call
    pub fn observe_inference(&self, model: &str, status: &str, duration_secs: f64) {
        let inner = self.inner();
        inner
            .inference_latency_seconds
            .with_label_values(&[model])
            .observe(duration_secs);
        inner
            .inferences_total
            .with_label_values(&[model, status])
            .inc();
    }

    pub fn inc_fallbacks(&self, model: &str) {
        self.inner().fallbacks_total.with_label_values(&[model]).inc();
    }

    pub fn add_anomalies_flagged(&self, count: usize) {
        self.inner().anomalies_flagged_total.inc_by(count as u64);
    }

    pub fn inc_retraining_events(&self, status: &str) {
        self.inner()
            .retraining_events_total
            .with_label_values(&[status])
            .inc();
    }
}

/// Structured logger for engine events
///
/// Provides consistent JSON-formatted logging for predictions, fallbacks,
/// anomalies and retraining.
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    pub fn log_expiry_predicted(
        &self,
        product_name: &str,
        category: &str,
        predicted_expiry: &str,
        confidence: f64,
        model_version: &str,
    ) {
        info!(
            event = "expiry_predicted",
            instance = %self.instance,
            product_name = %product_name,
            category = %category,
            predicted_expiry = %predicted_expiry,
            confidence = confidence,
            model_version = %model_version,
            "Predicted expiry date"
        );
    }

    pub fn log_forecast_generated(
        &self,
        item_name: &str,
        horizon_days: u32,
        data_points: usize,
        recent_trend: f64,
    ) {
        info!(
            event = "forecast_generated",
            instance = %self.instance,
            item_name = %item_name,
            horizon_days = horizon_days,
            data_points = data_points,
            recent_trend = recent_trend,
            "Generated demand forecast"
        );
    }

    /// Log the result of an anomaly scan; high-severity findings log at warn
    pub fn log_anomalies_detected(
        &self,
        metric_name: &str,
        evaluated_points: usize,
        flagged: usize,
        high_severity: usize,
    ) {
        if high_severity > 0 {
            warn!(
                event = "anomalies_detected",
                instance = %self.instance,
                metric_name = %metric_name,
                evaluated_points = evaluated_points,
                flagged = flagged,
                high_severity = high_severity,
                "High severity anomalies detected"
            );
        } else {
            info!(
                event = "anomalies_detected",
                instance = %self.instance,
                metric_name = %metric_name,
                evaluated_points = evaluated_points,
                flagged = flagged,
                "Anomaly scan completed"
            );
        }
    }

    pub fn log_prediction_fallback(&self, model: &str, operation: &str, reason: &str) {
        warn!(
            event = "prediction_fallback",
            instance = %self.instance,
            model = %model,
            operation = %operation,
            reason = %reason,
            "Rule-based path unavailable, returned conservative fallback"
        );
    }

    pub fn log_computation_error(&self, model: &str, operation: &str, error: &str) {
        warn!(
            event = "computation_failed",
            instance = %self.instance,
            model = %model,
            operation = %operation,
            error = %error,
            "Prediction could not be computed"
        );
    }

    pub fn log_retraining(&self, status: &str, initiated_by: Option<&str>) {
        info!(
            event = "retraining",
            instance = %self.instance,
            status = %status,
            initiated_by = ?initiated_by,
            "Retraining status changed"
        );
    }

    pub fn log_monitor_fault(&self, model: &str, error: &str) {
        warn!(
            event = "monitor_fault",
            instance = %self.instance,
            model = %model,
            error = %error,
            "Failed to record monitoring event"
        );
    }

    pub fn log_startup(&self, version: &str) {
        info!(
            event = "engine_started",
            instance = %self.instance,
            version = %version,
            "Prediction engine started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "engine_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Prediction engine shutting down"
        );
    }
}
