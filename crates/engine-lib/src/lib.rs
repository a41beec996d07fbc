//! Prediction engine for perishable food
//!
//! This crate provides the core functionality for:
//! - Expiry date and spoilage curve prediction
//! - Demand forecasting from consumption history
//! - Anomaly detection over monitored metrics
//! - Heuristic freshness classification from images
//! - Recipe suggestions for expiring items
//! - Inference monitoring and observability

pub mod anomaly;
pub mod engine;
pub mod error;
pub mod expiry;
pub mod forecast;
pub mod models;
pub mod monitor;
pub mod observability;
pub mod recipes;
pub mod stats;
pub mod vision;

pub use anomaly::AnomalyDetector;
pub use engine::{InertTrainer, ModelTrainer, PredictionEngine};
pub use error::{EngineError, Estimate};
pub use expiry::ExpiryPredictor;
pub use forecast::DemandForecaster;
pub use models::*;
pub use monitor::{
    InferenceEvent, InferenceMonitor, InferenceStatus, MetricsSnapshot, ModelMetrics,
    MonitorError, MonitorSink, NullMonitor, RetrainingEvent, RetrainingStatus,
};
pub use observability::{EngineMetrics, StructuredLogger};
pub use recipes::RecipeSuggester;
pub use vision::FreshnessClassifier;
