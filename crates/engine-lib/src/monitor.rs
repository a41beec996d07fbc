//! Inference monitoring
//!
//! Records one event per prediction call and one per retraining lifecycle
//! transition, keeping the most recent events in bounded ring buffers along
//! with per-model counters. All state sits behind a single mutex so a
//! snapshot never observes a half-applied update.

use crate::models::Metadata;
use crate::stats::round_to;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use thiserror::Error;

/// Default number of inference events retained
pub const DEFAULT_INFERENCE_CAPACITY: usize = 250;

/// Default number of retraining events retained
pub const DEFAULT_RETRAINING_CAPACITY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferenceStatus {
    Success,
    Failure,
}

impl InferenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InferenceStatus::Success => "success",
            InferenceStatus::Failure => "failure",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrainingStatus {
    Started,
    Completed,
    Failed,
}

impl RetrainingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrainingStatus::Started => "started",
            RetrainingStatus::Completed => "completed",
            RetrainingStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceEvent {
    pub model: String,
    pub operation: String,
    pub latency_ms: f64,
    pub status: InferenceStatus,
    pub metadata: Metadata,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrainingEvent {
    pub status: RetrainingStatus,
    pub initiated_by: Option<String>,
    pub details: Metadata,
    pub timestamp: DateTime<Utc>,
}

/// Aggregates for one model name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub count: u64,
    pub success: u64,
    pub failure: u64,
    pub success_rate: f64,
    /// Mean latency over the events still held in the buffer
    pub avg_latency_ms: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub models: BTreeMap<String, ModelMetrics>,
    pub recent_inferences: Vec<InferenceEvent>,
    pub recent_retraining_events: Vec<RetrainingEvent>,
}

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("latency must be a finite number of milliseconds, got {0}")]
    InvalidLatency(f64),
    #[error("model name must not be empty")]
    EmptyModelName,
}

/// Destination for monitoring events
///
/// The engine treats every error from a sink as non-fatal.
pub trait MonitorSink: Send + Sync {
    fn record_inference(
        &self,
        model: &str,
        operation: &str,
        latency_ms: f64,
        status: InferenceStatus,
        metadata: Metadata,
    ) -> Result<(), MonitorError>;

    fn record_retraining_event(
        &self,
        status: RetrainingStatus,
        initiated_by: Option<&str>,
        details: Metadata,
    ) -> Result<(), MonitorError>;

    fn metrics(&self) -> MetricsSnapshot;
}

/// Sink that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMonitor;

impl MonitorSink for NullMonitor {
    fn record_inference(
        &self,
        _model: &str,
        _operation: &str,
        _latency_ms: f64,
        _status: InferenceStatus,
        _metadata: Metadata,
    ) -> Result<(), MonitorError> {
        Ok(())
    }

    fn record_retraining_event(
        &self,
        _status: RetrainingStatus,
        _initiated_by: Option<&str>,
        _details: Metadata,
    ) -> Result<(), MonitorError> {
        Ok(())
    }

    fn metrics(&self) -> MetricsSnapshot {
        MetricsSnapshot::default()
    }
}

#[derive(Debug, Default)]
struct ModelCounters {
    count: u64,
    success: u64,
    failure: u64,
}

#[derive(Debug)]
struct MonitorState {
    inferences: VecDeque<InferenceEvent>,
    retraining: VecDeque<RetrainingEvent>,
    counters: BTreeMap<String, ModelCounters>,
}

/// In-memory monitor with bounded event history
#[derive(Debug)]
pub struct InferenceMonitor {
    inference_capacity: usize,
    retraining_capacity: usize,
    state: Mutex<MonitorState>,
}

impl Default for InferenceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl InferenceMonitor {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_INFERENCE_CAPACITY, DEFAULT_RETRAINING_CAPACITY)
    }

    pub fn with_capacity(inference_capacity: usize, retraining_capacity: usize) -> Self {
        let inference_capacity = inference_capacity.max(1);
        let retraining_capacity = retraining_capacity.max(1);
        Self {
            inference_capacity,
            retraining_capacity,
            state: Mutex::new(MonitorState {
                inferences: VecDeque::with_capacity(inference_capacity),
                retraining: VecDeque::with_capacity(retraining_capacity),
                counters: BTreeMap::new(),
            }),
        }
    }

    pub fn inference_capacity(&self) -> usize {
        self.inference_capacity
    }

    pub fn retraining_capacity(&self) -> usize {
        self.retraining_capacity
    }
}

impl MonitorSink for InferenceMonitor {
    fn record_inference(
        &self,
        model: &str,
        operation: &str,
        latency_ms: f64,
        status: InferenceStatus,
        metadata: Metadata,
    ) -> Result<(), MonitorError> {
        if model.is_empty() {
            return Err(MonitorError::EmptyModelName);
        }
        if !latency_ms.is_finite() {
            return Err(MonitorError::InvalidLatency(latency_ms));
        }

        let event = InferenceEvent {
            model: model.to_string(),
            operation: operation.to_string(),
            latency_ms: round_to(latency_ms.max(0.0), 2),
            status,
            metadata,
            timestamp: Utc::now(),
        };

        let mut state = self.state.lock();
        if state.inferences.len() == self.inference_capacity {
            state.inferences.pop_front();
        }
        state.inferences.push_back(event);

        let counters = state.counters.entry(model.to_string()).or_default();
        counters.count += 1;
        match status {
            InferenceStatus::Success => counters.success += 1,
            InferenceStatus::Failure => counters.failure += 1,
        }
        Ok(())
    }

    fn record_retraining_event(
        &self,
        status: RetrainingStatus,
        initiated_by: Option<&str>,
        details: Metadata,
    ) -> Result<(), MonitorError> {
        let event = RetrainingEvent {
            status,
            initiated_by: initiated_by.map(str::to_string),
            details,
            timestamp: Utc::now(),
        };

        let mut state = self.state.lock();
        if state.retraining.len() == self.retraining_capacity {
            state.retraining.pop_front();
        }
        state.retraining.push_back(event);
        Ok(())
    }

    fn metrics(&self) -> MetricsSnapshot {
        let state = self.state.lock();

        let models = state
            .counters
            .iter()
            .map(|(model, counters)| {
                let latencies: Vec<f64> = state
                    .inferences
                    .iter()
                    .filter(|e| &e.model == model)
                    .map(|e| e.latency_ms)
                    .collect();
                let avg_latency_ms = if latencies.is_empty() {
                    0.0
                } else {
                    round_to(latencies.iter().sum::<f64>() / latencies.len() as f64, 2)
                };
                let total = counters.count.max(1);
                let metrics = ModelMetrics {
                    count: counters.count,
                    success: counters.success,
                    failure: counters.failure,
                    success_rate: round_to(counters.success as f64 / total as f64, 3),
                    avg_latency_ms,
                };
                (model.clone(), metrics)
            })
            .collect();

        MetricsSnapshot {
            models,
            recent_inferences: state.inferences.iter().cloned().collect(),
            recent_retraining_events: state.retraining.iter().cloned().collect(),
        }
    }
}
