//! Rolling-baseline anomaly detection
//!
//! Each point is compared against the mean and standard deviation of a
//! trailing window that includes the point itself. Points that sit far enough
//! from that baseline are reported with a severity tier and the range that
//! would have been considered normal.

use crate::error::EngineError;
use crate::models::{
    AnomalyDetectionRequest, AnomalyFinding, AnomalyPoint, AnomalyReport, AnomalySeverity,
    ExpectedRange,
};
use crate::stats::{mean, rolling, round_to, sample_std};
use chrono::Utc;

/// Smallest effective window that can produce a baseline
pub const MIN_EFFECTIVE_WINDOW: usize = 3;

/// Threshold never drops below this many standard deviations
pub const MIN_THRESHOLD: f64 = 0.8;

/// Stand-in for a zero standard deviation
pub const ZERO_STD_FLOOR: f64 = 1e-6;

const HIGH_MULTIPLE: f64 = 1.6;
const MEDIUM_MULTIPLE: f64 = 1.2;

/// Deviation threshold for a sensitivity; higher sensitivity flags more points
pub fn anomaly_threshold(sensitivity: f64) -> f64 {
    (3.0 - sensitivity * 1.5).max(MIN_THRESHOLD)
}

/// Severity tier from how many threshold multiples a deviation reaches
pub fn severity(deviation: f64, threshold: f64) -> AnomalySeverity {
    if deviation >= threshold * HIGH_MULTIPLE {
        AnomalySeverity::High
    } else if deviation >= threshold * MEDIUM_MULTIPLE {
        AnomalySeverity::Medium
    } else {
        AnomalySeverity::Low
    }
}

/// Detects anomalies in a univariate daily series
#[derive(Debug, Clone, Default)]
pub struct AnomalyDetector {
    _private: (),
}

impl AnomalyDetector {
    pub fn new() -> Self {
        Self { _private: () }
    }

    pub fn detect(&self, request: &AnomalyDetectionRequest) -> Result<AnomalyReport, EngineError> {
        let mut points: Vec<&AnomalyPoint> = request.series.iter().collect();
        points.sort_by_key(|p| p.date);

        let window = request.window_days.min(points.len());
        if window < MIN_EFFECTIVE_WINDOW {
            return Err(EngineError::computation(
                "Not enough data to evaluate anomalies",
            ));
        }

        let values: Vec<f64> = points.iter().map(|p| p.value).collect();
        let threshold = anomaly_threshold(request.sensitivity);
        let baselines = rolling(&values, window, window / 2);

        let anomalies = points
            .iter()
            .zip(baselines)
            .filter_map(|(point, baseline)| {
                let baseline = baseline?;
                let std_dev = if baseline.std_dev.is_finite() && baseline.std_dev > 0.0 {
                    baseline.std_dev
                } else {
                    ZERO_STD_FLOOR
                };
                let deviation = ((point.value - baseline.mean) / std_dev).abs();
                if deviation.is_nan() || deviation < threshold {
                    return None;
                }

                let min = round_to((baseline.mean - 2.0 * std_dev).max(0.0), 2);
                let max = round_to(baseline.mean + 2.0 * std_dev, 2).max(min);
                Some(AnomalyFinding {
                    date: point.date,
                    value: round_to(point.value, 2),
                    deviation_score: deviation,
                    severity: severity(deviation, threshold),
                    expected_range: ExpectedRange { min, max },
                    context: point.context.clone(),
                })
            })
            .collect();

        Ok(AnomalyReport {
            metric_name: request.metric_name.clone(),
            anomalies,
            evaluated_points: values.len(),
            baseline_mean: round_to(mean(&values), 2),
            baseline_std: round_to(sample_std(&values), 2),
            generated_at: Utc::now(),
        })
    }
}
