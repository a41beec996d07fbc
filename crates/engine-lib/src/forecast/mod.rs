//! Demand forecasting
//!
//! Smooths the resampled consumption history with a trailing mean, fits a
//! linear trend over the whole series, and projects both forward. Unlike the
//! expiry predictor, insufficient data is reported as an error.

mod resample;

pub use resample::{bucket_date, resample};

use crate::error::EngineError;
use crate::models::{DemandForecastRequest, ForecastPoint, ForecastResult, ForecastSummary};
use crate::stats::{linear_regression_slope, mean, rolling, round_to, sample_std};
use chrono::{Days, Utc};

pub const FORECAST_MODEL_VERSION: &str = "1.1.0-trend-smoother";

pub const MIN_SMOOTHING_WINDOW: usize = 2;
pub const MAX_SMOOTHING_WINDOW: usize = 7;

/// Smallest spread as a share of the predicted quantity
const MIN_RELATIVE_SPREAD: f64 = 0.1;

/// Smoothing window used when the request does not set one
pub fn default_window(series_len: usize) -> usize {
    (series_len / 3).clamp(MIN_SMOOTHING_WINDOW, MAX_SMOOTHING_WINDOW)
}

/// Standard-normal style multiplier for a requested confidence level
pub fn confidence_multiplier(confidence_level: f64) -> f64 {
    if confidence_level >= 0.95 {
        2.0
    } else if confidence_level >= 0.9 {
        1.64
    } else if confidence_level >= 0.8 {
        1.28
    } else {
        1.0
    }
}

/// Lower and upper bound around a prediction
pub fn forecast_bounds(predicted: f64, std_estimate: f64, confidence_level: f64) -> (f64, f64) {
    let multiplier = confidence_multiplier(confidence_level);
    let spread = std_estimate.max(predicted * MIN_RELATIVE_SPREAD);
    let lower = round_to(predicted - multiplier * spread, 2).max(0.0);
    let upper = round_to(predicted + multiplier * spread, 2);
    (lower, upper)
}

#[derive(Debug, Clone, Default)]
pub struct DemandForecaster {
    _private: (),
}

impl DemandForecaster {
    pub fn new() -> Self {
        Self { _private: () }
    }

    pub fn forecast(&self, request: &DemandForecastRequest) -> Result<ForecastResult, EngineError> {
        let series = resample(&request.history, request.granularity);
        let Some(&(last_date, _)) = series.last() else {
            return Err(EngineError::computation(
                "No historic data available for forecasting",
            ));
        };
        let values: Vec<f64> = series.iter().map(|(_, quantity)| *quantity).collect();

        let window = request
            .smoothing_window
            .filter(|w| *w > 0)
            .unwrap_or_else(|| default_window(values.len()));
        let tail = &values[values.len().saturating_sub(window)..];

        let last_stats = rolling(&values, window, 1)
            .last()
            .copied()
            .flatten()
            .ok_or_else(|| EngineError::computation("Smoothing produced no values"))?;
        let baseline = last_stats.mean;
        let std_estimate = if last_stats.std_dev.is_finite() && last_stats.std_dev > 0.0 {
            last_stats.std_dev
        } else {
            sample_std(tail)
        };
        let trend = linear_regression_slope(&values);

        let mut forecast = Vec::with_capacity(request.horizon_days as usize);
        for offset in 1..=request.horizon_days {
            let date = last_date
                .checked_add_days(Days::new(offset as u64))
                .ok_or_else(|| EngineError::computation("Forecast date is out of range"))?;
            let predicted = (baseline + trend * offset as f64).max(0.0);
            let (lower_bound, upper_bound) = if request.include_uncertainty {
                let (lower, upper) = forecast_bounds(predicted, std_estimate, request.confidence_level);
                (Some(lower), Some(upper))
            } else {
                (None, None)
            };
            forecast.push(ForecastPoint {
                date,
                predicted_quantity: round_to(predicted, 2),
                lower_bound,
                upper_bound,
            });
        }

        Ok(ForecastResult {
            item_name: request.item_name.clone(),
            item_id: request.item_id.clone(),
            location_id: request.location_id.clone(),
            forecast,
            summary: ForecastSummary {
                recent_average: round_to(mean(tail), 2),
                recent_trend: round_to(trend, 3),
                data_points: values.len(),
                model_version: FORECAST_MODEL_VERSION.to_string(),
            },
            generated_at: Utc::now(),
        })
    }
}
