//! Expiry and spoilage prediction
//!
//! Rule-based estimator that turns item attributes into a predicted expiry
//! date, a day-by-day spoilage curve, a confidence score, and storage advice.
//! Any internal fault produces a conservative fallback result instead of an
//! error.

mod advice;
mod curve;
mod shelf_life;

pub use advice::{confidence, recommendations, MAX_CONFIDENCE, MIN_CONFIDENCE};
pub use curve::{build_curve, spoilage_probability, verify_curve, CURVE_TAIL_DAYS};
pub use shelf_life::{
    base_shelf_life_days, packaging_multiplier, storage_multiplier, usage_factor,
    DEFAULT_SHELF_LIFE_DAYS,
};

use crate::error::Estimate;
use crate::models::{ExpiryRequest, ExpiryResult, FoodCategory, Metadata, SpoilageDataPoint};
use chrono::{Days, Utc};
use serde_json::json;
use thiserror::Error;

pub const RULE_MODEL_VERSION: &str = "1.0.0-rule-based";
pub const FALLBACK_MODEL_VERSION: &str = "1.0.0-fallback";

/// Days until expiry assumed by the fallback result
pub const FALLBACK_SHELF_LIFE_DAYS: u64 = 3;
pub const FALLBACK_CONFIDENCE: f64 = 0.1;
pub const FALLBACK_RECOMMENDATION: &str = "Monitor closely for spoilage signs";

/// Internal faults that trigger the fallback result
#[derive(Debug, Error)]
pub enum ExpiryFault {
    #[error("{0} is not a finite number")]
    NonFiniteInput(&'static str),
    #[error("predicted date is outside the supported calendar range")]
    DateOutOfRange,
    #[error("spoilage curve is empty")]
    EmptyCurve,
    #[error("spoilage curve breaks ordering at point {index}")]
    CurveNotMonotonic { index: usize },
}

/// Expiry predictor
#[derive(Debug, Clone, Default)]
pub struct ExpiryPredictor {
    _private: (),
}

impl ExpiryPredictor {
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Predict expiry for one item; never fails
    pub fn predict(&self, request: &ExpiryRequest) -> Estimate<ExpiryResult> {
        match self.predict_with_rules(request) {
            Ok(result) => Estimate::Computed(result),
            Err(fault) => Estimate::Fallback {
                value: self.fallback(request),
                reason: fault.to_string(),
            },
        }
    }

    /// Rule-based prediction; faults are returned instead of masked
    pub fn predict_with_rules(&self, request: &ExpiryRequest) -> Result<ExpiryResult, ExpiryFault> {
        let usage_rate = request.household_usage_rate_per_week;
        if !usage_rate.is_finite() {
            return Err(ExpiryFault::NonFiniteInput("household_usage_rate_per_week"));
        }

        let category = FoodCategory::from_label(&request.category);
        let base_days = base_shelf_life_days(category);
        let predicted_days = self.predicted_shelf_life_days(request, category);

        let predicted_expiry = request
            .purchase_date
            .checked_add_days(Days::new(predicted_days as u64))
            .ok_or(ExpiryFault::DateOutOfRange)?;
        let spoilage_curve = build_curve(request.purchase_date, predicted_days)?;

        let mut factors = Metadata::new();
        factors.insert("category".into(), json!(request.category));
        factors.insert("storage_method".into(), json!(request.storage.as_str()));
        factors.insert("packaging_type".into(), json!(request.packaging.as_str()));
        factors.insert("usage_rate".into(), json!(usage_rate));
        factors.insert("base_shelf_life_days".into(), json!(base_days));
        factors.insert("predicted_shelf_life_days".into(), json!(predicted_days));

        Ok(ExpiryResult {
            predicted_expiry_date: predicted_expiry,
            confidence: confidence(request, category),
            spoilage_curve,
            factors,
            recommendations: recommendations(request, category, predicted_days),
            model_version: RULE_MODEL_VERSION.to_string(),
            prediction_timestamp: Utc::now(),
        })
    }

    /// `floor(base * storage * packaging * usage)`, never negative
    pub fn predicted_shelf_life_days(&self, request: &ExpiryRequest, category: FoodCategory) -> i64 {
        let days = base_shelf_life_days(category) as f64
            * storage_multiplier(request.storage)
            * packaging_multiplier(request.packaging)
            * usage_factor(request.household_usage_rate_per_week);
        days.floor().max(0.0) as i64
    }

    /// Conservative result used when the rules cannot be applied
    pub fn fallback(&self, request: &ExpiryRequest) -> ExpiryResult {
        let purchase = request.purchase_date;
        let shelf_life = Days::new(FALLBACK_SHELF_LIFE_DAYS);
        // Near the end of the calendar the window is anchored on its last day
        let (start, expiry) = match purchase.checked_add_days(shelf_life) {
            Some(expiry) => (purchase, expiry),
            None => (purchase - shelf_life, purchase),
        };

        let mut factors = Metadata::new();
        factors.insert(
            "error".into(),
            json!("Model unavailable, using conservative estimate"),
        );

        ExpiryResult {
            predicted_expiry_date: expiry,
            confidence: FALLBACK_CONFIDENCE,
            spoilage_curve: vec![
                SpoilageDataPoint {
                    date: start,
                    prob_spoiled: 0.0,
                },
                SpoilageDataPoint {
                    date: expiry,
                    prob_spoiled: 0.5,
                },
            ],
            factors,
            recommendations: vec![FALLBACK_RECOMMENDATION.to_string()],
            model_version: FALLBACK_MODEL_VERSION.to_string(),
            prediction_timestamp: Utc::now(),
        }
    }
}
