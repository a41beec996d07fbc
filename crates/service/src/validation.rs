//! Request validation
//!
//! The engine assumes well-formed input; every bound it relies on is checked
//! here before a request reaches it.

use chrono::NaiveDate;
use engine_lib::{
    AnomalyDetectionRequest, BatchExpiryRequest, DemandForecastRequest, ExpiryRequest,
    ImageClassificationRequest, ImageSource, RecipeRequest,
};
use std::ops::RangeInclusive;
use std::path::{Component, Path};
use thiserror::Error;

pub const MIN_SERIES_POINTS: usize = 5;
pub const MAX_BATCH_ITEMS: usize = 100;

#[derive(Debug, Error, PartialEq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

type Validated = Result<(), ValidationError>;

fn in_range(field: &'static str, value: f64, range: RangeInclusive<f64>) -> Validated {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::new(
            field,
            format!(
                "must be between {} and {}, got {}",
                range.start(),
                range.end(),
                value
            ),
        ))
    }
}

fn sorted_by_date<'a>(field: &'static str, dates: impl Iterator<Item = &'a NaiveDate>) -> Validated {
    let mut previous: Option<&NaiveDate> = None;
    for date in dates {
        if previous.is_some_and(|p| date < p) {
            return Err(ValidationError::new(field, "must be sorted by ascending date"));
        }
        previous = Some(date);
    }
    Ok(())
}

pub fn validate_expiry(request: &ExpiryRequest, today: NaiveDate) -> Validated {
    if request.product_name.trim().is_empty() {
        return Err(ValidationError::new("product_name", "must not be empty"));
    }
    if request.purchase_date > today {
        return Err(ValidationError::new(
            "purchase_date",
            "Purchase date cannot be in the future",
        ));
    }
    in_range(
        "household_usage_rate_per_week",
        request.household_usage_rate_per_week,
        0.0..=7.0,
    )?;
    if let Some(temperature) = request.temperature_c {
        in_range("temperature_c", temperature, -20.0..=50.0)?;
    }
    if let Some(humidity) = request.humidity_percent {
        in_range("humidity_percent", humidity, 0.0..=100.0)?;
    }
    Ok(())
}

pub fn validate_batch(request: &BatchExpiryRequest, today: NaiveDate) -> Validated {
    if request.items.is_empty() || request.items.len() > MAX_BATCH_ITEMS {
        return Err(ValidationError::new(
            "items",
            format!("must contain between 1 and {} items", MAX_BATCH_ITEMS),
        ));
    }
    request
        .items
        .iter()
        .try_for_each(|item| validate_expiry(item, today))
}

pub fn validate_forecast(request: &DemandForecastRequest) -> Validated {
    if request.history.len() < MIN_SERIES_POINTS {
        return Err(ValidationError::new(
            "history",
            format!("must contain at least {} points", MIN_SERIES_POINTS),
        ));
    }
    sorted_by_date("history", request.history.iter().map(|p| &p.date))?;
    for point in &request.history {
        in_range("quantity", point.quantity, 0.0..=f64::MAX)?;
        in_range("waste", point.waste, 0.0..=f64::MAX)?;
    }
    if !(1..=30).contains(&request.horizon_days) {
        return Err(ValidationError::new("horizon_days", "must be between 1 and 30"));
    }
    if let Some(window) = request.smoothing_window {
        if !(2..=14).contains(&window) {
            return Err(ValidationError::new("smoothing_window", "must be between 2 and 14"));
        }
    }
    in_range("confidence_level", request.confidence_level, 0.5..=0.99)
}

pub fn validate_anomaly(request: &AnomalyDetectionRequest) -> Validated {
    if request.series.len() < MIN_SERIES_POINTS {
        return Err(ValidationError::new(
            "series",
            format!("must contain at least {} points", MIN_SERIES_POINTS),
        ));
    }
    sorted_by_date("series", request.series.iter().map(|p| &p.date))?;
    if request.series.iter().any(|p| !p.value.is_finite()) {
        return Err(ValidationError::new("series", "values must be finite"));
    }
    in_range("sensitivity", request.sensitivity, 0.1..=0.99)?;
    if !(3..=30).contains(&request.window_days) {
        return Err(ValidationError::new("window_days", "must be between 3 and 30"));
    }
    Ok(())
}

/// `file_path` images are only served from `image_dir`, by relative path
pub fn validate_image(request: &ImageClassificationRequest, image_dir: Option<&Path>) -> Validated {
    if request.image_data.trim().is_empty() {
        return Err(ValidationError::new("image_data", "must not be empty"));
    }
    if request.image_type != ImageSource::FilePath {
        return Ok(());
    }
    if image_dir.is_none() {
        return Err(ValidationError::new(
            "image_type",
            "file_path images are not enabled on this service",
        ));
    }
    let relative = Path::new(&request.image_data)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !relative {
        return Err(ValidationError::new(
            "image_data",
            "must be a relative path inside the image directory",
        ));
    }
    Ok(())
}

pub fn validate_recipes(request: &RecipeRequest) -> Validated {
    if request.expiring_items.is_empty() {
        return Err(ValidationError::new("expiring_items", "must not be empty"));
    }
    Ok(())
}
