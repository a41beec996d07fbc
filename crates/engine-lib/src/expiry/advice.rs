//! Confidence scoring and storage advice for expiry predictions

use super::shelf_life::is_well_known;
use crate::models::{ExpiryRequest, FoodCategory, PackagingType, StorageMethod};

pub const MIN_CONFIDENCE: f64 = 0.1;
pub const MAX_CONFIDENCE: f64 = 0.95;

/// Usage below this rate (per week) suggests freezing leftovers
pub const LOW_USAGE_RATE: f64 = 0.5;

/// Predicted shelf lives shorter than this get a "use soon" reminder
pub const SHORT_SHELF_LIFE_DAYS: i64 = 7;

pub const REFRIGERATE: &str = "Store in refrigerator to extend shelf life";
pub const CONSIDER_REFRIGERATING: &str = "Consider refrigerating to slow ripening";
pub const FREEZE_EXCESS: &str = "Consider freezing excess portions to prevent waste";
pub const USE_SOON: &str = "Use within the next few days or freeze for later use";
pub const STORE_AIRTIGHT: &str = "Store in airtight container to maintain freshness";
pub const GENERIC_REMINDER: &str = "Store properly and monitor for signs of spoilage";

/// Confidence grows with how much we know about the item
pub fn confidence(request: &ExpiryRequest, category: FoodCategory) -> f64 {
    let mut confidence: f64 = 0.5;

    if is_well_known(category) {
        confidence += 0.2;
    }
    if request.temperature_c.is_some() {
        confidence += 0.1;
    }
    if request.humidity_percent.is_some() {
        confidence += 0.1;
    }
    if request.brand.as_deref().is_some_and(|b| !b.is_empty()) {
        confidence += 0.05;
    }
    // Frozen produce is an atypical combination for the tables
    if request.storage == StorageMethod::Freezer && category.is_produce() {
        confidence -= 0.1;
    }

    confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

pub fn recommendations(
    request: &ExpiryRequest,
    category: FoodCategory,
    predicted_days: i64,
) -> Vec<String> {
    let mut advice = Vec::new();

    if request.storage == StorageMethod::Counter
        && matches!(category, FoodCategory::Dairy | FoodCategory::Meat)
    {
        advice.push(REFRIGERATE.to_string());
    }
    if request.storage == StorageMethod::Pantry && category.is_produce() {
        advice.push(CONSIDER_REFRIGERATING.to_string());
    }
    if request.household_usage_rate_per_week < LOW_USAGE_RATE {
        advice.push(FREEZE_EXCESS.to_string());
    }
    if predicted_days < SHORT_SHELF_LIFE_DAYS {
        advice.push(USE_SOON.to_string());
    }
    if request.packaging == PackagingType::Unpackaged {
        advice.push(STORE_AIRTIGHT.to_string());
    }

    if advice.is_empty() {
        advice.push(GENERIC_REMINDER.to_string());
    }
    advice
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn request(category: &str, storage: StorageMethod, packaging: PackagingType, usage: f64) -> ExpiryRequest {
        ExpiryRequest::new(
            "item",
            category,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            storage,
            packaging,
            usage,
        )
    }

    #[test]
    fn test_confidence_with_full_context() {
        let mut req = request("dairy", StorageMethod::Fridge, PackagingType::Plastic, 2.0);
        req.temperature_c = Some(4.0);
        req.humidity_percent = Some(60.0);
        req.brand = Some("Acme".to_string());
        let score = confidence(&req, FoodCategory::Dairy);
        assert!((score - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_penalises_frozen_produce() {
        let req = request("fruits", StorageMethod::Freezer, PackagingType::Plastic, 2.0);
        let score = confidence(&req, FoodCategory::Fruits);
        assert!((score - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_empty_brand_does_not_count() {
        let mut req = request("grains", StorageMethod::Pantry, PackagingType::Paper, 2.0);
        req.brand = Some(String::new());
        assert!((confidence(&req, FoodCategory::Grains) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_counter_dairy_with_no_packaging() {
        let req = request("dairy", StorageMethod::Counter, PackagingType::Unpackaged, 3.0);
        let advice = recommendations(&req, FoodCategory::Dairy, 5);
        assert_eq!(advice, vec![REFRIGERATE, USE_SOON, STORE_AIRTIGHT]);
    }

    #[test]
    fn test_pantry_produce_with_low_usage() {
        let req = request("vegetables", StorageMethod::Pantry, PackagingType::Plastic, 0.2);
        let advice = recommendations(&req, FoodCategory::Vegetables, 8);
        assert_eq!(advice, vec![CONSIDER_REFRIGERATING, FREEZE_EXCESS]);
    }

    #[test]
    fn test_generic_reminder_when_nothing_triggers() {
        let req = request("dairy", StorageMethod::Fridge, PackagingType::Plastic, 2.0);
        let advice = recommendations(&req, FoodCategory::Dairy, 11);
        assert_eq!(advice, vec![GENERIC_REMINDER]);
    }
}
