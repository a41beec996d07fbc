//! Property tests over the public engine API

use chrono::{Days, NaiveDate};
use engine_lib::anomaly::anomaly_threshold;
use engine_lib::{
    AnomalyDetectionRequest, AnomalyDetector, AnomalyPoint, DemandForecastRequest,
    DemandForecaster, DemandPoint, ExpiryPredictor, ExpiryRequest, FoodCategory,
    InferenceMonitor, InferenceStatus, Metadata, MonitorSink, PackagingType, StorageMethod,
};
use proptest::prelude::*;

const STORAGE: [StorageMethod; 5] = [
    StorageMethod::Fridge,
    StorageMethod::Freezer,
    StorageMethod::Pantry,
    StorageMethod::Counter,
    StorageMethod::Outside,
];

const PACKAGING: [PackagingType; 7] = [
    PackagingType::Plastic,
    PackagingType::Glass,
    PackagingType::Metal,
    PackagingType::Paper,
    PackagingType::Clamshell,
    PackagingType::Vacuum,
    PackagingType::Unpackaged,
];

fn day(offset: u64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + Days::new(offset)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        ..ProptestConfig::default()
    })]

    /// The spoilage curve starts at zero, moves forward one day at a time and
    /// never decreases.
    #[test]
    fn expiry_curve_is_ordered(
        category in 0usize..10,
        storage in 0usize..5,
        packaging in 0usize..7,
        usage in 0.0f64..=7.0,
        temperature in proptest::option::of(-20.0f64..=50.0),
        purchase_offset in 0u64..4000,
    ) {
        let mut request = ExpiryRequest::new(
            "item",
            FoodCategory::ALL[category].as_str(),
            day(purchase_offset),
            STORAGE[storage],
            PACKAGING[packaging],
            usage,
        );
        request.temperature_c = temperature;

        let estimate = ExpiryPredictor::new().predict(&request);
        prop_assert!(!estimate.is_fallback());
        let result = estimate.into_value();

        prop_assert!(result.confidence >= 0.1 && result.confidence <= 0.95);
        prop_assert!(result.predicted_expiry_date >= request.purchase_date);

        let curve = &result.spoilage_curve;
        prop_assert_eq!(curve[0].prob_spoiled, 0.0);
        prop_assert_eq!(curve[0].date, request.purchase_date);
        for pair in curve.windows(2) {
            prop_assert!(pair[1].date > pair[0].date);
            prop_assert!(pair[1].prob_spoiled >= pair[0].prob_spoiled);
            prop_assert!(pair[1].prob_spoiled <= 1.0);
        }
    }

    /// Forecast quantities are non-negative and bracketed by their bounds.
    #[test]
    fn forecast_points_are_bracketed(
        quantities in prop::collection::vec(0.0f64..500.0, 5..60),
        horizon in 1u32..=30,
        confidence in 0.5f64..0.99,
    ) {
        let history = quantities
            .iter()
            .enumerate()
            .map(|(i, q)| DemandPoint::new(day(i as u64), *q))
            .collect();
        let mut request = DemandForecastRequest::new("item", history);
        request.horizon_days = horizon;
        request.confidence_level = confidence;

        let result = DemandForecaster::new().forecast(&request).unwrap();
        prop_assert_eq!(result.forecast.len(), horizon as usize);
        for point in &result.forecast {
            let lower = point.lower_bound.unwrap();
            let upper = point.upper_bound.unwrap();
            prop_assert!(point.predicted_quantity >= 0.0);
            prop_assert!(lower >= 0.0);
            prop_assert!(lower <= point.predicted_quantity);
            prop_assert!(point.predicted_quantity <= upper);
        }
    }

    /// Every finding clears the threshold and carries a sane expected range.
    #[test]
    fn anomaly_findings_clear_threshold(
        values in prop::collection::vec(0.0f64..1000.0, 5..60),
        sensitivity in 0.1f64..0.99,
        window in 3usize..=30,
    ) {
        let series = values
            .iter()
            .enumerate()
            .map(|(i, v)| AnomalyPoint::new(day(i as u64), *v))
            .collect();
        let mut request = AnomalyDetectionRequest::new("metric", series);
        request.sensitivity = sensitivity;
        request.window_days = window;

        let report = AnomalyDetector::new().detect(&request).unwrap();
        let threshold = anomaly_threshold(sensitivity);
        prop_assert_eq!(report.evaluated_points, values.len());
        for finding in &report.anomalies {
            prop_assert!(finding.deviation_score >= threshold);
            prop_assert!(finding.expected_range.min >= 0.0);
            prop_assert!(finding.expected_range.min <= finding.expected_range.max);
        }
    }

    /// The monitor never holds more events than its capacity and its counters
    /// stay consistent.
    #[test]
    fn monitor_respects_capacity(
        outcomes in prop::collection::vec(any::<bool>(), 1..200),
        capacity in 1usize..50,
    ) {
        let monitor = InferenceMonitor::with_capacity(capacity, capacity);
        for ok in &outcomes {
            let status = if *ok { InferenceStatus::Success } else { InferenceStatus::Failure };
            monitor.record_inference("expiry", "predict_expiry", 1.0, status, Metadata::new()).unwrap();
        }

        let snapshot = monitor.metrics();
        prop_assert_eq!(snapshot.recent_inferences.len(), outcomes.len().min(capacity));

        let expiry = &snapshot.models["expiry"];
        prop_assert_eq!(expiry.count, outcomes.len() as u64);
        prop_assert_eq!(expiry.success + expiry.failure, expiry.count);
        prop_assert!(expiry.success_rate >= 0.0 && expiry.success_rate <= 1.0);
    }
}
