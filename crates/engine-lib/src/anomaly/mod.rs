//! Anomaly detection for monitored metrics
//!
//! Flags points that deviate from a trailing baseline by more than a
//! sensitivity-derived number of standard deviations.

mod detector;

pub use detector::{
    anomaly_threshold, severity, AnomalyDetector, MIN_EFFECTIVE_WINDOW, MIN_THRESHOLD,
    ZERO_STD_FLOOR,
};
