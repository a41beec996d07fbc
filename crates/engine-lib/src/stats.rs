//! Numeric helpers shared by the forecaster and the anomaly detector
//!
//! Trailing-window statistics use the two-pass sample variance (Bessel's
//! correction) so that results match a batch computation over the same window.

use std::collections::VecDeque;

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Arithmetic mean, 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation, 0 for fewer than two values
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

/// Ordinary-least-squares slope of `values` against a 0-based index
pub fn linear_regression_slope(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let sum_x: f64 = (0..values.len()).map(|i| i as f64).sum();
    let sum_y: f64 = values.iter().sum();
    let sum_xy: f64 = values.iter().enumerate().map(|(i, y)| i as f64 * y).sum();
    let sum_x2: f64 = (0..values.len()).map(|i| (i as f64).powi(2)).sum();
    let denom = n * sum_x2 - sum_x.powi(2);
    if denom.abs() < f64::EPSILON {
        return 0.0;
    }
    (n * sum_xy - sum_x * sum_y) / denom
}

/// Statistics for one trailing window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStats {
    pub mean: f64,
    /// Sample standard deviation; 0 when the window holds a single value
    pub std_dev: f64,
    pub count: usize,
}

/// Fixed-size trailing window over a sequence of observations
#[derive(Debug, Clone)]
pub struct RollingWindow {
    size: usize,
    samples: VecDeque<f64>,
}

impl RollingWindow {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            size,
            samples: VecDeque::with_capacity(size),
        }
    }

    /// Push a value, evicting the oldest once the window is full
    pub fn push(&mut self, value: f64) -> WindowStats {
        if self.samples.len() == self.size {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
        self.stats()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn stats(&self) -> WindowStats {
        let count = self.samples.len();
        if count == 0 {
            return WindowStats {
                mean: 0.0,
                std_dev: 0.0,
                count: 0,
            };
        }

        let mean = self.samples.iter().sum::<f64>() / count as f64;
        let std_dev = if count > 1 {
            let variance = self
                .samples
                .iter()
                .map(|v| (v - mean).powi(2))
                .sum::<f64>()
                / (count - 1) as f64;
            variance.sqrt()
        } else {
            0.0
        };

        WindowStats {
            mean,
            std_dev,
            count,
        }
    }
}

/// Trailing statistics for every position of `values`
///
/// Positions with fewer than `min_periods` observations are `None`.
pub fn rolling(values: &[f64], window: usize, min_periods: usize) -> Vec<Option<WindowStats>> {
    let mut rolling = RollingWindow::new(window);
    values
        .iter()
        .map(|v| {
            let stats = rolling.push(*v);
            (stats.count >= min_periods).then_some(stats)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(0.0104, 3), 0.01);
        assert_eq!(round_to(-2.5551, 2), -2.56);
    }

    #[test]
    fn test_sample_std() {
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((sample_std(&values) - 2.138).abs() < 0.001);
        assert_eq!(sample_std(&[3.0]), 0.0);
    }

    #[test]
    fn test_linear_regression_slope() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((linear_regression_slope(&values) - 1.0).abs() < 1e-9);
        assert_eq!(linear_regression_slope(&[4.0]), 0.0);
        assert_eq!(linear_regression_slope(&[]), 0.0);
    }

    #[test]
    fn test_rolling_window_evicts_oldest() {
        let mut window = RollingWindow::new(3);
        for v in [1.0, 2.0, 3.0, 10.0] {
            window.push(v);
        }
        let stats = window.stats();
        assert_eq!(stats.count, 3);
        assert!((stats.mean - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_rolling_respects_min_periods() {
        let out = rolling(&[1.0, 2.0, 3.0, 4.0], 4, 2);
        assert!(out[0].is_none());
        let second = out[1].unwrap();
        assert!((second.mean - 1.5).abs() < 1e-9);
        assert_eq!(out[3].unwrap().count, 4);
    }

    #[test]
    fn test_single_observation_has_zero_std() {
        let out = rolling(&[5.0], 3, 1);
        let stats = out[0].unwrap();
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.mean, 5.0);
    }
}
