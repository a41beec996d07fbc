//! Demand forecasting and anomaly detection over series read from JSON files

use anyhow::{Context, Result};
use engine_lib::{AnomalyDetectionRequest, AnomalyReport, DemandForecastRequest, ForecastResult};
use serde::de::DeserializeOwned;
use std::path::Path;
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{
    color_status, format_optional, print_json, print_rows, print_success, print_warning,
    OutputFormat,
};

#[derive(Tabled)]
struct ForecastRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Predicted")]
    predicted: String,
    #[tabled(rename = "Lower")]
    lower: String,
    #[tabled(rename = "Upper")]
    upper: String,
}

#[derive(Tabled)]
struct AnomalyRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Deviation")]
    deviation: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Expected")]
    expected: String,
}

/// Load a request body from a JSON file
pub fn read_request<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid request in {}", path.display()))
}

pub async fn forecast_demand(
    client: &ApiClient,
    file: &Path,
    horizon_days: Option<u32>,
    format: OutputFormat,
) -> Result<()> {
    let mut request: DemandForecastRequest = read_request(file)?;
    if let Some(horizon) = horizon_days {
        request.horizon_days = horizon;
    }

    let result: ForecastResult = client.post("forecast-demand", &request).await?;

    if format == OutputFormat::Json {
        return print_json(&result);
    }

    print_success(&format!(
        "Forecast for {} from {} points (recent average {:.2}, trend {:+.2})",
        result.item_name,
        result.summary.data_points,
        result.summary.recent_average,
        result.summary.recent_trend
    ));

    let rows = result
        .forecast
        .iter()
        .map(|p| ForecastRow {
            date: p.date.to_string(),
            predicted: format!("{:.2}", p.predicted_quantity),
            lower: format_optional(p.lower_bound),
            upper: format_optional(p.upper_bound),
        })
        .collect();
    print_rows(rows, "Empty forecast");
    Ok(())
}

pub async fn detect_anomalies(
    client: &ApiClient,
    file: &Path,
    sensitivity: Option<f64>,
    format: OutputFormat,
) -> Result<()> {
    let mut request: AnomalyDetectionRequest = read_request(file)?;
    if let Some(sensitivity) = sensitivity {
        request.sensitivity = sensitivity;
    }

    let report: AnomalyReport = client.post("detect-anomalies", &request).await?;

    if format == OutputFormat::Json {
        return print_json(&report);
    }

    println!(
        "{}: {} points, baseline {:.2} ± {:.2}",
        report.metric_name, report.evaluated_points, report.baseline_mean, report.baseline_std
    );

    if report.anomalies.is_empty() {
        print_success("No anomalies detected");
        return Ok(());
    }

    print_warning(&format!("{} anomalies detected", report.anomalies.len()));
    let rows = report
        .anomalies
        .iter()
        .map(|a| AnomalyRow {
            date: a.date.to_string(),
            value: format!("{:.2}", a.value),
            deviation: format!("{:.2}", a.deviation_score),
            severity: color_status(a.severity.as_str()),
            expected: format!("{:.2} - {:.2}", a.expected_range.min, a.expected_range.max),
        })
        .collect();
    print_rows(rows, "No anomalies detected");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_forecast_request_applies_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"item_name":"eggs","history":[{{"date":"2024-06-01","quantity":4}}]}}"#
        )
        .unwrap();

        let request: DemandForecastRequest = read_request(file.path()).unwrap();
        assert_eq!(request.item_name, "eggs");
        assert_eq!(request.history.len(), 1);
        assert_eq!(request.horizon_days, 7);
        assert!(request.include_uncertainty);
    }

    #[test]
    fn test_read_request_reports_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = read_request::<AnomalyDetectionRequest>(file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid request"));
    }
}
