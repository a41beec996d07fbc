//! Model status, retraining and inference monitoring

use anyhow::Result;
use engine_lib::{ModelInfo, ModelStatus};
use tabled::Tabled;

use crate::client::{ApiClient, MonitoringResponse, RetrainRequest, RetrainResponse};
use crate::output::{
    color_confidence, color_status, print_info, print_json, print_rows, print_success,
    OutputFormat,
};

#[derive(Tabled)]
struct ModelRow {
    #[tabled(rename = "Model")]
    name: String,
    #[tabled(rename = "Loaded")]
    loaded: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Last Trained")]
    last_trained: String,
}

#[derive(Tabled)]
struct MetricsRow {
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Calls")]
    count: u64,
    #[tabled(rename = "Failures")]
    failure: u64,
    #[tabled(rename = "Success Rate")]
    success_rate: String,
    #[tabled(rename = "Avg Latency")]
    avg_latency: String,
}

fn model_row(name: &str, info: &ModelInfo) -> ModelRow {
    ModelRow {
        name: name.to_string(),
        loaded: if info.loaded { "yes" } else { "no" }.to_string(),
        version: info.version.clone(),
        kind: info.kind.clone(),
        last_trained: info.last_trained.format("%Y-%m-%d %H:%M").to_string(),
    }
}

pub async fn show_status(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let status: ModelStatus = client.get("models/status").await?;

    match format {
        OutputFormat::Json => print_json(&status),
        OutputFormat::Table => {
            let rows = vec![
                model_row("expiry", &status.expiry_model),
                model_row("image", &status.image_model),
                model_row("recipe", &status.recipe_model),
            ];
            print_rows(rows, "No models reported");
            Ok(())
        }
    }
}

pub async fn retrain(client: &ApiClient, initiated_by: String, format: OutputFormat) -> Result<()> {
    let request = RetrainRequest {
        initiated_by: Some(initiated_by),
    };
    let response: RetrainResponse = client.post("models/retrain", &request).await?;

    match format {
        OutputFormat::Json => print_json(&response),
        OutputFormat::Table => {
            print_success(&response.message);
            print_info("Progress is recorded in `fcast metrics`");
            Ok(())
        }
    }
}

pub async fn show_metrics(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let response: MonitoringResponse = client.get("monitoring/metrics").await?;

    if format == OutputFormat::Json {
        return print_json(&response);
    }

    let rows = response
        .metrics
        .models
        .iter()
        .map(|(model, m)| MetricsRow {
            model: model.clone(),
            count: m.count,
            failure: m.failure,
            success_rate: color_confidence(m.success_rate),
            avg_latency: format!("{:.1} ms", m.avg_latency_ms),
        })
        .collect();
    print_rows(rows, "No inferences recorded yet");

    if let Some(event) = response.metrics.recent_retraining_events.last() {
        println!(
            "Last retraining: {} at {}",
            color_status(event.status.as_str()),
            event.timestamp.format("%Y-%m-%d %H:%M:%S")
        );
    }
    Ok(())
}
