//! Per-item prediction commands: expiry, image freshness and recipes

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use engine_lib::{
    ClassificationResult, ExpiryRequest, ExpiryResult, FoodCategory, ImageClassificationRequest,
    ImageSource, RecipeRequest, RecipeSuggestions,
};
use std::path::Path;
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{
    color_confidence, color_risk, color_status, format_percent, print_info, print_json, print_rows,
    print_success, print_warning, OutputFormat,
};

#[derive(Tabled)]
struct CurveRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Spoiled")]
    probability: String,
}

#[derive(Tabled)]
struct ScoreRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Score")]
    score: String,
}

#[derive(Tabled)]
struct RecipeRow {
    #[tabled(rename = "Recipe")]
    name: String,
    #[tabled(rename = "Uses")]
    uses: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Servings")]
    servings: u32,
    #[tabled(rename = "Priority")]
    priority: String,
}

pub async fn predict_expiry(client: &ApiClient, request: &ExpiryRequest, format: OutputFormat) -> Result<()> {
    let result: ExpiryResult = client.post("predict-expiry", request).await?;

    if format == OutputFormat::Json {
        return print_json(&result);
    }

    print_success(&format!(
        "{} expires on {} (confidence {})",
        request.product_name,
        result.predicted_expiry_date,
        color_confidence(result.confidence)
    ));
    if result.model_version.ends_with("fallback") {
        print_warning("Conservative fallback estimate");
    }

    let rows: Vec<CurveRow> = result
        .spoilage_curve
        .iter()
        .map(|point| CurveRow {
            date: point.date.to_string(),
            probability: color_risk(point.prob_spoiled),
        })
        .collect();
    print_rows(rows, "No spoilage curve returned");

    for recommendation in &result.recommendations {
        print_info(recommendation);
    }
    Ok(())
}

/// Build a classification request from a local image file
pub fn image_request(path: &Path, expected_category: Option<FoodCategory>) -> Result<ImageClassificationRequest> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read image {}", path.display()))?;

    Ok(ImageClassificationRequest {
        image_data: STANDARD.encode(bytes),
        image_type: ImageSource::Base64,
        expected_category,
        include_confidence_scores: true,
        include_freshness_analysis: true,
    })
}

pub async fn classify_image(
    client: &ApiClient,
    path: &Path,
    expected_category: Option<FoodCategory>,
    format: OutputFormat,
) -> Result<()> {
    let request = image_request(path, expected_category)?;
    let result: ClassificationResult = client.post("classify-image", &request).await?;

    if format == OutputFormat::Json {
        return print_json(&result);
    }

    print_success(&format!(
        "Looks like {} ({})",
        result.predicted_category.as_str(),
        color_confidence(result.category_confidence)
    ));

    if let Some(analysis) = &result.freshness_analysis {
        println!(
            "Freshness: {} (score {})",
            color_status(analysis.overall_freshness.as_str()),
            format_percent(analysis.freshness_score)
        );
        if let Some(days) = analysis.estimated_days_remaining {
            println!("Estimated days remaining: {}", days);
        }
        for tip in &analysis.storage_recommendations {
            print_info(tip);
        }
    }

    if let Some(scores) = &result.all_category_scores {
        let rows = scores
            .iter()
            .map(|s| ScoreRow {
                category: s.category.as_str().to_string(),
                score: format_percent(s.confidence),
            })
            .collect();
        print_rows(rows, "No category scores");
    }
    Ok(())
}

pub async fn suggest_recipes(
    client: &ApiClient,
    expiring_items: Vec<String>,
    dietary_preferences: Vec<String>,
    format: OutputFormat,
) -> Result<()> {
    let request = RecipeRequest {
        expiring_items,
        dietary_preferences,
        user_id: None,
    };
    let result: RecipeSuggestions = client.post("suggest-recipes", &request).await?;

    match format {
        OutputFormat::Json => print_json(&result),
        OutputFormat::Table => {
            let rows = result
                .suggestions
                .iter()
                .map(|r| RecipeRow {
                    name: r.name.clone(),
                    uses: r.uses_expiring_items.join(", "),
                    time: format!("{} min", r.cooking_time_minutes),
                    servings: r.servings,
                    priority: format_percent(r.priority_score),
                })
                .collect();
            print_rows(rows, "No recipes match these items");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_request_encodes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pear.jpg");
        std::fs::write(&path, b"raw bytes").unwrap();

        let request = image_request(&path, Some(FoodCategory::Fruits)).unwrap();
        assert_eq!(STANDARD.decode(&request.image_data).unwrap(), b"raw bytes");
        assert_eq!(request.image_type, ImageSource::Base64);
        assert_eq!(request.expected_category, Some(FoodCategory::Fruits));
    }

    #[test]
    fn test_missing_image_is_an_error() {
        let err = image_request(Path::new("/nonexistent/pear.jpg"), None).unwrap_err();
        assert!(err.to_string().contains("Failed to read image"));
    }
}
