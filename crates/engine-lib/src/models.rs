//! Core data models for the prediction engine
//!
//! Request and response types are shared with the HTTP shell and the CLI, so
//! every type here serializes to the service's JSON wire format.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Free-form key/value map attached to results and monitor events
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Where a product is kept after purchase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMethod {
    Fridge,
    Freezer,
    Pantry,
    Counter,
    Outside,
}

impl StorageMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageMethod::Fridge => "fridge",
            StorageMethod::Freezer => "freezer",
            StorageMethod::Pantry => "pantry",
            StorageMethod::Counter => "counter",
            StorageMethod::Outside => "outside",
        }
    }
}

/// How a product is wrapped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackagingType {
    Plastic,
    Glass,
    Metal,
    Paper,
    Clamshell,
    Vacuum,
    /// No packaging at all
    #[serde(rename = "none")]
    Unpackaged,
}

impl PackagingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackagingType::Plastic => "plastic",
            PackagingType::Glass => "glass",
            PackagingType::Metal => "metal",
            PackagingType::Paper => "paper",
            PackagingType::Clamshell => "clamshell",
            PackagingType::Vacuum => "vacuum",
            PackagingType::Unpackaged => "none",
        }
    }
}

/// Food categories known to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoodCategory {
    Fruits,
    Vegetables,
    Dairy,
    Meat,
    Seafood,
    Bakery,
    Grains,
    Beverages,
    Snacks,
    Other,
}

impl FoodCategory {
    pub const ALL: [FoodCategory; 10] = [
        FoodCategory::Fruits,
        FoodCategory::Vegetables,
        FoodCategory::Dairy,
        FoodCategory::Meat,
        FoodCategory::Seafood,
        FoodCategory::Bakery,
        FoodCategory::Grains,
        FoodCategory::Beverages,
        FoodCategory::Snacks,
        FoodCategory::Other,
    ];

    /// Case-insensitive lookup; unknown labels map to `Other`
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "fruits" => FoodCategory::Fruits,
            "vegetables" => FoodCategory::Vegetables,
            "dairy" => FoodCategory::Dairy,
            "meat" => FoodCategory::Meat,
            "seafood" => FoodCategory::Seafood,
            "bakery" => FoodCategory::Bakery,
            "grains" => FoodCategory::Grains,
            "beverages" => FoodCategory::Beverages,
            "snacks" => FoodCategory::Snacks,
            _ => FoodCategory::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FoodCategory::Fruits => "fruits",
            FoodCategory::Vegetables => "vegetables",
            FoodCategory::Dairy => "dairy",
            FoodCategory::Meat => "meat",
            FoodCategory::Seafood => "seafood",
            FoodCategory::Bakery => "bakery",
            FoodCategory::Grains => "grains",
            FoodCategory::Beverages => "beverages",
            FoodCategory::Snacks => "snacks",
            FoodCategory::Other => "other",
        }
    }

    /// Fresh produce
    pub fn is_produce(&self) -> bool {
        matches!(self, FoodCategory::Fruits | FoodCategory::Vegetables)
    }
}

// ---------------------------------------------------------------------------
// Expiry
// ---------------------------------------------------------------------------

/// Attributes of a purchased item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpiryRequest {
    pub product_name: String,
    pub category: String,
    pub purchase_date: NaiveDate,
    pub storage: StorageMethod,
    pub packaging: PackagingType,
    /// Times per week the household uses the product (0-7)
    pub household_usage_rate_per_week: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_c: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_level: Option<String>,
}

impl ExpiryRequest {
    /// Minimal request with no optional attributes set
    pub fn new(
        product_name: impl Into<String>,
        category: impl Into<String>,
        purchase_date: NaiveDate,
        storage: StorageMethod,
        packaging: PackagingType,
        household_usage_rate_per_week: f64,
    ) -> Self {
        Self {
            product_name: product_name.into(),
            category: category.into(),
            purchase_date,
            storage,
            packaging,
            household_usage_rate_per_week,
            temperature_c: None,
            humidity_percent: None,
            brand: None,
            origin_country: None,
            organic: None,
            processing_level: None,
        }
    }
}

/// Probability that an item is spoiled on a given day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpoilageDataPoint {
    pub date: NaiveDate,
    pub prob_spoiled: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpiryResult {
    pub predicted_expiry_date: NaiveDate,
    pub confidence: f64,
    pub spoilage_curve: Vec<SpoilageDataPoint>,
    pub factors: Metadata,
    pub recommendations: Vec<String>,
    pub model_version: String,
    pub prediction_timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchExpiryRequest {
    pub items: Vec<ExpiryRequest>,
    #[serde(default = "default_true")]
    pub include_recommendations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchExpiryResult {
    pub predictions: Vec<ExpiryResult>,
    pub batch_id: String,
    pub processing_time_ms: u64,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Demand forecasting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastGranularity {
    #[default]
    Daily,
    Weekly,
}

/// One observed consumption figure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandPoint {
    pub date: NaiveDate,
    pub quantity: f64,
    #[serde(default)]
    pub waste: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl DemandPoint {
    pub fn new(date: NaiveDate, quantity: f64) -> Self {
        Self {
            date,
            quantity,
            waste: 0.0,
            notes: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandForecastRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    pub item_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
    pub history: Vec<DemandPoint>,
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,
    #[serde(default)]
    pub granularity: ForecastGranularity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smoothing_window: Option<usize>,
    #[serde(default = "default_true")]
    pub include_uncertainty: bool,
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,
}

impl DemandForecastRequest {
    /// Request with default horizon, granularity and uncertainty settings
    pub fn new(item_name: impl Into<String>, history: Vec<DemandPoint>) -> Self {
        Self {
            item_id: None,
            item_name: item_name.into(),
            location_id: None,
            history,
            horizon_days: default_horizon_days(),
            granularity: ForecastGranularity::Daily,
            smoothing_window: None,
            include_uncertainty: true,
            confidence_level: default_confidence_level(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_quantity: f64,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub recent_average: f64,
    pub recent_trend: f64,
    pub data_points: usize,
    pub model_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResult {
    pub item_name: String,
    pub item_id: Option<String>,
    pub location_id: Option<String>,
    pub forecast: Vec<ForecastPoint>,
    pub summary: ForecastSummary,
    pub generated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Anomaly detection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyPoint {
    pub date: NaiveDate,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<BTreeMap<String, String>>,
}

impl AnomalyPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self {
            date,
            value,
            context: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyDetectionRequest {
    pub metric_name: String,
    pub series: Vec<AnomalyPoint>,
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f64,
    #[serde(default = "default_window_days")]
    pub window_days: usize,
}

impl AnomalyDetectionRequest {
    pub fn new(metric_name: impl Into<String>, series: Vec<AnomalyPoint>) -> Self {
        Self {
            metric_name: metric_name.into(),
            series,
            sensitivity: default_sensitivity(),
            window_days: default_window_days(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalySeverity {
    Low,
    Medium,
    High,
}

impl AnomalySeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalySeverity::Low => "low",
            AnomalySeverity::Medium => "medium",
            AnomalySeverity::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpectedRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyFinding {
    pub date: NaiveDate,
    pub value: f64,
    pub deviation_score: f64,
    pub severity: AnomalySeverity,
    pub expected_range: ExpectedRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub metric_name: String,
    pub anomalies: Vec<AnomalyFinding>,
    pub evaluated_points: usize,
    pub baseline_mean: f64,
    pub baseline_std: f64,
    pub generated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Image classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FreshnessLevel {
    Fresh,
    Good,
    Fair,
    Poor,
    Spoiled,
}

impl FreshnessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FreshnessLevel::Fresh => "fresh",
            FreshnessLevel::Good => "good",
            FreshnessLevel::Fair => "fair",
            FreshnessLevel::Poor => "poor",
            FreshnessLevel::Spoiled => "spoiled",
        }
    }
}

/// How `image_data` should be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    #[default]
    Base64,
    Url,
    FilePath,
}

impl ImageSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSource::Base64 => "base64",
            ImageSource::Url => "url",
            ImageSource::FilePath => "file_path",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageClassificationRequest {
    pub image_data: String,
    #[serde(default)]
    pub image_type: ImageSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_category: Option<FoodCategory>,
    #[serde(default = "default_true")]
    pub include_confidence_scores: bool,
    #[serde(default = "default_true")]
    pub include_freshness_analysis: bool,
}

impl ImageClassificationRequest {
    pub fn base64(image_data: impl Into<String>) -> Self {
        Self {
            image_data: image_data.into(),
            image_type: ImageSource::Base64,
            expected_category: None,
            include_confidence_scores: true,
            include_freshness_analysis: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryConfidence {
    pub category: FoodCategory,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreshnessAnalysis {
    pub overall_freshness: FreshnessLevel,
    pub freshness_score: f64,
    pub spoilage_indicators: Vec<String>,
    pub quality_indicators: Vec<String>,
    pub estimated_days_remaining: Option<u32>,
    pub storage_recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub predicted_category: FoodCategory,
    pub category_confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_category_scores: Option<Vec<CategoryConfidence>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freshness_analysis: Option<FreshnessAnalysis>,
    pub detected_objects: Vec<String>,
    pub image_quality: Metadata,
    pub processing_time_ms: u64,
    pub model_version: String,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Recipes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeRequest {
    pub expiring_items: Vec<String>,
    #[serde(default)]
    pub dietary_preferences: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeSuggestion {
    pub recipe_id: String,
    pub name: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub cooking_time_minutes: u32,
    pub difficulty: String,
    pub servings: u32,
    pub priority_score: f64,
    pub uses_expiring_items: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeSuggestions {
    pub suggestions: Vec<RecipeSuggestion>,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Model status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub loaded: bool,
    pub version: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub last_trained: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStatus {
    pub expiry_model: ModelInfo,
    pub image_model: ModelInfo,
    pub recipe_model: ModelInfo,
}

fn default_true() -> bool {
    true
}

fn default_horizon_days() -> u32 {
    7
}

fn default_confidence_level() -> f64 {
    0.8
}

fn default_sensitivity() -> f64 {
    0.8
}

fn default_window_days() -> usize {
    7
}
