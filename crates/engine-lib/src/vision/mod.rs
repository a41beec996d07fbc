//! Heuristic food freshness classification
//!
//! Picks a food category from the dominant colour channel and derives a
//! freshness score from pixel variance. Images that cannot be loaded produce a
//! fixed low-confidence fallback.

mod preprocess;

pub use preprocess::{
    decode_base64_payload, decode_image, normalize, pixel_stats, PixelStats, ANALYSIS_SIZE,
};

use crate::error::Estimate;
use crate::models::{
    CategoryConfidence, ClassificationResult, FoodCategory, FreshnessAnalysis, FreshnessLevel,
    ImageClassificationRequest, ImageSource, Metadata,
};
use chrono::Utc;
use image::DynamicImage;
use serde_json::json;
use std::time::Instant;
use thiserror::Error;

pub const RULE_MODEL_VERSION: &str = "1.0.0-rule-based";
pub const FALLBACK_MODEL_VERSION: &str = "1.0.0-fallback";

/// Confidence reported for colour-based categories
pub const HEURISTIC_CONFIDENCE: f64 = 0.6;
pub const FALLBACK_CONFIDENCE: f64 = 0.1;

/// Pixel variance that maps to a perfect freshness score
const VARIANCE_SCALE: f64 = 1000.0;

/// Faults that trigger the fallback classification
#[derive(Debug, Error)]
pub enum ImageFault {
    #[error("image data is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("loading images from a URL is not supported")]
    UrlUnsupported,
    #[error("image has no pixels")]
    Empty,
}

/// Freshness classifier
#[derive(Debug, Clone, Default)]
pub struct FreshnessClassifier {
    _private: (),
}

impl FreshnessClassifier {
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Classify a shell request, loading the image from its declared source
    pub fn classify_request(&self, request: &ImageClassificationRequest) -> Estimate<ClassificationResult> {
        let started = Instant::now();
        match self.load(request) {
            Ok(image) => {
                let mut result = self.classify(&image);
                if !request.include_confidence_scores {
                    result.all_category_scores = None;
                }
                if !request.include_freshness_analysis {
                    result.freshness_analysis = None;
                }
                result.processing_time_ms = started.elapsed().as_millis() as u64;
                Estimate::Computed(result)
            }
            Err(fault) => Estimate::Fallback {
                value: self.fallback(),
                reason: fault.to_string(),
            },
        }
    }

    /// Classify raw encoded image bytes
    pub fn classify_bytes(&self, bytes: &[u8]) -> Estimate<ClassificationResult> {
        match decode_image(bytes) {
            Ok(image) => Estimate::Computed(self.classify(&image)),
            Err(fault) => Estimate::Fallback {
                value: self.fallback(),
                reason: fault.to_string(),
            },
        }
    }

    fn load(&self, request: &ImageClassificationRequest) -> Result<DynamicImage, ImageFault> {
        match request.image_type {
            ImageSource::Base64 => decode_image(&decode_base64_payload(&request.image_data)?),
            ImageSource::FilePath => Ok(image::open(request.image_data.trim())?),
            ImageSource::Url => Err(ImageFault::UrlUnsupported),
        }
    }

    /// Classify a decoded image; always succeeds
    pub fn classify(&self, image: &DynamicImage) -> ClassificationResult {
        let started = Instant::now();
        let stats = pixel_stats(&normalize(image));
        let (category, freshness) = dominant_channel_category(stats.channel_means);

        let mut image_quality = Metadata::new();
        image_quality.insert("brightness".into(), json!(stats.mean));
        image_quality.insert("contrast".into(), json!(stats.std_dev()));
        image_quality.insert(
            "resolution".into(),
            json!(format!("{}x{}", image.width(), image.height())),
        );

        ClassificationResult {
            predicted_category: category,
            category_confidence: HEURISTIC_CONFIDENCE,
            all_category_scores: Some(category_scores(category, HEURISTIC_CONFIDENCE)),
            freshness_analysis: Some(FreshnessAnalysis {
                overall_freshness: freshness,
                freshness_score: (stats.variance / VARIANCE_SCALE).min(1.0),
                spoilage_indicators: vec!["Color analysis only".to_string()],
                quality_indicators: vec!["Good color distribution".to_string()],
                estimated_days_remaining: Some(7),
                storage_recommendations: vec!["Store in appropriate temperature".to_string()],
            }),
            detected_objects: vec!["Food item".to_string()],
            image_quality,
            processing_time_ms: started.elapsed().as_millis() as u64,
            model_version: RULE_MODEL_VERSION.to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Fixed result for images that could not be analysed
    pub fn fallback(&self) -> ClassificationResult {
        let mut image_quality = Metadata::new();
        image_quality.insert("error".into(), json!("Unable to analyze"));

        ClassificationResult {
            predicted_category: FoodCategory::Other,
            category_confidence: FALLBACK_CONFIDENCE,
            all_category_scores: None,
            freshness_analysis: Some(FreshnessAnalysis {
                overall_freshness: FreshnessLevel::Fair,
                freshness_score: 0.5,
                spoilage_indicators: vec!["Unable to analyze".to_string()],
                quality_indicators: vec!["Unable to analyze".to_string()],
                estimated_days_remaining: Some(3),
                storage_recommendations: vec!["Store in cool, dry place".to_string()],
            }),
            detected_objects: vec!["Unknown".to_string()],
            image_quality,
            processing_time_ms: 0,
            model_version: FALLBACK_MODEL_VERSION.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Category and freshness implied by a strictly dominant channel
pub fn dominant_channel_category(means: [f64; 3]) -> (FoodCategory, FreshnessLevel) {
    let [r, g, b] = means;
    if r > g && r > b {
        (FoodCategory::Fruits, FreshnessLevel::Good)
    } else if g > r && g > b {
        (FoodCategory::Vegetables, FreshnessLevel::Fresh)
    } else if b > r && b > g {
        (FoodCategory::Dairy, FreshnessLevel::Good)
    } else {
        (FoodCategory::Other, FreshnessLevel::Fair)
    }
}

/// Predicted category at `confidence`, the remainder spread over the others
fn category_scores(predicted: FoodCategory, confidence: f64) -> Vec<CategoryConfidence> {
    let others = (FoodCategory::ALL.len() - 1) as f64;
    let remainder = (1.0 - confidence) / others;
    FoodCategory::ALL
        .iter()
        .map(|&category| CategoryConfidence {
            category,
            confidence: if category == predicted { confidence } else { remainder },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn solid(color: [u8; 3], width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
    }

    fn png_bytes(image: &DynamicImage) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_dominant_channels() {
        assert_eq!(
            dominant_channel_category([200.0, 10.0, 10.0]),
            (FoodCategory::Fruits, FreshnessLevel::Good)
        );
        assert_eq!(
            dominant_channel_category([10.0, 200.0, 10.0]),
            (FoodCategory::Vegetables, FreshnessLevel::Fresh)
        );
        assert_eq!(
            dominant_channel_category([10.0, 10.0, 200.0]),
            (FoodCategory::Dairy, FreshnessLevel::Good)
        );
        // Ties are not dominance
        assert_eq!(
            dominant_channel_category([120.0, 120.0, 10.0]),
            (FoodCategory::Other, FreshnessLevel::Fair)
        );
    }

    #[test]
    fn test_red_image_is_fruit() {
        let result = FreshnessClassifier::new().classify(&solid([200, 10, 10], 64, 32));
        assert_eq!(result.predicted_category, FoodCategory::Fruits);
        assert_eq!(result.category_confidence, HEURISTIC_CONFIDENCE);
        assert_eq!(result.image_quality["resolution"], json!("64x32"));

        let analysis = result.freshness_analysis.unwrap();
        assert_eq!(analysis.overall_freshness, FreshnessLevel::Good);
        assert_eq!(analysis.freshness_score, 1.0);
    }

    #[test]
    fn test_flat_grey_image_has_zero_freshness_score() {
        let result = FreshnessClassifier::new().classify(&solid([90, 90, 90], 10, 10));
        assert_eq!(result.predicted_category, FoodCategory::Other);
        let analysis = result.freshness_analysis.unwrap();
        assert_eq!(analysis.overall_freshness, FreshnessLevel::Fair);
        assert!(analysis.freshness_score < 1e-6);
    }

    #[test]
    fn test_category_scores_sum_to_one() {
        let scores = category_scores(FoodCategory::Dairy, HEURISTIC_CONFIDENCE);
        let total: f64 = scores.iter().map(|s| s.confidence).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert_eq!(scores.len(), FoodCategory::ALL.len());
    }

    #[test]
    fn test_base64_request_with_data_url() {
        let encoded = STANDARD.encode(png_bytes(&solid([10, 180, 20], 8, 8)));
        let mut request =
            ImageClassificationRequest::base64(format!("data:image/png;base64,{}", encoded));
        request.include_confidence_scores = false;

        let estimate = FreshnessClassifier::new().classify_request(&request);
        assert!(!estimate.is_fallback());
        let result = estimate.into_value();
        assert_eq!(result.predicted_category, FoodCategory::Vegetables);
        assert!(result.all_category_scores.is_none());
        assert!(result.freshness_analysis.is_some());
    }

    #[test]
    fn test_file_path_request() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("milk.png");
        std::fs::write(&path, png_bytes(&solid([20, 20, 220], 16, 16))).unwrap();

        let request = ImageClassificationRequest {
            image_data: path.to_string_lossy().into_owned(),
            image_type: ImageSource::FilePath,
            expected_category: None,
            include_confidence_scores: true,
            include_freshness_analysis: false,
        };
        let result = FreshnessClassifier::new().classify_request(&request).into_value();
        assert_eq!(result.predicted_category, FoodCategory::Dairy);
        assert!(result.freshness_analysis.is_none());
    }

    #[test]
    fn test_undecodable_payload_falls_back() {
        let request = ImageClassificationRequest::base64(STANDARD.encode(b"definitely not a png"));
        let estimate = FreshnessClassifier::new().classify_request(&request);
        assert!(estimate.is_fallback());

        let result = estimate.into_value();
        assert_eq!(result.predicted_category, FoodCategory::Other);
        assert_eq!(result.category_confidence, FALLBACK_CONFIDENCE);
        assert_eq!(result.freshness_analysis.unwrap().freshness_score, 0.5);
        assert_eq!(result.model_version, FALLBACK_MODEL_VERSION);
    }

    #[test]
    fn test_url_source_falls_back() {
        let mut request = ImageClassificationRequest::base64("https://example.com/apple.png");
        request.image_type = ImageSource::Url;
        let estimate = FreshnessClassifier::new().classify_request(&request);
        assert!(estimate.fallback_reason().unwrap().contains("URL"));
    }

    #[test]
    fn test_classify_bytes() {
        let bytes = png_bytes(&solid([220, 40, 30], 12, 12));
        let classifier = FreshnessClassifier::new();
        assert!(!classifier.classify_bytes(&bytes).is_fallback());
        assert!(classifier.classify_bytes(&[1, 2, 3]).is_fallback());
    }
}
