//! Image decoding and pixel statistics

use super::ImageFault;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{imageops::FilterType, DynamicImage};

/// Side length images are resized to before analysis
pub const ANALYSIS_SIZE: u32 = 224;

/// Decode a base64 payload, accepting an optional `data:...;base64,` prefix
pub fn decode_base64_payload(payload: &str) -> Result<Vec<u8>, ImageFault> {
    let trimmed = payload.trim();
    let encoded = match trimmed.split_once(',') {
        Some((_, data)) => data,
        None => trimmed,
    };
    Ok(STANDARD.decode(encoded.trim())?)
}

pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, ImageFault> {
    let image = image::load_from_memory(bytes)?;
    if image.width() == 0 || image.height() == 0 {
        return Err(ImageFault::Empty);
    }
    Ok(image)
}

/// Pixel statistics of the resized RGB image, on the 0-255 scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelStats {
    /// Mean of the red, green and blue channels
    pub channel_means: [f64; 3],
    /// Mean over every channel value
    pub mean: f64,
    /// Population variance over every channel value
    pub variance: f64,
}

impl PixelStats {
    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }
}

/// Resize to the analysis resolution and normalize to RGB
pub fn normalize(image: &DynamicImage) -> DynamicImage {
    DynamicImage::ImageRgb8(
        image
            .resize_exact(ANALYSIS_SIZE, ANALYSIS_SIZE, FilterType::Triangle)
            .to_rgb8(),
    )
}

pub fn pixel_stats(image: &DynamicImage) -> PixelStats {
    let rgb = image.to_rgb8();
    let pixel_count = (rgb.width() as usize * rgb.height() as usize).max(1) as f64;

    let mut sums = [0.0f64; 3];
    for pixel in rgb.pixels() {
        for (channel, sum) in sums.iter_mut().enumerate() {
            *sum += pixel[channel] as f64;
        }
    }
    let channel_means = sums.map(|s| s / pixel_count);
    let mean = channel_means.iter().sum::<f64>() / 3.0;

    let sum_sq: f64 = rgb
        .pixels()
        .flat_map(|p| p.0)
        .map(|v| (v as f64 - mean).powi(2))
        .sum();
    let variance = sum_sq / (pixel_count * 3.0);

    PixelStats {
        channel_means,
        mean,
        variance,
    }
}
