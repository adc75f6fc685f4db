//! Core types for compression settings and results.

use serde::{Deserialize, Serialize};
use crate::utils::OutputFormat;

/// Bytes in one "MB" of a size budget.
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Which target a job is compressed towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetMode {
    /// Converge on a maximum byte size
    #[default]
    Size,
    /// Resize into a maximum pixel footprint
    Pixel,
    /// Encode once at a fixed quality
    Quality,
}

/// Configuration for compressing one image.
///
/// A job takes its own copy at submission and the copy is frozen once the
/// job has been dispatched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompressionConfig {
    pub target_mode: TargetMode,
    /// Byte budget for size mode, in MB (1 MB = 1,048,576 bytes)
    #[serde(rename = "maxSizeMB")]
    pub max_size_mb: f64,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    /// Upper bound for the longer image edge
    #[serde(alias = "maxWidthOrHeight")]
    pub max_longest_edge: u32,
    pub keep_aspect_ratio: bool,
    pub always_keep_resolution: bool,
    /// Quality used by quality mode, 0.1 to 1.0
    pub quality: f64,
    /// Starting quality of the size-mode search, 0.1 to 1.0
    pub initial_quality: f64,
    #[serde(alias = "fileType")]
    pub output_format: OutputFormat,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            target_mode: TargetMode::Size,
            max_size_mb: 1.0,
            max_width: Some(1920),
            max_height: Some(1080),
            max_longest_edge: 1920,
            keep_aspect_ratio: true,
            always_keep_resolution: false,
            quality: 0.8,
            initial_quality: 0.8,
            output_format: OutputFormat::Jpeg,
        }
    }
}

impl CompressionConfig {
    /// The size-mode budget in bytes.
    pub fn target_bytes(&self) -> u64 {
        (self.max_size_mb * BYTES_PER_MB).floor() as u64
    }

    /// Both explicit box dimensions, when both are configured.
    pub fn max_box(&self) -> Option<Dimensions> {
        match (self.max_width, self.max_height) {
            (Some(width), Some(height)) => Some(Dimensions::new(width, height)),
            _ => None,
        }
    }
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height.max(1) as f64
    }

    /// True when `self` fits inside `other` on both axes.
    pub fn fits_within(&self, other: Dimensions) -> bool {
        self.width <= other.width && self.height <= other.height
    }
}

/// Outcome of compressing one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionResult {
    pub success: bool,
    /// Bytes of the chosen output (the original bytes on pass-through paths)
    pub bytes: Vec<u8>,
    pub original_size: u64,
    pub compressed_size: u64,
    /// Percentage saved, `round((1 - compressed / original) * 100)`
    pub ratio: i32,
    /// Encodes performed to get here; zero when the input was passed through
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
    /// The bytes are the untouched input, still in its source format
    #[serde(default)]
    pub passthrough: bool,
}

impl CompressionResult {
    /// A successful result carrying `bytes` as the output.
    pub fn new(bytes: Vec<u8>, original_size: u64, attempts: u32, dimensions: Option<Dimensions>) -> Self {
        let compressed_size = bytes.len() as u64;
        Self {
            success: true,
            ratio: compression_ratio(original_size, compressed_size),
            bytes,
            original_size,
            compressed_size,
            attempts,
            dimensions,
            passthrough: false,
        }
    }

    /// The input handed back untouched.
    pub fn passthrough(original: &[u8], attempts: u32) -> Self {
        Self {
            passthrough: true,
            ..Self::new(original.to_vec(), original.len() as u64, attempts, None)
        }
    }
}

/// Percentage of bytes saved, rounded to the nearest integer.
pub fn compression_ratio(original_size: u64, compressed_size: u64) -> i32 {
    if original_size == 0 {
        return 0;
    }
    ((1.0 - compressed_size as f64 / original_size as f64) * 100.0).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_bytes_uses_binary_megabytes() {
        let config = CompressionConfig::default();
        assert_eq!(config.target_bytes(), 1_048_576);

        let config = CompressionConfig { max_size_mb: 0.5, ..Default::default() };
        assert_eq!(config.target_bytes(), 524_288);
    }

    #[test]
    fn ratio_rounds_to_nearest_percent() {
        assert_eq!(compression_ratio(1000, 1000), 0);
        assert_eq!(compression_ratio(1000, 254), 75);
        assert_eq!(compression_ratio(1000, 500), 50);
        assert_eq!(compression_ratio(0, 0), 0);
    }

    #[test]
    fn config_deserializes_original_field_names() {
        let json = r#"{
            "targetMode": "pixel",
            "maxSizeMB": 2,
            "maxWidthOrHeight": 800,
            "keepAspectRatio": false,
            "fileType": "png"
        }"#;
        let config: CompressionConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.target_mode, TargetMode::Pixel);
        assert_eq!(config.max_size_mb, 2.0);
        assert_eq!(config.max_longest_edge, 800);
        assert!(!config.keep_aspect_ratio);
        assert_eq!(config.output_format, OutputFormat::Png);
        // untouched fields keep their defaults
        assert_eq!(config.initial_quality, 0.8);
    }

    #[test]
    fn passthrough_has_zero_ratio() {
        let result = CompressionResult::passthrough(&[1, 2, 3], 0);
        assert_eq!(result.compressed_size, 3);
        assert_eq!(result.original_size, 3);
        assert_eq!(result.ratio, 0);
        assert!(result.success);
        assert!(result.passthrough);
        assert!(!CompressionResult::new(vec![1], 3, 1, None).passthrough);
    }
}
