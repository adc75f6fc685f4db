use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::utils::OptimizerError;

/// Output encodings a job can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    WebP,
}

impl OutputFormat {
    /// Whether the encoder exposes a quality knob.
    ///
    /// PNG is lossless, so the only way to lose bytes is to lose pixels.
    pub fn has_quality_lever(&self) -> bool {
        matches!(self, Self::Jpeg | Self::WebP)
    }

    /// Get file extensions associated with this format
    pub fn extensions(&self) -> &[&str] {
        match self {
            Self::Jpeg => &["jpg", "jpeg"],
            Self::Png => &["png"],
            Self::WebP => &["webp"],
        }
    }

    /// Get the primary extension for this format
    pub fn primary_extension(&self) -> &str {
        self.extensions()[0]
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::WebP => "webp",
        })
    }
}

impl FromStr for OutputFormat {
    type Err = OptimizerError;

    /// Accepts extensions (`jpg`) as well as mime types (`image/jpeg`).
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.to_lowercase();
        let value = value.strip_prefix("image/").unwrap_or(&value);
        match value {
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::WebP),
            _ => Err(OptimizerError::format(format!(
                "Unsupported output format: {}", value
            ))),
        }
    }
}

/// Get format from file extension
pub fn format_from_extension(path: &str) -> Result<OutputFormat, OptimizerError> {
    let ext = std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| OptimizerError::format(
            format!("File has no extension: {}", path)
        ))?;

    OutputFormat::from_str(ext)
}

/// Unit used when rendering byte counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizeUnit {
    #[default]
    Auto,
    B,
    KB,
    MB,
    GB,
}

/// Renders a byte count with two decimals, trailing zeros trimmed.
///
/// `Auto` picks the largest unit that keeps the value at or above one.
pub fn format_file_size(bytes: u64, unit: SizeUnit) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    const UNITS: [(&str, f64); 4] = [
        ("B", 1.0),
        ("KB", 1024.0),
        ("MB", 1024.0 * 1024.0),
        ("GB", 1024.0 * 1024.0 * 1024.0),
    ];

    let index = match unit {
        SizeUnit::Auto => UNITS
            .iter()
            .rposition(|(_, divisor)| bytes as f64 >= *divisor)
            .unwrap_or(0),
        SizeUnit::B => 0,
        SizeUnit::KB => 1,
        SizeUnit::MB => 2,
        SizeUnit::GB => 3,
    };
    let (label, divisor) = UNITS[index];
    let value = format!("{:.2}", bytes as f64 / divisor);
    let value = value.trim_end_matches('0').trim_end_matches('.');
    format!("{value} {label}")
}
