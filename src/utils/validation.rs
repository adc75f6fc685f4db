use std::path::Path;
use crate::core::CompressionConfig;
use crate::utils::{OptimizerError, OptimizerResult};

const MIN_QUALITY: f64 = 0.1;
const MAX_QUALITY: f64 = 1.0;

/// Validates a compression configuration before it is attached to jobs.
pub fn validate_config(config: &CompressionConfig) -> OptimizerResult<()> {
    if !(config.max_size_mb.is_finite() && config.max_size_mb > 0.0) {
        return Err(OptimizerError::settings(
            format!("Invalid max size: {} MB. Must be greater than 0", config.max_size_mb)
        ));
    }

    validate_quality("quality", config.quality)?;
    validate_quality("initial quality", config.initial_quality)?;

    // Validate resize settings
    if config.max_width == Some(0) {
        return Err(OptimizerError::settings("Width cannot be 0"));
    }

    if config.max_height == Some(0) {
        return Err(OptimizerError::settings("Height cannot be 0"));
    }

    if config.max_longest_edge == 0 {
        return Err(OptimizerError::settings("Longest edge cannot be 0"));
    }

    Ok(())
}

fn validate_quality(name: &str, value: f64) -> OptimizerResult<()> {
    if !(MIN_QUALITY..=MAX_QUALITY).contains(&value) {
        return Err(OptimizerError::settings(format!(
            "Invalid {name} value: {value}. Must be between {MIN_QUALITY} and {MAX_QUALITY}"
        )));
    }
    Ok(())
}

/// Validates a path handed to the CLI as a job source.
pub fn validate_input_path(path: &Path) -> OptimizerResult<()> {
    if !path.exists() {
        return Err(OptimizerError::input(
            format!("Input file does not exist: {}", path.display())
        ));
    }

    if !path.is_file() {
        return Err(OptimizerError::input(
            format!("Input path is not a file: {}", path.display())
        ));
    }

    Ok(())
}
