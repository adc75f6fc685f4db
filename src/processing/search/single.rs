//! Quality mode: one encode at the configured quality.

use tracing::debug;

use crate::core::{CompressionConfig, CompressionResult};
use crate::processing::codec::{EncodeRequest, Resize};
use crate::utils::{OptimizerError, OptimizerResult};

use super::{AdaptiveSearch, square};

fn single_constraint(config: &CompressionConfig) -> Option<Resize> {
    if config.always_keep_resolution {
        return None;
    }
    let edge = Resize::FitWithin(square(config.max_longest_edge));
    match config.max_box() {
        Some(bounds) if config.keep_aspect_ratio => Some(Resize::FitWithin(bounds)),
        // already stretched to the box by the working source
        Some(_) => None,
        None => Some(edge),
    }
}

pub(super) fn run(
    search: &AdaptiveSearch,
    source: &[u8],
    config: &CompressionConfig,
    progress: &dyn Fn(f64),
) -> OptimizerResult<CompressionResult> {
    let original_size = source.len() as u64;
    let mut attempts = 0;
    let working = search.working_source(source, config, progress, &mut attempts)?;

    let request = EncodeRequest {
        resize: single_constraint(config),
        quality: config.quality,
        format: config.output_format,
    };
    let encoded = search.codec().transcode(&working, &request, progress)?;
    attempts += 1;

    if encoded.size() >= original_size {
        return Err(OptimizerError::NoImprovement {
            original_size,
            compressed_size: encoded.size(),
        });
    }

    debug!(
        "Encoded at quality {:.2}: {} → {} bytes",
        config.quality,
        original_size,
        encoded.size()
    );
    Ok(CompressionResult::new(
        encoded.bytes,
        original_size,
        attempts,
        Some(encoded.dimensions),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::core::{Dimensions, TargetMode};
    use crate::processing::search::testing::{ScriptedCodec, engine};

    fn quality_config() -> CompressionConfig {
        CompressionConfig {
            target_mode: TargetMode::Quality,
            quality: 0.6,
            ..Default::default()
        }
    }

    #[test]
    fn encodes_once_at_configured_quality() {
        let codec = Arc::new(ScriptedCodec::by_quality(Dimensions::new(3000, 2000), 10_000.0));
        let search = engine(codec.clone());

        let result = search.compress(&vec![0; 20_000], &quality_config(), &|_| {}).unwrap();

        assert_eq!(result.compressed_size, 6_000);
        assert_eq!(result.ratio, 70);
        assert_eq!(result.attempts, 1);
        let request = codec.recorded()[0];
        assert_eq!(request.quality, 0.6);
        assert_eq!(request.resize, Some(Resize::FitWithin(Dimensions::new(1920, 1080))));
    }

    #[test]
    fn larger_output_is_an_error() {
        let codec = Arc::new(ScriptedCodec::new(Dimensions::new(100, 100), |_, _| Ok(2_000)));
        let search = engine(codec);

        let err = search
            .compress(&vec![0; 1_500], &quality_config(), &|_| {})
            .unwrap_err();

        assert_eq!(
            err,
            OptimizerError::NoImprovement {
                original_size: 1_500,
                compressed_size: 2_000,
            }
        );
        assert!(err.to_string().contains(">= original size"));
    }

    #[test]
    fn constraint_follows_aspect_settings() {
        let edge_only = CompressionConfig {
            max_width: None,
            ..quality_config()
        };
        assert_eq!(
            single_constraint(&edge_only),
            Some(Resize::FitWithin(Dimensions::new(1920, 1920)))
        );

        let stretched = CompressionConfig {
            keep_aspect_ratio: false,
            ..quality_config()
        };
        assert_eq!(single_constraint(&stretched), None);

        let locked = CompressionConfig {
            always_keep_resolution: true,
            ..quality_config()
        };
        assert_eq!(single_constraint(&locked), None);
    }

    #[test]
    fn free_ratio_stretch_counts_as_attempt() {
        let codec = Arc::new(ScriptedCodec::new(Dimensions::new(800, 600), |_, call| {
            Ok(if call == 0 { 900 } else { 400 })
        }));
        let search = engine(codec.clone());
        let config = CompressionConfig {
            keep_aspect_ratio: false,
            max_width: Some(200),
            max_height: Some(200),
            ..quality_config()
        };

        let result = search.compress(&vec![0; 1_000], &config, &|_| {}).unwrap();

        assert_eq!(result.attempts, 2);
        assert_eq!(result.compressed_size, 400);
        assert_eq!(codec.calls(), 2);
    }
}
