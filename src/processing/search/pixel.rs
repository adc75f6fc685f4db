//! Pixel mode: resize into the configured footprint, no byte targeting.

use tracing::debug;

use crate::core::{CompressionConfig, CompressionResult, Dimensions};
use crate::processing::codec::{EncodeRequest, Resize};
use crate::utils::OptimizerResult;

use super::AdaptiveSearch;

/// Target dimensions for `source` under `config`.
///
/// With the aspect ratio locked and both box edges set, the image is bound
/// by width when it is wider than the box and by height otherwise. With only
/// the longest-edge limit, the larger source edge is bound to it. With the
/// aspect ratio unlocked the box is used as is, falling back to the longest
/// edge for a missing side.
pub fn target_dimensions(source: Dimensions, config: &CompressionConfig) -> Dimensions {
    let edge = config.max_longest_edge;

    if !config.keep_aspect_ratio {
        return Dimensions::new(
            config.max_width.unwrap_or(edge).max(1),
            config.max_height.unwrap_or(edge).max(1),
        );
    }

    let aspect = source.aspect_ratio();
    let scaled = |value: f64| (value.round() as u32).max(1);

    match config.max_box() {
        Some(bounds) if aspect > bounds.aspect_ratio() => {
            Dimensions::new(bounds.width, scaled(bounds.width as f64 / aspect))
        }
        Some(bounds) => Dimensions::new(scaled(bounds.height as f64 * aspect), bounds.height),
        None if source.width > source.height => Dimensions::new(edge, scaled(edge as f64 / aspect)),
        None => Dimensions::new(scaled(edge as f64 * aspect), edge),
    }
}

/// Encode quality for a resize, picked from how much area is removed.
///
/// Mild reductions get the lowest quality: re-encoding an already
/// compressed image at high quality tends to grow the file.
pub fn resize_quality(source: Dimensions, target: Dimensions) -> f64 {
    let remaining = target.area() as f64 / source.area().max(1) as f64;
    if remaining < 0.5 {
        0.85
    } else if remaining < 0.75 {
        0.90
    } else {
        0.80
    }
}

pub(super) fn run(
    search: &AdaptiveSearch,
    source: &[u8],
    config: &CompressionConfig,
    progress: &dyn Fn(f64),
) -> OptimizerResult<CompressionResult> {
    let original_size = source.len() as u64;
    let dims = search.codec().probe(source)?;
    let target = target_dimensions(dims, config);

    // No enlargement while the aspect ratio is locked
    if config.keep_aspect_ratio && !(target.width < dims.width || target.height < dims.height) {
        debug!(
            "Target {}×{} does not shrink {}×{}, returning original",
            target.width, target.height, dims.width, dims.height
        );
        progress(1.0);
        return Ok(CompressionResult::passthrough(source, 0));
    }

    let request = EncodeRequest {
        resize: Some(Resize::Exact(target)),
        quality: resize_quality(dims, target),
        format: config.output_format,
    };
    let encoded = search.codec().transcode(source, &request, progress)?;

    if encoded.size() >= original_size {
        debug!(
            "Resize to {}×{} produced {} bytes (original {}), returning original",
            target.width,
            target.height,
            encoded.size(),
            original_size
        );
        return Ok(CompressionResult::passthrough(source, 1));
    }

    debug!(
        "Resized {}×{} → {}×{}: {} → {} bytes",
        dims.width,
        dims.height,
        encoded.dimensions.width,
        encoded.dimensions.height,
        original_size,
        encoded.size()
    );
    Ok(CompressionResult::new(
        encoded.bytes,
        original_size,
        1,
        Some(encoded.dimensions),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::core::TargetMode;
    use crate::processing::search::testing::{ScriptedCodec, engine};

    fn pixel_config() -> CompressionConfig {
        CompressionConfig {
            target_mode: TargetMode::Pixel,
            ..Default::default()
        }
    }

    #[test]
    fn wide_image_is_width_bound() {
        let config = CompressionConfig {
            max_width: Some(1000),
            max_height: Some(1000),
            ..pixel_config()
        };
        let target = target_dimensions(Dimensions::new(4000, 2000), &config);
        assert_eq!(target, Dimensions::new(1000, 500));
    }

    #[test]
    fn tall_image_is_height_bound() {
        let config = CompressionConfig {
            max_width: Some(1000),
            max_height: Some(1000),
            ..pixel_config()
        };
        let target = target_dimensions(Dimensions::new(1500, 3000), &config);
        assert_eq!(target, Dimensions::new(500, 1000));
    }

    #[test]
    fn longest_edge_binds_larger_side() {
        let config = CompressionConfig {
            max_width: None,
            max_height: None,
            max_longest_edge: 800,
            ..pixel_config()
        };
        assert_eq!(
            target_dimensions(Dimensions::new(1600, 1200), &config),
            Dimensions::new(800, 600)
        );
        assert_eq!(
            target_dimensions(Dimensions::new(1200, 1600), &config),
            Dimensions::new(600, 800)
        );
    }

    #[test]
    fn free_ratio_uses_box_exactly() {
        let config = CompressionConfig {
            keep_aspect_ratio: false,
            max_width: Some(300),
            max_height: None,
            max_longest_edge: 700,
            ..pixel_config()
        };
        assert_eq!(
            target_dimensions(Dimensions::new(4000, 2000), &config),
            Dimensions::new(300, 700)
        );
    }

    #[test]
    fn quality_follows_area_reduction() {
        let source = Dimensions::new(1000, 1000);
        assert_eq!(resize_quality(source, Dimensions::new(500, 500)), 0.85);
        assert_eq!(resize_quality(source, Dimensions::new(800, 800)), 0.90);
        assert_eq!(resize_quality(source, Dimensions::new(900, 900)), 0.80);
    }

    #[test]
    fn scenario_4000x2000_into_1000_box() {
        let codec = Arc::new(ScriptedCodec::by_area(Dimensions::new(4000, 2000), 0.1));
        let search = engine(codec.clone());
        let config = CompressionConfig {
            max_width: Some(1000),
            max_height: Some(1000),
            ..pixel_config()
        };

        let result = search.compress(&vec![0; 400_000], &config, &|_| {}).unwrap();

        assert_eq!(result.dimensions, Some(Dimensions::new(1000, 500)));
        assert_eq!(result.compressed_size, 50_000);
        assert_eq!(result.ratio, 88);
        let request = codec.recorded()[0];
        assert_eq!(request.resize, Some(Resize::Exact(Dimensions::new(1000, 500))));
        assert_eq!(request.quality, 0.85);
    }

    #[test]
    fn never_enlarges_with_locked_aspect() {
        let codec = Arc::new(ScriptedCodec::by_area(Dimensions::new(640, 480), 0.1));
        let search = engine(codec.clone());
        let source = vec![9; 1234];

        let result = search.compress(&source, &pixel_config(), &|_| {}).unwrap();

        assert_eq!(result.bytes, source);
        assert_eq!(result.ratio, 0);
        assert_eq!(codec.calls(), 0);
    }

    #[test]
    fn larger_output_falls_back_to_original() {
        let codec = Arc::new(ScriptedCodec::new(Dimensions::new(4000, 3000), |_, _| Ok(9_999)));
        let search = engine(codec);
        let source = vec![1; 5_000];

        let result = search.compress(&source, &pixel_config(), &|_| {}).unwrap();

        assert!(result.success);
        assert_eq!(result.compressed_size, 5_000);
        assert_eq!(result.bytes, source);
        assert_eq!(result.ratio, 0);
    }

    #[test]
    fn free_ratio_may_stretch_up() {
        let codec = Arc::new(ScriptedCodec::by_area(Dimensions::new(100, 100), 0.01));
        let search = engine(codec.clone());
        let config = CompressionConfig {
            keep_aspect_ratio: false,
            max_width: Some(200),
            max_height: Some(50),
            ..pixel_config()
        };

        let result = search.compress(&vec![0; 1000], &config, &|_| {}).unwrap();

        assert_eq!(result.dimensions, Some(Dimensions::new(200, 50)));
        assert_eq!(result.compressed_size, 100);
    }

    #[test]
    fn codec_failure_propagates() {
        let codec = Arc::new(ScriptedCodec::broken(Dimensions::new(4000, 3000)));
        let search = engine(codec);
        assert!(search.compress(&[1; 10], &pixel_config(), &|_| {}).is_err());
    }
}
