//! Dimension arithmetic for resize requests.

use crate::core::Dimensions;
use super::Resize;

/// Dimensions `source` ends up with after `resize`.
pub fn resolve(source: Dimensions, resize: Resize) -> Dimensions {
    match resize {
        Resize::Exact(target) => Dimensions::new(target.width.max(1), target.height.max(1)),
        Resize::FitWithin(bounds) => fit_within(source, bounds),
    }
}

/// Largest aspect-preserving size of `source` that fits inside `bounds`.
/// Returns `source` unchanged when it already fits; never upscales.
pub fn fit_within(source: Dimensions, bounds: Dimensions) -> Dimensions {
    if source.fits_within(bounds) {
        return source;
    }
    let scale = (bounds.width as f64 / source.width as f64)
        .min(bounds.height as f64 / source.height as f64);
    scale_by(source, scale, 1)
}

/// Scales both edges by `scale`, rounding, with each edge floored at `min_edge`.
pub fn scale_by(source: Dimensions, scale: f64, min_edge: u32) -> Dimensions {
    let scale_edge = |edge: u32| ((edge as f64 * scale).round() as u32).max(min_edge).max(1);
    Dimensions::new(scale_edge(source.width), scale_edge(source.height))
}
