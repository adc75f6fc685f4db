//! Adaptive search that drives a [`Codec`] towards a job's target.
//!
//! One [`AdaptiveSearch`] lives inside the execution context and handles one
//! image at a time. The target mode picks the strategy:
//!
//! - [`pixel`]: resize into a pixel footprint, never regressing on bytes
//! - [`size`]: bounded search onto a byte budget with best-so-far tracking
//! - [`single`]: one encode at a fixed quality

pub mod pixel;
pub mod single;
pub mod size;

use std::borrow::Cow;
use std::sync::Arc;
use tracing::debug;

use crate::core::{CompressionConfig, CompressionResult, Dimensions, TargetMode};
use crate::processing::codec::{Codec, EncodeRequest, ImageCodec, Resize};
use crate::utils::OptimizerResult;

/// Tunables of the search. The defaults are the production values.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchLimits {
    /// Refinement encodes allowed after the baseline encode
    pub max_refinements: u32,
    /// Factor applied to the quality on each lossy refinement
    pub quality_decay: f64,
    /// Lowest quality a lossy refinement will use
    pub min_quality: f64,
    /// Over-shrink factor for lossless refinements; bytes do not scale
    /// linearly with area
    pub shrink_safety: f64,
    /// Smallest edge a lossless refinement will produce
    pub min_edge: u32,
    /// Lossless refinements stop once both edges move by less than this
    pub stall_px: u32,
    /// Quality of the free-ratio pre-stretch encode
    pub stretch_quality: f64,
    /// Longest-edge limits at or above this are ignored for lossy size searches
    pub large_edge_cutoff: u32,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_refinements: 5,
            quality_decay: 0.75,
            min_quality: 0.1,
            shrink_safety: 0.7,
            min_edge: 50,
            stall_px: 5,
            stretch_quality: 0.85,
            large_edge_cutoff: 10_000,
        }
    }
}

/// Converts a `0.0..=1.0` fraction to a whole percentage in `0..=100`.
pub fn percent(fraction: f64) -> u8 {
    if fraction.is_nan() {
        return 0;
    }
    (fraction * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Entry point of the compression algorithm.
#[derive(Clone)]
pub struct AdaptiveSearch {
    codec: Arc<dyn Codec>,
    limits: SearchLimits,
}

impl Default for AdaptiveSearch {
    fn default() -> Self {
        Self::new(Arc::new(ImageCodec::new()))
    }
}

impl AdaptiveSearch {
    pub fn new(codec: Arc<dyn Codec>) -> Self {
        Self {
            codec,
            limits: SearchLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> &SearchLimits {
        &self.limits
    }

    pub(crate) fn codec(&self) -> &dyn Codec {
        self.codec.as_ref()
    }

    /// Compresses `source` according to `config`.
    ///
    /// `on_progress` receives whole percentages of the current encode. The
    /// returned result is never larger than `source`.
    pub fn compress(
        &self,
        source: &[u8],
        config: &CompressionConfig,
        on_progress: &dyn Fn(u8),
    ) -> OptimizerResult<CompressionResult> {
        let progress = |fraction: f64| on_progress(percent(fraction));

        debug!(
            "Compressing {} bytes (mode: {:?}, format: {})",
            source.len(),
            config.target_mode,
            config.output_format
        );

        match config.target_mode {
            TargetMode::Pixel if !config.always_keep_resolution => {
                pixel::run(self, source, config, &progress)
            }
            TargetMode::Size => size::run(self, source, config, &progress),
            TargetMode::Pixel | TargetMode::Quality => single::run(self, source, config, &progress),
        }
    }

    /// Applies the free-ratio pre-stretch when the config asks for one.
    ///
    /// With the aspect ratio unlocked and both box edges set, the image is
    /// first stretched to exactly that box. The stretched bytes become the
    /// working source only if they are not larger than the original.
    pub(crate) fn working_source<'a>(
        &self,
        source: &'a [u8],
        config: &CompressionConfig,
        progress: &dyn Fn(f64),
        attempts: &mut u32,
    ) -> OptimizerResult<Cow<'a, [u8]>> {
        let target = match config.max_box() {
            Some(target) if !config.keep_aspect_ratio && !config.always_keep_resolution => target,
            _ => return Ok(Cow::Borrowed(source)),
        };

        let request = EncodeRequest {
            resize: Some(Resize::Exact(target)),
            quality: self.limits.stretch_quality,
            format: config.output_format,
        };
        let stretched = self.codec.transcode(source, &request, progress)?;
        *attempts += 1;

        if stretched.size() > source.len() as u64 {
            debug!(
                "Stretch to {}×{} grew the file ({} > {} bytes), keeping the original",
                target.width,
                target.height,
                stretched.size(),
                source.len()
            );
            Ok(Cow::Borrowed(source))
        } else {
            Ok(Cow::Owned(stretched.bytes))
        }
    }
}

/// Square box with `edge` on both sides.
pub(crate) fn square(edge: u32) -> Dimensions {
    Dimensions::new(edge, edge)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Synthetic codecs for exercising the search without real images.

    use std::sync::Mutex;
    use super::*;
    use crate::processing::codec::{Encoded, resize};
    use crate::utils::OptimizerError;

    type SizeFn = dyn Fn(&EncodeRequest, usize) -> OptimizerResult<usize> + Send + Sync;

    /// Codec whose output size is computed by a closure of
    /// `(request, call_index)`. Records every request it receives.
    pub struct ScriptedCodec {
        source: Dimensions,
        size_of: Box<SizeFn>,
        pub requests: Mutex<Vec<EncodeRequest>>,
    }

    impl ScriptedCodec {
        pub fn new(
            source: Dimensions,
            size_of: impl Fn(&EncodeRequest, usize) -> OptimizerResult<usize> + Send + Sync + 'static,
        ) -> Self {
            Self {
                source,
                size_of: Box::new(size_of),
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Output shrinks by `factor` on every call, starting at `first`.
        pub fn geometric(source: Dimensions, first: usize, factor: f64) -> Self {
            Self::new(source, move |_, call| {
                Ok((first as f64 * factor.powi(call as i32)).round() as usize)
            })
        }

        /// Output size is `scale * quality`.
        pub fn by_quality(source: Dimensions, scale: f64) -> Self {
            Self::new(source, move |request, _| Ok((scale * request.quality).round() as usize))
        }

        /// Output size proportional to the pixel area of the result.
        pub fn by_area(source: Dimensions, bytes_per_pixel: f64) -> Self {
            Self::new(source, move |request, _| {
                let dims = request
                    .resize
                    .map(|r| resize::resolve(source, r))
                    .unwrap_or(source);
                Ok((dims.area() as f64 * bytes_per_pixel).round() as usize)
            })
        }

        /// Every transcode fails with a decode error.
        pub fn broken(source: Dimensions) -> Self {
            Self::new(source, |_, _| Err(OptimizerError::decode("corrupt input")))
        }

        pub fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub fn recorded(&self) -> Vec<EncodeRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Codec for ScriptedCodec {
        fn probe(&self, _bytes: &[u8]) -> OptimizerResult<Dimensions> {
            Ok(self.source)
        }

        fn transcode(
            &self,
            _bytes: &[u8],
            request: &EncodeRequest,
            progress: &dyn Fn(f64),
        ) -> OptimizerResult<Encoded> {
            let call = {
                let mut requests = self.requests.lock().unwrap();
                requests.push(*request);
                requests.len() - 1
            };
            let size = (self.size_of)(request, call)?;
            progress(1.0);
            let dimensions = request
                .resize
                .map(|r| resize::resolve(self.source, r))
                .unwrap_or(self.source);
            Ok(Encoded {
                bytes: vec![0; size],
                dimensions,
            })
        }
    }

    pub fn engine(codec: Arc<ScriptedCodec>) -> AdaptiveSearch {
        AdaptiveSearch::new(codec)
    }
}
