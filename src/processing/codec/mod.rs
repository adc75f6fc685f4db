//! Decode, resize and re-encode capability consumed by the search engine.
//!
//! - [`Codec`]: the seam the search drives; tests plug in synthetic codecs.
//! - [`ImageCodec`]: implementation on top of the `image` crate.
//! - [`resize`]: dimension arithmetic shared by the codec and the search.

mod formats;
mod image_codec;
pub mod resize;

pub use image_codec::{Filter, ImageCodec};

use crate::core::Dimensions;
use crate::utils::{OptimizerResult, OutputFormat};

/// How the codec should change the pixel dimensions before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resize {
    /// Exactly these dimensions, stretching if the aspect ratio differs
    Exact(Dimensions),
    /// Shrink, preserving aspect ratio, until the image fits inside the box.
    /// Never enlarges.
    FitWithin(Dimensions),
}

/// One encode request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeRequest {
    pub resize: Option<Resize>,
    /// Encoder quality in `0.1..=1.0`; ignored by formats without a quality lever
    pub quality: f64,
    pub format: OutputFormat,
}

/// Bytes produced by the codec plus the dimensions they encode.
#[derive(Debug, Clone, PartialEq)]
pub struct Encoded {
    pub bytes: Vec<u8>,
    pub dimensions: Dimensions,
}

impl Encoded {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Decode/encode capability.
///
/// `progress` receives fractions in `0.0..=1.0` as the transcode moves
/// through its stages. Implementations must be callable from the blocking
/// pool, hence `Send + Sync`.
pub trait Codec: Send + Sync {
    /// Reads the pixel dimensions of `bytes` without re-encoding.
    fn probe(&self, bytes: &[u8]) -> OptimizerResult<Dimensions>;

    /// Decodes `bytes`, applies `request.resize` and encodes to `request.format`.
    fn transcode(
        &self,
        bytes: &[u8],
        request: &EncodeRequest,
        progress: &dyn Fn(f64),
    ) -> OptimizerResult<Encoded>;
}
