//! [`Codec`] backed by the pure-Rust `image` crate.

use std::io::Cursor;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use tracing::debug;

use crate::core::Dimensions;
use crate::utils::{OptimizerError, OptimizerResult};

use super::formats::encode_as;
use super::{Codec, EncodeRequest, Encoded, resize};

// Fractions reported through the progress callback after each stage.
const DECODED: f64 = 0.3;
const RESIZED: f64 = 0.6;
const ENCODED: f64 = 1.0;

/// Codec that decodes any format the `image` crate understands and encodes
/// JPEG, PNG or lossy WebP.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCodec {
    filter: Filter,
}

/// Resampling filter used when the dimensions change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Filter {
    /// Fast bilinear
    Triangle,
    /// Sharper, slower
    #[default]
    Lanczos3,
}

impl ImageCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(filter: Filter) -> Self {
        Self { filter }
    }

    fn decode(&self, bytes: &[u8]) -> OptimizerResult<DynamicImage> {
        image::load_from_memory(bytes)
            .map_err(|e| OptimizerError::decode(format!("Failed to load image: {e}")))
    }

    fn filter_type(&self) -> FilterType {
        match self.filter {
            Filter::Triangle => FilterType::Triangle,
            Filter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl Codec for ImageCodec {
    fn probe(&self, bytes: &[u8]) -> OptimizerResult<Dimensions> {
        let (width, height) = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()?
            .into_dimensions()?;
        Ok(Dimensions::new(width, height))
    }

    fn transcode(
        &self,
        bytes: &[u8],
        request: &EncodeRequest,
        progress: &dyn Fn(f64),
    ) -> OptimizerResult<Encoded> {
        let image = self.decode(bytes)?;
        progress(DECODED);

        let source = Dimensions::new(image.width(), image.height());
        let target = request
            .resize
            .map(|r| resize::resolve(source, r))
            .unwrap_or(source);

        let image = if target != source {
            debug!(
                "Resizing {}×{} → {}×{}",
                source.width, source.height, target.width, target.height
            );
            image.resize_exact(target.width, target.height, self.filter_type())
        } else {
            image
        };
        progress(RESIZED);

        let bytes = encode_as(&image, request.format, request.quality)?;
        progress(ENCODED);

        Ok(Encoded {
            bytes,
            dimensions: target,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use image::{Rgb, RgbImage};
    use crate::processing::codec::Resize;
    use crate::utils::OutputFormat;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 90])
        }));
        let mut out = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn probe_reads_dimensions() {
        let codec = ImageCodec::new();
        let dims = codec.probe(&png_bytes(64, 32)).unwrap();
        assert_eq!(dims, Dimensions::new(64, 32));
    }

    #[test]
    fn probe_rejects_garbage() {
        let codec = ImageCodec::new();
        assert!(matches!(
            codec.probe(b"definitely not an image"),
            Err(OptimizerError::Format(_))
        ));
    }

    #[test]
    fn transcode_resizes_and_reports_progress() {
        let codec = ImageCodec::with_filter(Filter::Triangle);
        let seen = RefCell::new(Vec::new());
        let request = EncodeRequest {
            resize: Some(Resize::FitWithin(Dimensions::new(32, 32))),
            quality: 0.8,
            format: OutputFormat::Jpeg,
        };

        let encoded = codec
            .transcode(&png_bytes(64, 32), &request, &|p| seen.borrow_mut().push(p))
            .unwrap();

        assert_eq!(encoded.dimensions, Dimensions::new(32, 16));
        assert_eq!(codec.probe(&encoded.bytes).unwrap(), Dimensions::new(32, 16));
        assert_eq!(*seen.borrow(), vec![DECODED, RESIZED, ENCODED]);
    }

    #[test]
    fn transcode_fails_on_corrupt_input() {
        let codec = ImageCodec::new();
        let request = EncodeRequest {
            resize: None,
            quality: 0.8,
            format: OutputFormat::Png,
        };
        let err = codec.transcode(&[0xFF, 0xD8, 0x00], &request, &|_| {}).unwrap_err();
        assert!(matches!(err, OptimizerError::Decode(_)));
    }
}
