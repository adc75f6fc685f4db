//! Maps an output format and quality onto the `image` crate encoders.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ExtendedColorType, ImageEncoder};
use crate::utils::{OptimizerError, OptimizerResult, OutputFormat};

type Result<T> = OptimizerResult<T>;

/// Converts a `0.1..=1.0` quality into the JPEG encoder's `1..=100` scale.
pub fn jpeg_quality(quality: f64) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Encodes `image` as JPEG. Alpha is dropped; JPEG has no alpha channel.
pub fn encode_jpeg(image: &DynamicImage, quality: f64) -> Result<Vec<u8>> {
    let rgb = image.to_rgb8();
    let mut output = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut output, jpeg_quality(quality));
        encoder
            .encode_image(&rgb)
            .map_err(|e| OptimizerError::encode(format!("JPEG save failed: {e}")))?;
    }
    Ok(output)
}

/// Encodes `image` as PNG with the strongest deflate setting.
///
/// PNG is lossless, so `quality` has no influence here.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut output, CompressionType::Best, FilterType::Adaptive);
    write_pixels(encoder, image)
        .map_err(|e| OptimizerError::encode(format!("PNG save failed: {e}")))?;
    Ok(output)
}

/// Encodes `image` as lossy WebP through libwebp.
pub fn encode_webp(image: &DynamicImage, quality: f64) -> Result<Vec<u8>> {
    let quality = (quality * 100.0).clamp(1.0, 100.0) as f32;
    let memory = if image.color().has_alpha() {
        let rgba = image.to_rgba8();
        webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height()).encode(quality)
    } else {
        let rgb = image.to_rgb8();
        webp::Encoder::from_rgb(rgb.as_raw(), rgb.width(), rgb.height()).encode(quality)
    };
    if memory.is_empty() {
        return Err(OptimizerError::encode("WebP save failed: encoder returned no data"));
    }
    Ok(memory.to_vec())
}

/// Writes 8-bit RGB or RGBA pixels, keeping alpha only when the source has it.
fn write_pixels<E: ImageEncoder>(encoder: E, image: &DynamicImage) -> image::ImageResult<()> {
    if image.color().has_alpha() {
        let rgba = image.to_rgba8();
        encoder.write_image(rgba.as_raw(), rgba.width(), rgba.height(), ExtendedColorType::Rgba8)
    } else {
        let rgb = image.to_rgb8();
        encoder.write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
    }
}

/// Dispatches to the correct encoder based on `format`.
pub fn encode_as(image: &DynamicImage, format: OutputFormat, quality: f64) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Jpeg => encode_jpeg(image, quality),
        OutputFormat::Png => encode_png(image),
        OutputFormat::WebP => encode_webp(image, quality),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 5 % 256) as u8, ((x + y) % 256) as u8])
        }))
    }

    #[test]
    fn quality_scale_is_clamped() {
        assert_eq!(jpeg_quality(0.8), 80);
        assert_eq!(jpeg_quality(0.0), 1);
        assert_eq!(jpeg_quality(1.5), 100);
    }

    #[test]
    fn lower_jpeg_quality_gives_fewer_bytes() {
        let image = gradient(128, 96);
        let high = encode_jpeg(&image, 0.95).unwrap();
        let low = encode_jpeg(&image, 0.2).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn lower_webp_quality_gives_fewer_bytes() {
        let image = gradient(128, 96);
        let high = encode_webp(&image, 1.0).unwrap();
        let low = encode_webp(&image, 0.1).unwrap();
        assert!(low.len() < high.len(), "{} vs {}", low.len(), high.len());
    }

    #[test]
    fn webp_keeps_alpha() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 128])));
        let bytes = encode_webp(&image, 0.8).unwrap();
        assert!(image::load_from_memory(&bytes).unwrap().color().has_alpha());
    }

    #[test]
    fn every_format_round_trips_dimensions() {
        let image = gradient(40, 30);
        for format in [OutputFormat::Jpeg, OutputFormat::Png, OutputFormat::WebP] {
            let bytes = encode_as(&image, format, 0.8).unwrap();
            let decoded = image::load_from_memory(&bytes).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (40, 30), "{format}");
        }
    }

    #[test]
    fn jpeg_accepts_alpha_sources() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 128])));
        assert!(encode_jpeg(&image, 0.8).is_ok());
        let png = encode_png(&image).unwrap();
        assert!(image::load_from_memory(&png).unwrap().color().has_alpha());
    }
}
