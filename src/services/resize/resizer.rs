//! Resize capability used by the fan-out

use image::{imageops::FilterType, DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::io::Cursor;
use thiserror::Error;

use super::types::ResizeFailureKind;
use crate::config::ResizeConfig;

#[derive(Error, Debug)]
pub enum ResizeError {
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Failed to encode image: {0}")]
    Encode(String),
    #[error("Output too large: {0}")]
    OutputTooLarge(String),
    #[error("Resize aborted: {0}")]
    Aborted(String),
}

impl ResizeError {
    pub fn kind(&self) -> ResizeFailureKind {
        match self {
            ResizeError::Decode(_) => ResizeFailureKind::DecodeFailure,
            ResizeError::Encode(_) => ResizeFailureKind::EncodeFailure,
            ResizeError::OutputTooLarge(_) => ResizeFailureKind::OutputTooLarge,
            ResizeError::Aborted(_) => ResizeFailureKind::Aborted,
        }
    }
}

/// Turns source bytes into an encoded image `width` pixels wide.
///
/// Implementations must be pure: the same input always yields the same
/// bytes. Calls happen on blocking threads, several at once.
pub trait Resizer: Send + Sync {
    fn resize(&self, source: &[u8], width: u32) -> Result<Vec<u8>, ResizeError>;
}

/// Height matching `width` with the aspect ratio of `orig_width` x `orig_height`
pub fn scaled_height(orig_width: u32, orig_height: u32, width: u32) -> u32 {
    let height = (orig_height as f64 * width as f64 / orig_width as f64).round();
    (height as u32).max(1)
}

/// `image` crate backed resizer producing PNG output.
///
/// Output dimensions are checked against `max_height` and `max_pixels`
/// before any resampling buffer is allocated.
#[derive(Debug, Clone)]
pub struct ImageResizer {
    filter: FilterType,
    max_height: u32,
    max_pixels: u64,
}

impl ImageResizer {
    pub fn new() -> Self {
        Self::from_config(&ResizeConfig::default())
    }

    pub fn from_config(config: &ResizeConfig) -> Self {
        Self {
            filter: config.filter,
            max_height: config.max_height,
            max_pixels: config.max_output_pixels,
        }
    }

    pub fn with_limits(mut self, max_height: u32, max_pixels: u64) -> Self {
        self.max_height = max_height;
        self.max_pixels = max_pixels;
        self
    }

    /// Height for `width`, or `OutputTooLarge` when the resize would exceed the limits
    fn output_height(&self, orig_width: u32, orig_height: u32, width: u32) -> Result<u32, ResizeError> {
        let height = scaled_height(orig_width, orig_height, width);
        if height > self.max_height {
            return Err(ResizeError::OutputTooLarge(format!(
                "{}x{} exceeds max height {}",
                width, height, self.max_height
            )));
        }

        // the vertical pass holds orig_width x height before the horizontal one
        let pixels = u64::from(orig_width.max(width)) * u64::from(height);
        if pixels > self.max_pixels {
            return Err(ResizeError::OutputTooLarge(format!(
                "{}x{} from {}x{} needs {} pixels, budget is {}",
                width, height, orig_width, orig_height, pixels, self.max_pixels
            )));
        }

        Ok(height)
    }

    fn decode(&self, source: &[u8]) -> Result<DynamicImage, ResizeError> {
        let img = ImageReader::new(Cursor::new(source))
            .with_guessed_format()
            .map_err(|e| ResizeError::Decode(format!("format guess error: {}", e)))?
            .decode()
            .map_err(|e| ResizeError::Decode(e.to_string()))?;

        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(ResizeError::Decode("image has no pixels".to_string()));
        }

        Ok(img)
    }

    fn encode_png(&self, img: DynamicImage) -> Result<Vec<u8>, ResizeError> {
        // PNG has no float channels
        let img = match img {
            DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
                DynamicImage::ImageRgba8(img.to_rgba8())
            }
            other => other,
        };

        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .map_err(|e| ResizeError::Encode(e.to_string()))?;

        Ok(buffer)
    }
}

impl Default for ImageResizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Resizer for ImageResizer {
    fn resize(&self, source: &[u8], width: u32) -> Result<Vec<u8>, ResizeError> {
        let img = self.decode(source)?;
        let (orig_width, orig_height) = img.dimensions();
        let height = self.output_height(orig_width, orig_height, width)?;

        let resized = img.resize_exact(width, height, self.filter);
        self.encode_png(resized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)
            .unwrap();
        buffer
    }

    #[test]
    fn test_scaled_height_rounds() {
        assert_eq!(scaled_height(300, 200, 100), 67);
        assert_eq!(scaled_height(300, 200, 200), 133);
        assert_eq!(scaled_height(300, 200, 150), 100);
        assert_eq!(scaled_height(300, 200, 600), 400);
        assert_eq!(scaled_height(1000, 1, 10), 1);
    }

    #[test]
    fn test_resize_produces_png_at_width() {
        let resizer = ImageResizer::new();
        let output = resizer.resize(&jpeg_bytes(300, 200), 100).unwrap();

        assert_eq!(image::guess_format(&output).unwrap(), ImageFormat::Png);
        let decoded = image::load_from_memory(&output).unwrap();
        assert_eq!(decoded.dimensions(), (100, 67));
    }

    #[test]
    fn test_upscaling_is_allowed() {
        let resizer = ImageResizer::new();
        let output = resizer.resize(&jpeg_bytes(30, 20), 90).unwrap();

        let decoded = image::load_from_memory(&output).unwrap();
        assert_eq!(decoded.dimensions(), (90, 60));
    }

    #[test]
    fn test_corrupt_source_is_decode_failure() {
        let resizer = ImageResizer::new();
        let err = resizer.resize(b"definitely not an image", 100).unwrap_err();

        assert_eq!(err.kind(), ResizeFailureKind::DecodeFailure);
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([10, 20, 30])));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    #[test]
    fn test_tall_output_is_rejected_before_resampling() {
        let resizer = ImageResizer::new();
        let err = resizer.resize(&png_bytes(1, 1000), 10_000).unwrap_err();

        assert_eq!(err.kind(), ResizeFailureKind::OutputTooLarge);
        assert!(err.to_string().contains("10000x10000000"));
    }

    #[test]
    fn test_pixel_budget_counts_source_width() {
        let resizer = ImageResizer::new().with_limits(1_000, 10_000);

        // 100x67 output, but the vertical pass is 300x67
        let err = resizer.resize(&jpeg_bytes(300, 200), 100).unwrap_err();
        assert_eq!(err.kind(), ResizeFailureKind::OutputTooLarge);

        let output = resizer.resize(&jpeg_bytes(300, 200), 30).unwrap();
        let decoded = image::load_from_memory(&output).unwrap();
        assert_eq!(decoded.dimensions(), (30, 20));
    }

    #[test]
    fn test_resize_is_deterministic() {
        let resizer = ImageResizer::new();
        let source = jpeg_bytes(64, 48);

        let first = resizer.resize(&source, 32).unwrap();
        let second = resizer.resize(&source, 32).unwrap();
        assert_eq!(first, second);
    }
}
