//! JPEG encoding.
//!
//! Output is baseline sequential JPEG from the `image` crate's encoder,
//! the most widely compatible variant. Alpha is flattened away.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};
use rand::Rng;
use std::io::Cursor;

use super::EncodeError;

/// Quality bounds applied when quality is randomized.
pub const QUALITY_FLOOR: u8 = 70;
pub const QUALITY_CEILING: u8 = 95;

/// Half-width of the randomized quality band around the base quality.
pub const QUALITY_SPREAD: i32 = 5;

/// Pick the final JPEG quality.
///
/// With `vary`, a value is drawn uniformly from `[base - 5, base + 5]` and
/// clamped to `[70, 95]`. Without it, `base` is used as is.
pub fn select_quality<R: Rng>(base: u8, vary: bool, rng: &mut R) -> u8 {
    if !vary {
        return base.clamp(1, 100);
    }
    let base = base as i32;
    let drawn = rng.gen_range(base - QUALITY_SPREAD..=base + QUALITY_SPREAD);
    drawn.clamp(QUALITY_FLOOR as i32, QUALITY_CEILING as i32) as u8
}

/// Encode RGB pixel data to JPEG bytes.
///
/// # Arguments
///
/// * `pixels` - RGB pixel data (3 bytes per pixel, row-major order)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `quality` - JPEG quality (1-100, where 100 is highest quality)
///
/// # Errors
///
/// * `EncodeError::InvalidDimensions` if either dimension is zero
/// * `EncodeError::InvalidPixelData` if the buffer length is wrong
pub fn encode_jpeg(
    pixels: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected_len = (width as usize) * (height as usize) * 3;
    if pixels.len() != expected_len {
        return Err(EncodeError::InvalidPixelData {
            expected: expected_len,
            actual: pixels.len(),
        });
    }

    let quality = quality.clamp(1, 100);
    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);

    encoder
        .write_image(pixels, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::Failed {
            format: "jpeg",
            message: e.to_string(),
        })?;

    Ok(buffer.into_inner())
}

/// Encode a working image to JPEG.
pub fn encode_jpeg_image(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    encode_jpeg(rgb.as_raw(), width, height, quality)
}
