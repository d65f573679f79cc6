//! PNG encoding at maximum compression effort.

use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::{DynamicImage, ExtendedColorType, ImageEncoder};

use super::EncodeError;

/// Encode a working image to PNG, keeping alpha when present.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, EncodeError> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let (pixels, color) = if image.color().has_alpha() {
        (image.to_rgba8().into_raw(), ExtendedColorType::Rgba8)
    } else {
        (image.to_rgb8().into_raw(), ExtendedColorType::Rgb8)
    };

    let mut buffer = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut buffer, CompressionType::Best, PngFilter::Adaptive);
    encoder
        .write_image(&pixels, width, height, color)
        .map_err(|e| EncodeError::Failed {
            format: "png",
            message: e.to_string(),
        })?;

    Ok(buffer)
}
