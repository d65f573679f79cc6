//! Container probing and pixel decoding with EXIF orientation handling.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageReader};

use super::{ImageBuffer, ImageMetadata, MetadataError, Orientation};

/// Read dimensions, format and orientation without decoding the pixels.
///
/// # Errors
///
/// Returns `MetadataError` if the container cannot be recognized or its
/// header does not yield dimensions.
pub fn probe(buffer: &ImageBuffer) -> Result<ImageMetadata, MetadataError> {
    let bytes = buffer.as_bytes();
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| MetadataError(e.to_string()))?;
    let format = reader.format();

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| MetadataError(e.to_string()))?;

    Ok(ImageMetadata {
        width,
        height,
        format,
        orientation: extract_orientation(bytes),
    })
}

/// Decode an encoded image into a working image, applying EXIF orientation.
///
/// The result is normalized to 8-bit RGB, or RGBA when the source carries
/// an alpha channel.
pub fn decode_image(buffer: &ImageBuffer) -> Result<DynamicImage, image::ImageError> {
    let bytes = buffer.as_bytes();
    let img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()?;

    let oriented = apply_orientation(img, extract_orientation(bytes));
    Ok(normalize(oriented))
}

/// Convert any color layout to `Rgb8`, or `Rgba8` if alpha is present.
pub fn normalize(img: DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => img,
        other if other.color().has_alpha() => DynamicImage::ImageRgba8(other.into_rgba8()),
        other => DynamicImage::ImageRgb8(other.into_rgb8()),
    }
}

/// Extract EXIF orientation from container bytes.
///
/// Returns `Orientation::Normal` if no EXIF data is found or orientation
/// cannot be determined.
fn extract_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);

    match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(_) => Orientation::Normal,
    }
}

/// Apply EXIF orientation transformation to an image.
fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};

    fn encode(img: &DynamicImage, format: ImageFormat) -> ImageBuffer {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        ImageBuffer::new(out.into_inner())
    }

    #[test]
    fn test_probe_png() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(40, 30));
        let meta = probe(&encode(&img, ImageFormat::Png)).unwrap();

        assert_eq!((meta.width, meta.height), (40, 30));
        assert_eq!(meta.format, Some(ImageFormat::Png));
        assert_eq!(meta.orientation, Orientation::Normal);
    }

    #[test]
    fn test_probe_jpeg() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(16, 8));
        let meta = probe(&encode(&img, ImageFormat::Jpeg)).unwrap();

        assert_eq!((meta.width, meta.height), (16, 8));
        assert_eq!(meta.format, Some(ImageFormat::Jpeg));
    }

    #[test]
    fn test_probe_garbage_fails() {
        let result = probe(&ImageBuffer::new(vec![0x00, 0x01, 0x02, 0x03]));
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_image_keeps_alpha() {
        let img = DynamicImage::ImageRgba8(image::RgbaImage::new(4, 4));
        let decoded = decode_image(&encode(&img, ImageFormat::Png)).unwrap();
        assert!(matches!(decoded, DynamicImage::ImageRgba8(_)));
    }

    #[test]
    fn test_decode_image_invalid() {
        assert!(decode_image(&ImageBuffer::new(vec![0xFF, 0xD8, 0x00])).is_err());
    }

    #[test]
    fn test_normalize_gray_to_rgb() {
        let gray = DynamicImage::ImageLuma8(image::GrayImage::new(2, 2));
        assert!(matches!(normalize(gray), DynamicImage::ImageRgb8(_)));

        let gray_alpha = DynamicImage::ImageLumaA8(image::GrayAlphaImage::new(2, 2));
        assert!(matches!(normalize(gray_alpha), DynamicImage::ImageRgba8(_)));
    }

    #[test]
    fn test_orientation_extraction_no_exif() {
        assert_eq!(extract_orientation(&[0x00, 0x01, 0x02]), Orientation::Normal);
    }

    #[test]
    fn test_apply_orientation_rotate180() {
        let mut rgb = RgbImage::new(2, 1);
        rgb.put_pixel(0, 0, Rgb([255, 0, 0]));
        rgb.put_pixel(1, 0, Rgb([0, 255, 0]));

        let result = apply_orientation(DynamicImage::ImageRgb8(rgb), Orientation::Rotate180);
        let result = result.into_rgb8();

        assert_eq!(result.get_pixel(0, 0).0, [0, 255, 0]);
        assert_eq!(result.get_pixel(1, 0).0, [255, 0, 0]);
    }

    #[test]
    fn test_apply_orientation_rotate90_swaps() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(2, 1));
        let result = apply_orientation(img, Orientation::Rotate90CW);
        assert_eq!((result.width(), result.height()), (1, 2));
    }
}
