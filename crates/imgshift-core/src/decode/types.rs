//! Core types for input decoding.

use image::{DynamicImage, ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while turning caller input into an [`ImageBuffer`].
///
/// Every variant is caller-fixable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// No image field was supplied at all.
    #[error("No image (base64) provided")]
    Missing,

    /// The supplied string was empty or contained only a data-URI header.
    #[error("Image (base64) is empty")]
    Empty,

    /// Decoding succeeded but produced no bytes.
    #[error("Decoded image buffer is empty")]
    NoData,

    /// The base64 payload could not be decoded even after cleanup.
    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(String),
}

/// Error raised when the encoded bytes cannot be introspected.
///
/// Non-fatal: the pipeline skips size-dependent stages when it sees this.
#[derive(Debug, Error)]
#[error("Cannot read image metadata: {0}")]
pub struct MetadataError(pub String);

/// Filter type for resampling operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterType {
    /// Nearest neighbor interpolation (fastest, lowest quality).
    Nearest,
    /// Bilinear interpolation (fast, acceptable quality).
    Bilinear,
    /// Lanczos3 interpolation (slower, highest quality).
    #[default]
    Lanczos3,
}

impl FilterType {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            FilterType::Nearest => image::imageops::FilterType::Nearest,
            FilterType::Bilinear => image::imageops::FilterType::Triangle,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// EXIF orientation values (1-8).
/// See: https://exiftool.org/TagNames/EXIF.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Orientation {
    /// Normal (no transformation needed).
    #[default]
    Normal = 1,
    /// Horizontal flip.
    FlipHorizontal = 2,
    /// Rotate 180 degrees.
    Rotate180 = 3,
    /// Vertical flip.
    FlipVertical = 4,
    /// Transpose (flip horizontal + rotate 270 CW).
    Transpose = 5,
    /// Rotate 90 degrees clockwise.
    Rotate90CW = 6,
    /// Transverse (flip horizontal + rotate 90 CW).
    Transverse = 7,
    /// Rotate 270 degrees clockwise (90 CCW).
    Rotate270CW = 8,
}

impl Orientation {
    /// Returns true if this orientation swaps width and height dimensions.
    #[inline]
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Orientation::Transpose
                | Orientation::Rotate90CW
                | Orientation::Transverse
                | Orientation::Rotate270CW
        )
    }
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        match value {
            1 => Orientation::Normal,
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }
}

/// Container-level facts read from an encoded image without decoding pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMetadata {
    /// Stored width in pixels (before orientation correction).
    pub width: u32,
    /// Stored height in pixels (before orientation correction).
    pub height: u32,
    /// Container format as guessed from the magic bytes.
    pub format: Option<ImageFormat>,
    /// EXIF orientation.
    pub orientation: Orientation,
}

impl ImageMetadata {
    /// Get the effective dimensions after orientation correction.
    pub fn oriented_dimensions(&self) -> (u32, u32) {
        if self.orientation.swaps_dimensions() {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }
}

/// An owned, encoded image (JPEG, PNG, ...).
///
/// Stages never mutate a buffer; they consume one and produce a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    bytes: Vec<u8>,
}

impl ImageBuffer {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<Vec<u8>> for ImageBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl AsRef<[u8]> for ImageBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Raw RGB pixel grid used by stages that need per-byte access.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// RGB pixel data in row-major order (3 bytes per pixel).
    pub pixels: Vec<u8>,
}

impl PixelBuffer {
    /// Flatten any working image into a normalized 3-channel buffer.
    ///
    /// Alpha, if present, is discarded.
    pub fn from_image(img: &DynamicImage) -> Self {
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        Self {
            width,
            height,
            pixels: rgb.into_raw(),
        }
    }

    /// Number of bytes a well-formed buffer of these dimensions holds.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    /// Rebuild an image. Returns `None` when the buffer length does not
    /// match the dimensions.
    pub fn into_image(self) -> Option<DynamicImage> {
        RgbImage::from_raw(self.width, self.height, self.pixels).map(DynamicImage::ImageRgb8)
    }

    /// Check if this is an empty/invalid buffer.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }
}
