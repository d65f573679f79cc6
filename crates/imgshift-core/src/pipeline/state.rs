use image::DynamicImage;

use super::StageError;
use crate::decode::{decode_image, ImageBuffer, PixelBuffer};

/// Representation of the image between two stages.
#[derive(Debug, Clone)]
pub enum PipelineState {
    /// Encoded container bytes
    Encoded(ImageBuffer),
    /// Working image (RGB8 or RGBA8)
    Decoded(DynamicImage),
    /// Flattened RGB bytes
    Raw(PixelBuffer),
}

impl PipelineState {
    /// Convert to a working image, decoding or rebuilding as needed.
    ///
    /// # Errors
    ///
    /// * `StageError::Decode` if encoded bytes cannot be decoded
    /// * `StageError::EmptyPixelBuffer` / `InvalidPixelBuffer` if a raw
    ///   buffer does not describe a valid image
    pub fn into_decoded(self) -> Result<DynamicImage, StageError> {
        match self {
            PipelineState::Encoded(buffer) => Ok(decode_image(&buffer)?),
            PipelineState::Decoded(image) => Ok(image),
            PipelineState::Raw(buffer) => rebuild(buffer),
        }
    }

    /// Convert to a flattened RGB buffer. Alpha is discarded.
    pub fn into_raw(self) -> Result<PixelBuffer, StageError> {
        match self {
            PipelineState::Raw(buffer) => Ok(buffer),
            other => Ok(PixelBuffer::from_image(&other.into_decoded()?)),
        }
    }
}

fn rebuild(buffer: PixelBuffer) -> Result<DynamicImage, StageError> {
    if buffer.is_empty() {
        return Err(StageError::EmptyPixelBuffer);
    }

    let (width, height) = (buffer.width, buffer.height);
    let expected = buffer.expected_len();
    let actual = buffer.pixels.len();
    let invalid = StageError::InvalidPixelBuffer {
        width,
        height,
        expected,
        actual,
    };

    if actual != expected {
        return Err(invalid);
    }
    buffer.into_image().ok_or(invalid)
}
