//! Output encoding for imgshift.
//!
//! This module provides functionality for:
//! - Choosing the output container and JPEG quality from a resolved config
//! - Encoding working images to JPEG or PNG
//!
//! Unsupported target formats fall back to JPEG at the base quality with no
//! randomization.

mod jpeg;
mod png;

use image::DynamicImage;
use rand::Rng;
use serde::Serialize;
use thiserror::Error;

use crate::config::{PipelineConfig, TargetFormat};

pub use jpeg::{
    encode_jpeg, encode_jpeg_image, select_quality, QUALITY_CEILING, QUALITY_FLOOR, QUALITY_SPREAD,
};
pub use png::encode_png;

/// Errors that can occur during encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 3), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The underlying encoder failed
    #[error("{format} encoding failed: {message}")]
    Failed {
        format: &'static str,
        message: String,
    },
}

/// Container actually written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
        }
    }
}

/// Resolved encoding decision for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodePlan {
    Jpeg { quality: u8 },
    Png,
}

impl EncodePlan {
    /// Decide the container and quality. Randomness is only consumed for
    /// JPEG output with `vary_quality` set.
    pub fn from_config<R: Rng>(config: &PipelineConfig, rng: &mut R) -> Self {
        match &config.target_format {
            TargetFormat::Jpeg => EncodePlan::Jpeg {
                quality: select_quality(config.base_jpeg_quality, config.vary_quality, rng),
            },
            TargetFormat::Png => EncodePlan::Png,
            TargetFormat::Unsupported(name) => {
                tracing::warn!(
                    target_format = %name,
                    "unsupported output format, falling back to jpeg"
                );
                EncodePlan::Jpeg {
                    quality: config.base_jpeg_quality.clamp(1, 100),
                }
            }
        }
    }

    pub fn format(&self) -> OutputFormat {
        match self {
            EncodePlan::Jpeg { .. } => OutputFormat::Jpeg,
            EncodePlan::Png => OutputFormat::Png,
        }
    }

    pub fn quality(&self) -> Option<u8> {
        match self {
            EncodePlan::Jpeg { quality } => Some(*quality),
            EncodePlan::Png => None,
        }
    }

    /// Encode `image` according to this plan.
    pub fn encode(&self, image: &DynamicImage) -> Result<Vec<u8>, EncodeError> {
        match self {
            EncodePlan::Jpeg { quality } => encode_jpeg_image(image, *quality),
            EncodePlan::Png => encode_png(image),
        }
    }
}
