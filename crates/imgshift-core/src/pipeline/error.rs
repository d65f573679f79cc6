use std::fmt;

use thiserror::Error;

use crate::encode::EncodeError;
use crate::metadata::ScrubError;

/// Pipeline stage names, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Decode,
    Resample,
    Blur,
    Noise,
    Modulate,
    Posterize,
    Median,
    Sharpen,
    Rotate,
    Encode,
    Scrub,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Decode => "decode",
            Stage::Resample => "resample",
            Stage::Blur => "blur",
            Stage::Noise => "noise",
            Stage::Modulate => "modulate",
            Stage::Posterize => "posterize",
            Stage::Median => "median",
            Stage::Sharpen => "sharpen",
            Stage::Rotate => "rotate",
            Stage::Encode => "encode",
            Stage::Scrub => "scrub",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Failure local to a single stage.
#[derive(Debug, Error)]
pub enum StageError {
    /// Pixel buffer length does not match its dimensions
    #[error("pixel buffer holds {actual} bytes, expected {expected} for {width}x{height}")]
    InvalidPixelBuffer {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    /// Pixel buffer has a zero dimension or no data
    #[error("pixel buffer is empty")]
    EmptyPixelBuffer,

    /// The container could not be decoded into pixels
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Unrecovered failure of a pipeline run.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("{stage} stage failed: {message}")]
    Stage { stage: Stage, message: String },

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Scrub(#[from] ScrubError),
}

impl ProcessingError {
    pub fn stage(stage: Stage, err: impl fmt::Display) -> Self {
        ProcessingError::Stage {
            stage,
            message: err.to_string(),
        }
    }

    /// Name of the stage that failed.
    pub fn failed_stage(&self) -> Stage {
        match self {
            ProcessingError::Stage { stage, .. } => *stage,
            ProcessingError::Encode(_) => Stage::Encode,
            ProcessingError::Scrub(_) => Stage::Scrub,
        }
    }
}
