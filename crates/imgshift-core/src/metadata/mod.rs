//! Metadata handling for encoded output.
//!
//! This module provides functionality for:
//! - Stripping EXIF, ICC, XMP and text payloads from JPEG and PNG containers
//! - Stamping a canonical 72 DPI resolution
//! - Reporting which metadata an encoded image carries

mod probe;
mod scrub;

use thiserror::Error;

pub use probe::{probe_metadata, MetadataReport};
pub use scrub::scrub;

/// Resolution written into every scrubbed output.
pub const OUTPUT_DPI: u16 = 72;

/// Errors that can occur while rewriting container metadata.
#[derive(Debug, Error)]
pub enum ScrubError {
    /// The encoded bytes could not be parsed as the expected container
    #[error("failed to parse {format} container: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    /// Re-serializing the container failed
    #[error("failed to write container: {0}")]
    Write(#[from] std::io::Error),
}
