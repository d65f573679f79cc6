//! Input decoding for imgshift.
//!
//! This module provides functionality for:
//! - Decoding base64 / data-URI payloads into an [`ImageBuffer`]
//! - Probing container metadata (dimensions, format, orientation)
//! - Decoding pixels into a working image with EXIF orientation applied
//!
//! # Examples
//!
//! ```ignore
//! use imgshift_core::decode::{decode, probe};
//!
//! let buffer = decode("data:image/png;base64,iVBORw0KGgo...")?;
//! let meta = probe(&buffer)?;
//! println!("{}x{}", meta.width, meta.height);
//! ```

mod container;
mod payload;
mod types;

pub use container::{decode_image, normalize, probe};
pub use payload::{decode, decode_field};
pub use types::{
    DecodeError, FilterType, ImageBuffer, ImageMetadata, MetadataError, Orientation, PixelBuffer,
};
