//! imgshift Core - Image perturbation library
//!
//! This crate provides the core functionality for imgshift: decoding base64
//! image payloads, the ordered transformation pipeline (resample, blur,
//! noise, color modulation, posterize, median, encode), and container
//! metadata scrubbing.

pub mod adjustments;
pub mod config;
pub mod decode;
pub mod encode;
pub mod filters;
pub mod metadata;
pub mod noise;
pub mod pipeline;
pub mod transform;

pub use config::{NoiseStrategy, PipelineConfig, PipelineOptions, TargetFormat};
pub use decode::{decode, decode_field, DecodeError, ImageBuffer, MetadataError, PixelBuffer};
pub use encode::{EncodeError, OutputFormat};
pub use metadata::{probe_metadata, MetadataReport, ScrubError};
pub use pipeline::{
    process, process_with_config, process_with_rng, PipelineResult, PipelineState,
    ProcessingError, Stage, StageError,
};
