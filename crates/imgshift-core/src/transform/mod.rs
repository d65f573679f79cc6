//! Geometric stages: forced re-sampling and same-canvas rotation.
//!
//! Both stages preserve the working image's dimensions. Resample runs first
//! in the pipeline, rotation runs last before encoding.

mod resample;
mod rotation;

pub use resample::{fit_inside, force_resample, shrink_target, MIN_SHRINK_EDGE, SHRINK_RATIO};
pub use rotation::rotate_same_canvas;
