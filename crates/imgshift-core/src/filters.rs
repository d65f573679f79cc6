//! Spatial filters: Gaussian blur, median and unsharp mask.

use image::DynamicImage;
use imageproc::filter::median_filter;

/// How a requested median window size is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MedianWindow {
    /// Size 0 (or negative): stage disabled.
    Off,
    /// Odd size >= 3: apply with this window.
    Apply(u32),
    /// Positive but even, or 1: skipped with a warning.
    Invalid(i32),
}

impl MedianWindow {
    pub fn from_size(size: i32) -> Self {
        if size <= 0 {
            MedianWindow::Off
        } else if size >= 3 && size % 2 == 1 {
            MedianWindow::Apply(size as u32)
        } else {
            MedianWindow::Invalid(size)
        }
    }
}

/// Gaussian blur. Non-positive sigma returns the input unchanged.
pub fn apply_blur(image: &DynamicImage, sigma: f32) -> DynamicImage {
    if sigma <= 0.0 {
        return image.clone();
    }
    image.blur(sigma)
}

/// Median filter over a `size` x `size` window.
///
/// The radius is capped at the image's longer edge.
pub fn apply_median(image: &DynamicImage, size: u32) -> DynamicImage {
    let radius = (size / 2).min(image.width().max(image.height()));
    if radius == 0 {
        return image.clone();
    }

    match image {
        DynamicImage::ImageRgba8(rgba) => DynamicImage::ImageRgba8(median_filter(rgba, radius, radius)),
        other => DynamicImage::ImageRgb8(median_filter(&other.to_rgb8(), radius, radius)),
    }
}

/// Unsharp mask at `sigma`, zero threshold.
pub fn apply_sharpen(image: &DynamicImage, sigma: f32) -> DynamicImage {
    if sigma <= 0.0 {
        return image.clone();
    }
    image.unsharpen(sigma, 0)
}
