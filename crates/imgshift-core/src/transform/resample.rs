//! Forced re-sampling: shrink slightly, then restore the original size.
//!
//! Every output pixel is re-interpolated while the visible size stays the
//! same. The shrink target is 99.5% of each edge with a 10px floor, and the
//! image is fit inside that box with its aspect ratio preserved.

use image::DynamicImage;

use crate::decode::FilterType;

/// Fraction of each edge kept by the shrink pass.
pub const SHRINK_RATIO: f64 = 0.995;

/// Smallest edge the shrink pass may produce.
pub const MIN_SHRINK_EDGE: u32 = 10;

/// Compute the shrink box for an image of the given size.
pub fn shrink_target(width: u32, height: u32) -> (u32, u32) {
    let shrink = |edge: u32| ((edge as f64 * SHRINK_RATIO).floor() as u32).max(MIN_SHRINK_EDGE);
    (shrink(width), shrink(height))
}

/// Shrink `image` into the 99.5% box, then resize it back to exactly
/// `width` x `height`.
pub fn force_resample(
    image: &DynamicImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> DynamicImage {
    let (box_w, box_h) = shrink_target(width, height);
    let (fit_w, fit_h) = fit_inside(image.width(), image.height(), box_w, box_h);

    tracing::debug!(
        from = ?(image.width(), image.height()),
        via = ?(fit_w, fit_h),
        to = ?(width, height),
        "forced resample"
    );

    let filter = filter.to_image_filter();
    image
        .resize_exact(fit_w, fit_h, filter)
        .resize_exact(width, height, filter)
}

/// Calculate dimensions that fit within `box_w` x `box_h` while preserving
/// aspect ratio. Either edge may grow if the source is smaller than the box.
pub fn fit_inside(width: u32, height: u32, box_w: u32, box_h: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }

    let scale = (box_w as f64 / width as f64).min(box_h as f64 / height as f64);
    let new_w = (width as f64 * scale).round() as u32;
    let new_h = (height as f64 * scale).round() as u32;
    (new_w.clamp(1, box_w.max(1)), new_h.clamp(1, box_h.max(1)))
}
