//! Small-angle rotation on a fixed canvas.
//!
//! Unlike a crop-and-expand rotation, the output keeps the source
//! dimensions. Samples that fall outside the source are clamped to the
//! nearest edge pixel, so no black corners are introduced.
//!
//! Inverse mapping is used: for each destination pixel the source position
//! is computed and sampled bilinearly.
//!
//! ```text
//! src_x = (dst_x - cx) * cos(-θ) - (dst_y - cy) * sin(-θ) + cx
//! src_y = (dst_x - cx) * sin(-θ) + (dst_y - cy) * cos(-θ) + cy
//! ```

use image::{DynamicImage, Pixel};

/// Rotate `image` about its centre by `angle_degrees` (positive =
/// counter-clockwise), keeping its dimensions.
pub fn rotate_same_canvas(image: &DynamicImage, angle_degrees: f64) -> DynamicImage {
    if angle_degrees.abs() < 0.001 || image.width() == 0 || image.height() == 0 {
        return image.clone();
    }

    match image {
        DynamicImage::ImageRgba8(img) => DynamicImage::ImageRgba8(rotate_pixels(img, angle_degrees)),
        other => DynamicImage::ImageRgb8(rotate_pixels(&other.to_rgb8(), angle_degrees)),
    }
}

fn rotate_pixels<P>(
    src: &image::ImageBuffer<P, Vec<u8>>,
    angle_degrees: f64,
) -> image::ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8>,
{
    let (width, height) = src.dimensions();

    // Negate angle for correct visual rotation direction
    let angle_rad = -angle_degrees.to_radians();
    let (sin, cos) = angle_rad.sin_cos();

    let cx = (width as f64 - 1.0) / 2.0;
    let cy = (height as f64 - 1.0) / 2.0;

    image::ImageBuffer::from_fn(width, height, |dst_x, dst_y| {
        let dx = dst_x as f64 - cx;
        let dy = dst_y as f64 - cy;

        let src_x = dx * cos - dy * sin + cx;
        let src_y = dx * sin + dy * cos + cy;

        sample_bilinear(src, src_x, src_y)
    })
}

/// Sample a pixel using bilinear interpolation with edge clamping.
fn sample_bilinear<P>(src: &image::ImageBuffer<P, Vec<u8>>, x: f64, y: f64) -> P
where
    P: Pixel<Subpixel = u8>,
{
    let max_x = (src.width() - 1) as f64;
    let max_y = (src.height() - 1) as f64;
    let x = x.clamp(0.0, max_x);
    let y = y.clamp(0.0, max_y);

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(src.width() - 1);
    let y1 = (y0 + 1).min(src.height() - 1);

    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = src.get_pixel(x0, y0).channels();
    let p10 = src.get_pixel(x1, y0).channels();
    let p01 = src.get_pixel(x0, y1).channels();
    let p11 = src.get_pixel(x1, y1).channels();

    let channels = P::CHANNEL_COUNT as usize;
    let mut out = [0u8; 4];
    for i in 0..channels {
        let v = p00[i] as f64 * (1.0 - fx) * (1.0 - fy)
            + p10[i] as f64 * fx * (1.0 - fy)
            + p01[i] as f64 * (1.0 - fx) * fy
            + p11[i] as f64 * fx * fy;
        out[i] = v.clamp(0.0, 255.0).round() as u8;
    }

    *P::from_slice(&out[..channels])
}
