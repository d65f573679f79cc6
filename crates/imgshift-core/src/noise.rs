//! Noise stages.
//!
//! - **Library**: Gaussian noise from `imageproc`, applied to the color
//!   channels only.
//! - **Manual**: uniform additive noise on every byte of a flattened RGB
//!   [`PixelBuffer`], clamped to `[0, 255]`.

use image::DynamicImage;
use imageproc::noise::gaussian_noise_mut;
use rand::Rng;

use crate::decode::PixelBuffer;

/// Add zero-mean Gaussian noise with standard deviation `sigma`.
///
/// Alpha is preserved for RGBA images. `seed` makes the result
/// reproducible; the pipeline draws it fresh per invocation.
pub fn apply_gaussian_noise(image: &DynamicImage, sigma: f32, seed: u64) -> DynamicImage {
    if sigma <= 0.0 {
        return image.clone();
    }
    let sigma = sigma as f64;

    match image {
        DynamicImage::ImageRgba8(rgba) => {
            let mut rgb = image.to_rgb8();
            gaussian_noise_mut(&mut rgb, 0.0, sigma, seed);

            let mut out = rgba.clone();
            for (dst, src) in out.pixels_mut().zip(rgb.pixels()) {
                dst.0[..3].copy_from_slice(&src.0);
            }
            DynamicImage::ImageRgba8(out)
        }
        other => {
            let mut rgb = other.to_rgb8();
            gaussian_noise_mut(&mut rgb, 0.0, sigma, seed);
            DynamicImage::ImageRgb8(rgb)
        }
    }
}

/// Largest manual noise amount. Any wider draw already saturates every byte.
pub const MAX_MANUAL_AMOUNT: f32 = 255.0;

/// Add independent uniform noise in `[-amount, +amount]` to every byte.
///
/// `amount` is capped at [`MAX_MANUAL_AMOUNT`].
pub fn perturb_pixels<R: Rng>(mut buffer: PixelBuffer, amount: f32, rng: &mut R) -> PixelBuffer {
    let amount = amount.abs().min(MAX_MANUAL_AMOUNT);
    if amount == 0.0 {
        return buffer;
    }

    for byte in buffer.pixels.iter_mut() {
        let delta: f32 = rng.gen_range(-amount..=amount);
        *byte = (*byte as f32 + delta).round().clamp(0.0, 255.0) as u8;
    }
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn gray(width: u32, height: u32, value: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([value; 3])))
    }

    #[test]
    fn test_gaussian_noise_changes_pixels() {
        let img = gray(32, 32, 128);
        let out = apply_gaussian_noise(&img, 10.0, 42);
        assert_eq!((out.width(), out.height()), (32, 32));
        assert_ne!(out.to_rgb8().into_raw(), img.to_rgb8().into_raw());
    }

    #[test]
    fn test_gaussian_noise_is_seeded() {
        let img = gray(16, 16, 100);
        let a = apply_gaussian_noise(&img, 5.0, 9);
        let b = apply_gaussian_noise(&img, 5.0, 9);
        assert_eq!(a.to_rgb8().into_raw(), b.to_rgb8().into_raw());
    }

    #[test]
    fn test_gaussian_noise_zero_sigma_is_noop() {
        let img = gray(4, 4, 50);
        let out = apply_gaussian_noise(&img, 0.0, 1);
        assert_eq!(out.to_rgb8().into_raw(), img.to_rgb8().into_raw());
    }

    #[test]
    fn test_gaussian_noise_preserves_alpha() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([120, 120, 120, 33])));
        let out = apply_gaussian_noise(&img, 20.0, 5);
        match out {
            DynamicImage::ImageRgba8(rgba) => assert!(rgba.pixels().all(|p| p.0[3] == 33)),
            other => panic!("expected rgba, got {:?}", other.color()),
        }
    }

    #[test]
    fn test_perturb_within_amount() {
        let mut rng = StdRng::seed_from_u64(1);
        let buffer = PixelBuffer::from_image(&gray(16, 16, 128));
        let out = perturb_pixels(buffer, 8.0, &mut rng);

        assert!(out.pixels.iter().all(|&v| (120..=136).contains(&v)));
        assert!(out.pixels.iter().any(|&v| v != 128));
    }

    #[test]
    fn test_perturb_clamps_extremes() {
        let mut rng = StdRng::seed_from_u64(2);
        let black = perturb_pixels(PixelBuffer::from_image(&gray(8, 8, 0)), 30.0, &mut rng);
        let white = perturb_pixels(PixelBuffer::from_image(&gray(8, 8, 255)), 30.0, &mut rng);

        assert!(black.pixels.iter().all(|&v| v <= 30));
        assert!(white.pixels.iter().all(|&v| v >= 225));
    }

    #[test]
    fn test_perturb_zero_amount_is_noop() {
        let mut rng = StdRng::seed_from_u64(3);
        let buffer = PixelBuffer::from_image(&gray(4, 4, 77));
        let out = perturb_pixels(buffer, 0.0, &mut rng);
        assert!(out.pixels.iter().all(|&v| v == 77));
    }

    #[test]
    fn test_perturb_huge_amount_is_capped() {
        let mut rng = StdRng::seed_from_u64(5);
        let buffer = PixelBuffer::from_image(&gray(8, 8, 128));
        let out = perturb_pixels(buffer, 3.4e38, &mut rng);

        assert_eq!(out.pixels.len(), 8 * 8 * 3);
        assert!(out.pixels.iter().any(|&v| v != 128));
    }
}
