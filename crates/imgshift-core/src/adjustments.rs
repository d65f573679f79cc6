//! Per-pixel color stages: modulation and posterization.
//!
//! Both operate on the color channels of an RGB or RGBA working image in
//! place. Alpha is never touched.
//!
//! ## Modulation order
//! 1. Brightness
//! 2. Saturation
//! 3. Hue rotation

use image::DynamicImage;
use rand::Rng;

use crate::decode::normalize;

/// Lower and upper bound of the random brightness/saturation factors.
pub const MODULATION_RANGE: (f32, f32) = (0.99, 1.01);

/// Largest hue rotation drawn, in degrees. Larger bounds wrap around anyway.
pub const MAX_HUE_SHIFT: f32 = 180.0;

/// Color modulation factors drawn for one invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Modulation {
    /// Brightness multiplier
    pub brightness: f32,
    /// Saturation multiplier (1.0 = unchanged)
    pub saturation: f32,
    /// Hue rotation in degrees
    pub hue_degrees: f32,
}

impl Default for Modulation {
    fn default() -> Self {
        Self {
            brightness: 1.0,
            saturation: 1.0,
            hue_degrees: 0.0,
        }
    }
}

impl Modulation {
    /// Draw brightness and saturation independently from
    /// [`MODULATION_RANGE`], and a hue shift from `[-hue_max, +hue_max]`
    /// with `hue_max` capped at [`MAX_HUE_SHIFT`].
    pub fn random<R: Rng>(rng: &mut R, hue_max: f32) -> Self {
        let (lo, hi) = MODULATION_RANGE;
        let hue_max = hue_max.min(MAX_HUE_SHIFT);
        let brightness = rng.gen_range(lo..=hi);
        let saturation = rng.gen_range(lo..=hi);
        let hue_degrees = if hue_max > 0.0 {
            rng.gen_range(-hue_max..=hue_max)
        } else {
            0.0
        };

        Self {
            brightness,
            saturation,
            hue_degrees,
        }
    }

    /// Check if applying these factors would leave pixels unchanged.
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

/// Apply brightness, saturation and hue modulation in place.
pub fn apply_modulation(image: &mut DynamicImage, modulation: &Modulation) {
    if modulation.is_identity() {
        return;
    }

    let hue = HueMatrix::new(modulation.hue_degrees);

    for_each_color(image, |chunk| {
        let mut r = chunk[0] as f32 / 255.0;
        let mut g = chunk[1] as f32 / 255.0;
        let mut b = chunk[2] as f32 / 255.0;

        (r, g, b) = (
            r * modulation.brightness,
            g * modulation.brightness,
            b * modulation.brightness,
        );
        (r, g, b) = apply_saturation(r, g, b, modulation.saturation);
        if let Some(matrix) = &hue {
            (r, g, b) = matrix.apply(r, g, b);
        }

        chunk[0] = to_u8(r);
        chunk[1] = to_u8(g);
        chunk[2] = to_u8(b);
    });
}

/// Quantize each color channel to `levels` evenly spaced values.
///
/// `levels <= 1` or `levels >= 256` leaves the image unchanged.
pub fn apply_posterize(image: &mut DynamicImage, levels: u32) {
    if levels <= 1 || levels >= 256 {
        return;
    }

    let lut = posterize_lut(levels);
    for_each_color(image, |chunk| {
        chunk[0] = lut[chunk[0] as usize];
        chunk[1] = lut[chunk[1] as usize];
        chunk[2] = lut[chunk[2] as usize];
    });
}

/// Build a 256-entry lookup table mapping each value to its nearest level.
fn posterize_lut(levels: u32) -> [u8; 256] {
    let step = 255.0 / (levels - 1) as f32;
    let mut lut = [0u8; 256];
    for (value, slot) in lut.iter_mut().enumerate() {
        let level = (value as f32 / step).round();
        *slot = (level * step).round().clamp(0.0, 255.0) as u8;
    }
    lut
}

/// Run `f` over the RGB part of every pixel.
fn for_each_color(image: &mut DynamicImage, mut f: impl FnMut(&mut [u8])) {
    if !matches!(image, DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_)) {
        *image = normalize(image.clone());
    }

    match image {
        DynamicImage::ImageRgb8(buf) => buf.chunks_exact_mut(3).for_each(&mut f),
        DynamicImage::ImageRgba8(buf) => buf.chunks_exact_mut(4).for_each(&mut f),
        _ => {}
    }
}

#[inline]
fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Calculate luminance using ITU-R BT.709 coefficients.
#[inline]
fn calculate_luminance(r: f32, g: f32, b: f32) -> f32 {
    0.2126 * r + 0.7152 * g + 0.0722 * b
}

/// Scale chroma around the pixel's luminance.
#[inline]
fn apply_saturation(r: f32, g: f32, b: f32, factor: f32) -> (f32, f32, f32) {
    if factor == 1.0 {
        return (r, g, b);
    }
    let gray = calculate_luminance(r, g, b);
    (
        gray + (r - gray) * factor,
        gray + (g - gray) * factor,
        gray + (b - gray) * factor,
    )
}

/// Luminance-preserving hue rotation matrix.
struct HueMatrix([[f32; 3]; 3]);

impl HueMatrix {
    /// Returns `None` for a zero rotation.
    fn new(degrees: f32) -> Option<Self> {
        if degrees.abs() < f32::EPSILON {
            return None;
        }
        let (sin, cos) = degrees.to_radians().sin_cos();
        Some(Self([
            [
                0.213 + cos * 0.787 - sin * 0.213,
                0.715 - cos * 0.715 - sin * 0.715,
                0.072 - cos * 0.072 + sin * 0.928,
            ],
            [
                0.213 - cos * 0.213 + sin * 0.143,
                0.715 + cos * 0.285 + sin * 0.140,
                0.072 - cos * 0.072 - sin * 0.283,
            ],
            [
                0.213 - cos * 0.213 - sin * 0.787,
                0.715 - cos * 0.715 + sin * 0.715,
                0.072 + cos * 0.928 + sin * 0.072,
            ],
        ]))
    }

    #[inline]
    fn apply(&self, r: f32, g: f32, b: f32) -> (f32, f32, f32) {
        let m = &self.0;
        (
            m[0][0] * r + m[0][1] * g + m[0][2] * b,
            m[1][0] * r + m[1][1] * g + m[1][2] * b,
            m[2][0] * r + m[2][1] * g + m[2][2] * b,
        )
    }
}
