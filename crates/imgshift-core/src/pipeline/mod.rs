//! The image transformation pipeline.
//!
//! ## Stage order
//! 1. Forced resample (shrink to 99.5%, restore size)
//! 2. Gaussian blur
//! 3. Noise (library Gaussian, manual per-byte, or none)
//! 4. Color modulation (brightness, saturation, optional hue)
//! 5. Posterize
//! 6. Median filter, then optional unsharp mask and rotation
//! 7. Encode (JPEG or PNG)
//! 8. Metadata scrub
//!
//! Stages never run out of order. Every run resolves its own randomness, so
//! two runs over the same input are not expected to produce the same bytes.

mod error;
mod state;

use image::DynamicImage;
use rand::Rng;

use crate::adjustments::{apply_modulation, apply_posterize, Modulation};
use crate::config::{NoiseStrategy, PipelineConfig, PipelineOptions};
use crate::decode::{decode_image, probe, FilterType, ImageBuffer, PixelBuffer};
use crate::encode::{EncodePlan, OutputFormat};
use crate::filters::{apply_blur, apply_median, apply_sharpen, MedianWindow};
use crate::metadata::scrub;
use crate::noise::{apply_gaussian_noise, perturb_pixels};
use crate::transform::{force_resample, rotate_same_canvas};

pub use error::{ProcessingError, Stage, StageError};
pub use state::PipelineState;

/// Output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineResult {
    /// Final encoded, scrubbed bytes
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    pub mime_type: &'static str,
    pub extension: &'static str,
    /// Realized JPEG quality; `None` for PNG
    pub quality: Option<u8>,
    pub width: u32,
    pub height: u32,
}

impl PipelineResult {
    pub fn into_buffer(self) -> ImageBuffer {
        ImageBuffer::new(self.bytes)
    }
}

/// Resolve `options` over the defaults and run the pipeline.
pub fn process(
    image: &ImageBuffer,
    options: &PipelineOptions,
) -> Result<PipelineResult, ProcessingError> {
    process_with_config(image, &PipelineConfig::from_options(options))
}

/// Run the pipeline with an already resolved config and a fresh
/// thread-local RNG.
pub fn process_with_config(
    image: &ImageBuffer,
    config: &PipelineConfig,
) -> Result<PipelineResult, ProcessingError> {
    process_with_rng(image, config, &mut rand::thread_rng())
}

/// Run the pipeline drawing all randomness from `rng`.
pub fn process_with_rng<R: Rng>(
    image: &ImageBuffer,
    config: &PipelineConfig,
    rng: &mut R,
) -> Result<PipelineResult, ProcessingError> {
    run(image, config, rng, perturb_pixels)
}

/// Run the pipeline with a caller-supplied manual noise perturbation.
///
/// `perturb` receives the flattened RGB buffer, the noise amount and the
/// RNG. Its output is rebuilt into an image; if that fails the pre-noise
/// image is kept and the run continues.
#[tracing::instrument(level = "debug", skip_all, fields(input_bytes = image.len()))]
pub fn run<R, F>(
    image: &ImageBuffer,
    config: &PipelineConfig,
    rng: &mut R,
    perturb: F,
) -> Result<PipelineResult, ProcessingError>
where
    R: Rng,
    F: FnOnce(PixelBuffer, f32, &mut R) -> PixelBuffer,
{
    let original = match probe(image) {
        Ok(meta) => {
            tracing::debug!(
                width = meta.width,
                height = meta.height,
                format = ?meta.format,
                orientation = ?meta.orientation,
                "probed input"
            );
            Some(meta.oriented_dimensions())
        }
        Err(err) => {
            tracing::warn!(error = %err, "metadata probe failed, skipping size-dependent stages");
            None
        }
    };

    let mut working = decode_image(image).map_err(|e| ProcessingError::stage(Stage::Decode, e))?;

    if config.force_resize {
        match original {
            Some((width, height)) => {
                working = force_resample(&working, width, height, FilterType::Lanczos3);
            }
            None => tracing::debug!(stage = %Stage::Resample, "skipped, original dimensions unknown"),
        }
    }

    if config.blur_sigma > 0.0 {
        tracing::debug!(stage = %Stage::Blur, sigma = config.blur_sigma);
        working = apply_blur(&working, config.blur_sigma);
    }

    working = apply_noise(working, config, rng, perturb);

    if config.modulate_color {
        let modulation = Modulation::random(rng, config.hue_shift_degrees);
        tracing::debug!(
            stage = %Stage::Modulate,
            brightness = modulation.brightness,
            saturation = modulation.saturation,
            hue = modulation.hue_degrees,
            "random modulation"
        );
        apply_modulation(&mut working, &modulation);
    }

    if config.posterize_levels > 1 {
        tracing::debug!(stage = %Stage::Posterize, levels = config.posterize_levels);
        apply_posterize(&mut working, config.posterize_levels as u32);
    }

    match MedianWindow::from_size(config.median_filter_size) {
        MedianWindow::Off => {}
        MedianWindow::Apply(size) => {
            tracing::debug!(stage = %Stage::Median, size);
            working = apply_median(&working, size);
        }
        MedianWindow::Invalid(size) => {
            tracing::warn!(
                stage = %Stage::Median,
                size,
                "window size must be odd and at least 3, skipping"
            );
        }
    }

    if config.sharpen_sigma > 0.0 {
        tracing::debug!(stage = %Stage::Sharpen, sigma = config.sharpen_sigma);
        working = apply_sharpen(&working, config.sharpen_sigma);
    }

    if config.rotation_degrees > 0.0 {
        let max = config.rotation_degrees as f64;
        let angle = rng.gen_range(-max..=max);
        tracing::debug!(stage = %Stage::Rotate, angle);
        working = rotate_same_canvas(&working, angle);
    }

    let plan = EncodePlan::from_config(config, rng);
    let format = plan.format();
    let encoded = plan.encode(&working)?;
    let bytes = scrub(encoded, format)?;

    let (width, height) = (working.width(), working.height());
    tracing::info!(
        width,
        height,
        format = format.extension(),
        quality = ?plan.quality(),
        output_bytes = bytes.len(),
        "processed image"
    );

    Ok(PipelineResult {
        bytes,
        format,
        mime_type: format.mime_type(),
        extension: format.extension(),
        quality: plan.quality(),
        width,
        height,
    })
}

fn apply_noise<R, F>(
    image: DynamicImage,
    config: &PipelineConfig,
    rng: &mut R,
    perturb: F,
) -> DynamicImage
where
    R: Rng,
    F: FnOnce(PixelBuffer, f32, &mut R) -> PixelBuffer,
{
    match config.noise_strategy {
        NoiseStrategy::Library if config.noise_sigma > 0.0 => {
            let seed: u64 = rng.gen();
            tracing::debug!(stage = %Stage::Noise, sigma = config.noise_sigma, "gaussian");
            apply_gaussian_noise(&image, config.noise_sigma, seed)
        }
        NoiseStrategy::ManualPixel if config.manual_noise_amount > 0.0 => {
            tracing::debug!(stage = %Stage::Noise, amount = config.manual_noise_amount, "manual pixel");
            match manual_noise(&image, config.manual_noise_amount, rng, perturb) {
                Ok(noisy) => noisy,
                Err(err) => {
                    tracing::warn!(
                        stage = %Stage::Noise,
                        error = %err,
                        "manual noise failed, keeping pre-noise image"
                    );
                    image
                }
            }
        }
        _ => image,
    }
}

/// Flatten to RGB, perturb, rebuild. Alpha does not survive this stage.
fn manual_noise<R, F>(
    image: &DynamicImage,
    amount: f32,
    rng: &mut R,
    perturb: F,
) -> Result<DynamicImage, StageError>
where
    R: Rng,
    F: FnOnce(PixelBuffer, f32, &mut R) -> PixelBuffer,
{
    let raw = PipelineState::Decoded(image.clone()).into_raw()?;
    let noisy = perturb(raw, amount, rng);
    PipelineState::Raw(noisy).into_decoded()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TargetFormat;
    use crate::encode::encode_png;
    use image::{Rgb, RgbImage};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 5 % 256) as u8, 128])
        }))
    }

    fn png_buffer(width: u32, height: u32) -> ImageBuffer {
        ImageBuffer::new(encode_png(&gradient(width, height)).unwrap())
    }

    fn quiet_config() -> PipelineConfig {
        PipelineConfig {
            force_resize: false,
            noise_strategy: NoiseStrategy::None,
            blur_sigma: 0.0,
            vary_quality: false,
            modulate_color: false,
            posterize_levels: 0,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_default_run_produces_jpeg() {
        let mut rng = StdRng::seed_from_u64(7);
        let result = process_with_rng(&png_buffer(40, 30), &PipelineConfig::default(), &mut rng)
            .unwrap();

        assert_eq!(result.format, OutputFormat::Jpeg);
        assert_eq!(result.mime_type, "image/jpeg");
        assert_eq!(result.extension, "jpg");
        assert_eq!((result.width, result.height), (40, 30));
        assert!((70..=95).contains(&result.quality.unwrap()));
    }

    #[test]
    fn test_png_target_has_no_quality() {
        let mut rng = StdRng::seed_from_u64(7);
        let config = PipelineConfig {
            target_format: TargetFormat::Png,
            ..quiet_config()
        };
        let result = process_with_rng(&png_buffer(8, 8), &config, &mut rng).unwrap();

        assert_eq!(result.format, OutputFormat::Png);
        assert_eq!(result.quality, None);
        assert_eq!(&result.bytes[1..4], b"PNG");
    }

    #[test]
    fn test_quiet_png_run_is_lossless() {
        let mut rng = StdRng::seed_from_u64(1);
        let config = PipelineConfig {
            target_format: TargetFormat::Png,
            ..quiet_config()
        };
        let result = process_with_rng(&png_buffer(16, 16), &config, &mut rng).unwrap();
        let decoded = image::load_from_memory(&result.bytes).unwrap();

        assert_eq!(decoded.to_rgb8().into_raw(), gradient(16, 16).to_rgb8().into_raw());
    }

    #[test]
    fn test_undecodable_input_is_decode_stage_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = process_with_rng(
            &ImageBuffer::new(b"not an image".to_vec()),
            &PipelineConfig::default(),
            &mut rng,
        )
        .unwrap_err();

        assert_eq!(err.failed_stage(), Stage::Decode);
    }

    #[test]
    fn test_manual_noise_perturbation_is_applied() {
        let mut rng = StdRng::seed_from_u64(3);
        let config = PipelineConfig {
            noise_strategy: NoiseStrategy::ManualPixel,
            target_format: TargetFormat::Png,
            ..quiet_config()
        };
        let result = run(&png_buffer(4, 4), &config, &mut rng, |mut buffer, _, _| {
            buffer.pixels.iter_mut().for_each(|p| *p = 200);
            buffer
        })
        .unwrap();

        let decoded = image::load_from_memory(&result.bytes).unwrap().to_rgb8();
        assert!(decoded.pixels().all(|p| p.0 == [200, 200, 200]));
    }

    #[test]
    fn test_manual_noise_failure_keeps_pre_noise_image() {
        let mut rng = StdRng::seed_from_u64(3);
        let config = PipelineConfig {
            noise_strategy: NoiseStrategy::ManualPixel,
            target_format: TargetFormat::Png,
            ..quiet_config()
        };
        let result = run(&png_buffer(6, 6), &config, &mut rng, |mut buffer, _, _| {
            buffer.pixels.truncate(5);
            buffer
        })
        .unwrap();

        let decoded = image::load_from_memory(&result.bytes).unwrap();
        assert_eq!(decoded.to_rgb8().into_raw(), gradient(6, 6).to_rgb8().into_raw());
    }

    #[test]
    fn test_perturb_not_called_for_other_strategies() {
        let mut rng = StdRng::seed_from_u64(3);
        let config = PipelineConfig {
            noise_strategy: NoiseStrategy::Library,
            ..quiet_config()
        };
        let result = run(&png_buffer(6, 6), &config, &mut rng, |_, _, _| {
            panic!("manual perturbation must not run for library noise")
        });
        assert!(result.is_ok());
    }

    #[test]
    fn test_even_median_size_is_skipped() {
        let mut rng = StdRng::seed_from_u64(5);
        let config = PipelineConfig {
            median_filter_size: 4,
            target_format: TargetFormat::Png,
            ..quiet_config()
        };
        let result = process_with_rng(&png_buffer(10, 10), &config, &mut rng).unwrap();
        let decoded = image::load_from_memory(&result.bytes).unwrap();

        assert_eq!(decoded.to_rgb8().into_raw(), gradient(10, 10).to_rgb8().into_raw());
    }

    #[test]
    fn test_optional_stages_preserve_dimensions() {
        let mut rng = StdRng::seed_from_u64(11);
        let config = PipelineConfig {
            hue_shift_degrees: 8.0,
            median_filter_size: 3,
            sharpen_sigma: 1.0,
            rotation_degrees: 3.0,
            ..PipelineConfig::default()
        };
        let result = process_with_rng(&png_buffer(33, 21), &config, &mut rng).unwrap();
        assert_eq!((result.width, result.height), (33, 21));

        let decoded = image::load_from_memory(&result.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (33, 21));
    }
}
