//! Pipeline configuration: partial per-request options and the resolved
//! config the stages read.
//!
//! Defaults are a plain value returned by [`PipelineConfig::default`]. Each
//! call to [`PipelineConfig::resolve`] builds a new config, so no request can
//! observe another request's overrides.

use serde::{Deserialize, Serialize};

/// Which noise stage runs. Exactly one is active per config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NoiseStrategy {
    /// Gaussian noise filter at `noise_sigma`.
    #[default]
    Library,
    /// Uniform per-byte noise in `[-manual_noise_amount, +manual_noise_amount]`.
    #[serde(alias = "manual")]
    ManualPixel,
    /// No noise stage.
    None,
}

/// Requested output container.
///
/// Unknown names are preserved so the encoder can log them before falling
/// back to JPEG.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TargetFormat {
    #[default]
    Jpeg,
    Png,
    Unsupported(String),
}

impl From<&str> for TargetFormat {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => TargetFormat::Jpeg,
            "png" => TargetFormat::Png,
            _ => TargetFormat::Unsupported(value.to_string()),
        }
    }
}

impl From<String> for TargetFormat {
    fn from(value: String) -> Self {
        TargetFormat::from(value.as_str())
    }
}

impl From<TargetFormat> for String {
    fn from(value: TargetFormat) -> Self {
        match value {
            TargetFormat::Jpeg => "jpeg".to_string(),
            TargetFormat::Png => "png".to_string(),
            TargetFormat::Unsupported(name) => name,
        }
    }
}

/// Caller-supplied overrides. Every field is optional; absent fields keep
/// their default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOptions {
    pub force_resize: Option<bool>,
    pub noise_strategy: Option<NoiseStrategy>,
    pub noise_sigma: Option<f32>,
    pub manual_noise_amount: Option<f32>,
    pub blur_sigma: Option<f32>,
    pub vary_quality: Option<bool>,
    pub base_jpeg_quality: Option<i32>,
    pub modulate_color: Option<bool>,
    pub hue_shift_degrees: Option<f32>,
    pub posterize_levels: Option<i32>,
    pub median_filter_size: Option<i32>,
    pub sharpen_sigma: Option<f32>,
    pub rotation_degrees: Option<f32>,
    pub target_format: Option<TargetFormat>,
}

/// Fully resolved pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Shrink to 99.5% and restore the original size
    pub force_resize: bool,
    pub noise_strategy: NoiseStrategy,
    /// Stddev of the library Gaussian noise
    pub noise_sigma: f32,
    /// Half-range of the manual uniform noise
    pub manual_noise_amount: f32,
    /// Gaussian blur sigma; 0 disables
    pub blur_sigma: f32,
    /// Randomize JPEG quality within ±5 of the base, clamped to [70, 95]
    pub vary_quality: bool,
    /// JPEG quality (1-100)
    pub base_jpeg_quality: u8,
    /// Random ±1% brightness and saturation shift
    pub modulate_color: bool,
    /// Maximum random hue rotation in degrees; 0 disables
    pub hue_shift_degrees: f32,
    /// Levels per channel; values <= 1 disable
    pub posterize_levels: i32,
    /// Median window; must be odd and >= 3 to apply, 0 disables
    pub median_filter_size: i32,
    /// Unsharp mask sigma; 0 disables
    pub sharpen_sigma: f32,
    /// Maximum random rotation in degrees; 0 disables
    pub rotation_degrees: f32,
    pub target_format: TargetFormat,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            force_resize: true,
            noise_strategy: NoiseStrategy::Library,
            noise_sigma: 10.0,
            manual_noise_amount: 8.0,
            blur_sigma: 0.6,
            vary_quality: true,
            base_jpeg_quality: 85,
            modulate_color: true,
            hue_shift_degrees: 0.0,
            posterize_levels: 24,
            median_filter_size: 0,
            sharpen_sigma: 0.0,
            rotation_degrees: 0.0,
            target_format: TargetFormat::Jpeg,
        }
    }
}

impl PipelineConfig {
    /// Merge `overrides` over `defaults`, field by field.
    ///
    /// Non-finite floats are ignored and the quality is clamped to 1-100.
    pub fn resolve(defaults: &PipelineConfig, overrides: &PipelineOptions) -> PipelineConfig {
        let float = |value: Option<f32>, fallback: f32| -> f32 {
            value.filter(|v| v.is_finite()).unwrap_or(fallback)
        };

        PipelineConfig {
            force_resize: overrides.force_resize.unwrap_or(defaults.force_resize),
            noise_strategy: overrides.noise_strategy.unwrap_or(defaults.noise_strategy),
            noise_sigma: float(overrides.noise_sigma, defaults.noise_sigma),
            manual_noise_amount: float(overrides.manual_noise_amount, defaults.manual_noise_amount),
            blur_sigma: float(overrides.blur_sigma, defaults.blur_sigma),
            vary_quality: overrides.vary_quality.unwrap_or(defaults.vary_quality),
            base_jpeg_quality: overrides
                .base_jpeg_quality
                .map(|q| q.clamp(1, 100) as u8)
                .unwrap_or(defaults.base_jpeg_quality),
            modulate_color: overrides.modulate_color.unwrap_or(defaults.modulate_color),
            hue_shift_degrees: float(overrides.hue_shift_degrees, defaults.hue_shift_degrees),
            posterize_levels: overrides.posterize_levels.unwrap_or(defaults.posterize_levels),
            median_filter_size: overrides
                .median_filter_size
                .unwrap_or(defaults.median_filter_size),
            sharpen_sigma: float(overrides.sharpen_sigma, defaults.sharpen_sigma),
            rotation_degrees: float(overrides.rotation_degrees, defaults.rotation_degrees),
            target_format: overrides
                .target_format
                .clone()
                .unwrap_or_else(|| defaults.target_format.clone()),
        }
    }

    /// Resolve `overrides` over the built-in defaults.
    pub fn from_options(overrides: &PipelineOptions) -> PipelineConfig {
        Self::resolve(&PipelineConfig::default(), overrides)
    }

    /// Set the magnitude of whichever noise strategy is active.
    pub fn with_noise_magnitude(mut self, magnitude: f32) -> Self {
        if !magnitude.is_finite() {
            return self;
        }
        match self.noise_strategy {
            NoiseStrategy::Library => self.noise_sigma = magnitude,
            NoiseStrategy::ManualPixel => self.manual_noise_amount = magnitude,
            NoiseStrategy::None => {}
        }
        self
    }

    /// Magnitude of the active noise strategy, or 0 when noise is off.
    pub fn noise_magnitude(&self) -> f32 {
        match self.noise_strategy {
            NoiseStrategy::Library => self.noise_sigma,
            NoiseStrategy::ManualPixel => self.manual_noise_amount,
            NoiseStrategy::None => 0.0,
        }
    }
}
