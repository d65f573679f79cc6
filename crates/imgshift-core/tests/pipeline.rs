use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use imgshift_core::pipeline::run;
use imgshift_core::{
    decode, probe_metadata, process, process_with_config, process_with_rng, ImageBuffer,
    NoiseStrategy, OutputFormat, PipelineConfig, PipelineOptions, TargetFormat,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn test_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            ((x + y) % 256) as u8,
        ])
    }))
}

fn encode_as(img: &DynamicImage, format: ImageFormat) -> ImageBuffer {
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, format).unwrap();
    ImageBuffer::new(bytes.into_inner())
}

fn png(width: u32, height: u32) -> ImageBuffer {
    encode_as(&test_image(width, height), ImageFormat::Png)
}

#[test]
fn default_pipeline_turns_png_into_clean_jpeg() {
    let input = png(100, 100);
    let mut rng = StdRng::seed_from_u64(2024);
    let result = process_with_rng(&input, &PipelineConfig::default(), &mut rng).unwrap();

    assert_eq!(result.format, OutputFormat::Jpeg);
    assert_eq!(result.mime_type, "image/jpeg");
    assert_eq!(result.extension, "jpg");
    assert!((70..=95).contains(&result.quality.unwrap()));

    let decoded = image::load_from_memory(&result.bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (100, 100));

    let report = probe_metadata(&result.bytes);
    assert_eq!(report.format, Some(ImageFormat::Jpeg));
    assert!(!report.has_exif);
    assert!(!report.has_icc);
    assert!(!report.has_xmp);
    assert!(report.is_clean());
    assert_eq!(report.dpi, Some(72));
}

#[test]
fn unsupported_target_format_falls_back_to_jpeg() {
    let options: PipelineOptions = serde_json::from_str(r#"{"targetFormat":"webp"}"#).unwrap();
    let result = process(&png(32, 32), &options).unwrap();

    assert_eq!(result.format, OutputFormat::Jpeg);
    assert_eq!(result.quality, Some(85));
    assert_eq!(&result.bytes[..2], &[0xFF, 0xD8]);
}

#[test]
fn png_target_keeps_alpha_and_sets_dpi() {
    let rgba = DynamicImage::ImageRgba8(RgbaImage::from_fn(20, 20, |x, _| {
        Rgba([100, 150, 200, (x * 12) as u8])
    }));
    let input = encode_as(&rgba, ImageFormat::Png);

    let options = PipelineOptions {
        target_format: Some(TargetFormat::Png),
        ..PipelineOptions::default()
    };
    let result = process(&input, &options).unwrap();

    assert_eq!(result.mime_type, "image/png");
    assert_eq!(result.quality, None);

    let decoded = image::load_from_memory(&result.bytes).unwrap();
    assert!(decoded.color().has_alpha());
    let alpha = decoded.to_rgba8().get_pixel(5, 5).0[3];
    assert!((50..=70).contains(&alpha), "alpha {alpha}");

    let report = probe_metadata(&result.bytes);
    assert!(report.is_clean());
    assert_eq!(report.dpi, Some(72));
}

#[test]
fn even_median_size_is_skipped_and_run_completes() {
    let options = PipelineOptions {
        median_filter_size: Some(4),
        ..PipelineOptions::default()
    };
    let result = process(&png(40, 40), &options).unwrap();

    let decoded = image::load_from_memory(&result.bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (40, 40));
}

#[test]
fn forced_resize_preserves_dimensions() {
    for (width, height) in [(5, 5), (10, 37), (101, 63), (640, 9)] {
        let result = process(&png(width, height), &PipelineOptions::default()).unwrap();
        let decoded = image::load_from_memory(&result.bytes).unwrap();

        assert_eq!((result.width, result.height), (width, height));
        assert_eq!((decoded.width(), decoded.height()), (width, height));
    }
}

#[test]
fn repeated_runs_are_not_byte_identical() {
    let input = png(64, 64);
    let config = PipelineConfig::default();

    let first = process_with_config(&input, &config).unwrap();
    let second = process_with_config(&input, &config).unwrap();

    assert_ne!(first.bytes, second.bytes);
    assert_eq!((first.width, first.height), (second.width, second.height));
}

#[test]
fn seeded_runs_are_reproducible() {
    let input = png(48, 30);
    let config = PipelineConfig::default();

    let a = process_with_rng(&input, &config, &mut StdRng::seed_from_u64(9)).unwrap();
    let b = process_with_rng(&input, &config, &mut StdRng::seed_from_u64(9)).unwrap();

    assert_eq!(a.bytes, b.bytes);
    assert_eq!(a.quality, b.quality);
}

#[test]
fn manual_noise_failure_still_returns_valid_image() {
    let config = PipelineConfig {
        noise_strategy: NoiseStrategy::ManualPixel,
        ..PipelineConfig::default()
    };
    let mut rng = StdRng::seed_from_u64(77);

    let result = run(&png(50, 40), &config, &mut rng, |mut buffer, _, _| {
        buffer.pixels.clear();
        buffer.width = 50;
        buffer
    })
    .unwrap();

    assert_eq!(result.format, OutputFormat::Jpeg);
    let decoded = image::load_from_memory(&result.bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (50, 40));
}

#[test]
fn manual_noise_strategy_runs_end_to_end() {
    let options: PipelineOptions =
        serde_json::from_str(r#"{"noiseStrategy":"manualPixel","manualNoiseAmount":12}"#).unwrap();
    let result = process(&png(30, 30), &options).unwrap();

    let decoded = image::load_from_memory(&result.bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (30, 30));
}

#[test]
fn huge_manual_noise_amount_is_bounded() {
    let options: PipelineOptions = serde_json::from_str(
        r#"{"noiseStrategy":"manualPixel","manualNoiseAmount":3.4e38}"#,
    )
    .unwrap();
    let result = process(&png(24, 24), &options).unwrap();

    let decoded = image::load_from_memory(&result.bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (24, 24));
}

#[test]
fn huge_hue_shift_is_bounded() {
    let options: PipelineOptions = serde_json::from_str(r#"{"hueShiftDegrees":3.4e38}"#).unwrap();
    let result = process(&png(24, 24), &options).unwrap();

    assert_eq!((result.width, result.height), (24, 24));
}

#[test]
fn all_optional_stages_enabled() {
    let options: PipelineOptions = serde_json::from_str(
        r#"{
            "hueShiftDegrees": 10,
            "medianFilterSize": 3,
            "sharpenSigma": 0.8,
            "rotationDegrees": 2,
            "varyQuality": false,
            "baseJpegQuality": 90
        }"#,
    )
    .unwrap();
    let result = process(&png(60, 45), &options).unwrap();

    assert_eq!(result.quality, Some(90));
    assert_eq!((result.width, result.height), (60, 45));
}

#[test]
fn every_stage_disabled_still_reencodes() {
    let config = PipelineConfig {
        force_resize: false,
        noise_strategy: NoiseStrategy::None,
        blur_sigma: 0.0,
        modulate_color: false,
        posterize_levels: 0,
        vary_quality: false,
        ..PipelineConfig::default()
    };
    let result = process_with_config(&png(16, 16), &config).unwrap();

    assert_eq!(result.quality, Some(85));
    assert!(probe_metadata(&result.bytes).is_clean());
}

#[test]
fn data_uri_input_decodes_and_processes() {
    let raw = png(12, 8).into_bytes();
    let uri = format!("data:image/png;base64,{}", STANDARD.encode(raw));

    let buffer = decode(&uri).unwrap();
    let result = process(&buffer, &PipelineOptions::default()).unwrap();

    assert_eq!((result.width, result.height), (12, 8));
}

#[test]
fn garbage_bytes_fail_with_processing_error() {
    let buffer = decode(&STANDARD.encode(b"plain text, not pixels")).unwrap();
    let err = process(&buffer, &PipelineOptions::default()).unwrap_err();

    assert!(err.to_string().starts_with("decode stage failed"));
}
