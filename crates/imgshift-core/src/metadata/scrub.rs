//! Container-level metadata removal.
//!
//! JPEG: every APPn and COM segment is dropped and a single canonical JFIF
//! APP0 declaring 72 DPI is written first.
//!
//! PNG: only critical image chunks (IHDR, PLTE, tRNS, IDAT, IEND) are kept
//! and a pHYs chunk declaring 72 DPI is inserted after IHDR.

use img_parts::jpeg::{markers, Jpeg, JpegSegment};
use img_parts::png::{Png, PngChunk};
use img_parts::Bytes;

use super::{ScrubError, OUTPUT_DPI};
use crate::encode::OutputFormat;

/// PNG chunk types that carry pixel data or are required to decode it.
const PNG_KEEP: [[u8; 4]; 5] = [*b"IHDR", *b"PLTE", *b"tRNS", *b"IDAT", *b"IEND"];

/// 0.0254 m per inch.
const METERS_PER_INCH: f64 = 0.0254;

/// Remove all embedded metadata from an encoded image and stamp the
/// canonical resolution.
pub fn scrub(bytes: Vec<u8>, format: OutputFormat) -> Result<Vec<u8>, ScrubError> {
    match format {
        OutputFormat::Jpeg => scrub_jpeg(bytes),
        OutputFormat::Png => scrub_png(bytes),
    }
}

fn scrub_jpeg(bytes: Vec<u8>) -> Result<Vec<u8>, ScrubError> {
    let mut jpeg = Jpeg::from_bytes(Bytes::from(bytes)).map_err(|e| ScrubError::Parse {
        format: "jpeg",
        message: e.to_string(),
    })?;

    let segments = jpeg.segments_mut();
    let before = segments.len();
    segments.retain(|segment| !is_metadata_marker(segment.marker()));
    let removed = before - segments.len();
    segments.insert(
        0,
        JpegSegment::new_with_contents(markers::APP0, Bytes::from(jfif_app0(OUTPUT_DPI))),
    );

    tracing::debug!(removed, dpi = OUTPUT_DPI, "scrubbed jpeg segments");

    let mut output = Vec::new();
    jpeg.encoder().write_to(&mut output)?;
    Ok(output)
}

fn scrub_png(bytes: Vec<u8>) -> Result<Vec<u8>, ScrubError> {
    let mut png = Png::from_bytes(Bytes::from(bytes)).map_err(|e| ScrubError::Parse {
        format: "png",
        message: e.to_string(),
    })?;

    let chunks = png.chunks_mut();
    let before = chunks.len();
    chunks.retain(|chunk| PNG_KEEP.contains(&chunk.kind()));
    let removed = before - chunks.len();

    let ihdr = chunks.iter().position(|chunk| &chunk.kind() == b"IHDR");
    let at = ihdr.map_or(0, |idx| idx + 1);
    chunks.insert(at, PngChunk::new(*b"pHYs", Bytes::from(phys_contents(OUTPUT_DPI))));

    tracing::debug!(removed, dpi = OUTPUT_DPI, "scrubbed png chunks");

    let mut output = Vec::new();
    png.encoder().write_to(&mut output)?;
    Ok(output)
}

/// APP0 through APP15 and comments.
fn is_metadata_marker(marker: u8) -> bool {
    (markers::APP0..=markers::APP15).contains(&marker) || marker == markers::COM
}

/// JFIF 1.01 APP0 payload with density in dots per inch and no thumbnail.
fn jfif_app0(dpi: u16) -> Vec<u8> {
    let mut contents = Vec::with_capacity(14);
    contents.extend_from_slice(b"JFIF\0");
    contents.extend_from_slice(&[1, 1]); // version 1.01
    contents.push(1); // units: dots per inch
    contents.extend_from_slice(&dpi.to_be_bytes());
    contents.extend_from_slice(&dpi.to_be_bytes());
    contents.extend_from_slice(&[0, 0]); // thumbnail 0x0
    contents
}

/// pHYs payload: pixels per meter on both axes, unit = meter.
fn phys_contents(dpi: u16) -> Vec<u8> {
    let ppm = (dpi as f64 / METERS_PER_INCH).round() as u32;
    let mut contents = Vec::with_capacity(9);
    contents.extend_from_slice(&ppm.to_be_bytes());
    contents.extend_from_slice(&ppm.to_be_bytes());
    contents.push(1);
    contents
}
