//! Metadata inspection for encoded images.

use std::io::Cursor;

use image::ImageFormat;
use img_parts::jpeg::{markers, Jpeg};
use img_parts::png::Png;
use img_parts::{Bytes, ImageEXIF, ImageICC};
use serde::Serialize;

/// Prefix of an XMP packet in a JPEG APP1 segment.
const XMP_JPEG_PREFIX: &[u8] = b"http://ns.adobe.com/xap/1.0/";

/// Keyword of an iTXt chunk carrying XMP in PNG.
const XMP_PNG_KEYWORD: &[u8] = b"XML:com.adobe.xmp";

/// PNG ancillary chunks carrying free-form text.
const PNG_TEXT_CHUNKS: [[u8; 4]; 3] = [*b"tEXt", *b"zTXt", *b"iTXt"];

/// What non-pixel data an encoded image carries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataReport {
    #[serde(skip)]
    pub format: Option<ImageFormat>,
    pub has_exif: bool,
    pub has_icc: bool,
    pub has_xmp: bool,
    /// JPEG comments or PNG text chunks
    pub has_text: bool,
    /// Declared resolution in dots per inch, if any
    pub dpi: Option<u32>,
}

impl MetadataReport {
    /// True when no EXIF, ICC, XMP or text payload is present.
    pub fn is_clean(&self) -> bool {
        !(self.has_exif || self.has_icc || self.has_xmp || self.has_text)
    }
}

/// Inspect `bytes` for embedded metadata.
///
/// Unknown or unparsable containers yield a report whose only populated
/// field is `has_exif`, as detected by the EXIF reader.
pub fn probe_metadata(bytes: &[u8]) -> MetadataReport {
    let format = image::guess_format(bytes).ok();
    let exif_readable = exif::Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .is_ok();

    let mut report = match format {
        Some(ImageFormat::Jpeg) => probe_jpeg(bytes),
        Some(ImageFormat::Png) => probe_png(bytes),
        _ => MetadataReport::default(),
    };
    report.format = format;
    report.has_exif |= exif_readable;
    report
}

fn probe_jpeg(bytes: &[u8]) -> MetadataReport {
    let Ok(jpeg) = Jpeg::from_bytes(Bytes::copy_from_slice(bytes)) else {
        return MetadataReport::default();
    };

    let mut report = MetadataReport {
        has_exif: jpeg.exif().is_some(),
        has_icc: jpeg.icc_profile().is_some(),
        ..Default::default()
    };

    for segment in jpeg.segments() {
        let contents = segment.contents();
        match segment.marker() {
            markers::APP0 => {
                if report.dpi.is_none() {
                    report.dpi = jfif_dpi(contents);
                }
            }
            markers::APP1 if contents.starts_with(XMP_JPEG_PREFIX) => report.has_xmp = true,
            markers::COM => report.has_text = true,
            _ => {}
        }
    }
    report
}

fn probe_png(bytes: &[u8]) -> MetadataReport {
    let Ok(png) = Png::from_bytes(Bytes::copy_from_slice(bytes)) else {
        return MetadataReport::default();
    };

    let mut report = MetadataReport {
        has_exif: png.exif().is_some(),
        has_icc: png.icc_profile().is_some(),
        ..Default::default()
    };

    for chunk in png.chunks() {
        let kind = chunk.kind();
        let contents = chunk.contents();
        if PNG_TEXT_CHUNKS.contains(&kind) {
            if &kind == b"iTXt" && contents.starts_with(XMP_PNG_KEYWORD) {
                report.has_xmp = true;
            } else {
                report.has_text = true;
            }
        } else if &kind == b"pHYs" {
            report.dpi = phys_dpi(contents);
        }
    }
    report
}

/// Read the density of a JFIF APP0 segment, converting to DPI.
fn jfif_dpi(contents: &[u8]) -> Option<u32> {
    if contents.len() < 12 || !contents.starts_with(b"JFIF\0") {
        return None;
    }
    let units = contents[7];
    let x_density = u16::from_be_bytes([contents[8], contents[9]]) as f64;
    match units {
        1 => Some(x_density as u32),
        2 => Some((x_density * 2.54).round() as u32),
        _ => None,
    }
}

/// Read a pHYs chunk, converting pixels per meter to DPI.
fn phys_dpi(contents: &[u8]) -> Option<u32> {
    if contents.len() < 9 || contents[8] != 1 {
        return None;
    }
    let ppm = u32::from_be_bytes([contents[0], contents[1], contents[2], contents[3]]) as f64;
    Some((ppm * 0.0254).round() as u32)
}
