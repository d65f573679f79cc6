//! Base64 / data-URI payload decoding.
//!
//! Input arrives from loosely-typed clients, so decoding is lenient: headers
//! are stripped, stray characters are dropped and padding is optional. Only
//! an absent or empty result is rejected. Whether the bytes form a valid
//! image is left to the pipeline.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;

use super::{DecodeError, ImageBuffer};

/// Marker separating a data-URI header from its payload.
const BASE64_MARKER: &str = "base64,";

/// Standard alphabet, padding stripped before decoding, trailing bits tolerated.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::RequireNone)
        .with_decode_allow_trailing_bits(true),
);

/// Decode a base64 string, optionally prefixed with a data-URI header.
///
/// # Errors
///
/// * `DecodeError::Empty` if nothing remains after the header is removed
/// * `DecodeError::NoData` if decoding produces zero bytes
pub fn decode(input: &str) -> Result<ImageBuffer, DecodeError> {
    let payload = strip_header(input);
    if payload.trim().is_empty() {
        return Err(DecodeError::Empty);
    }

    let cleaned = sanitize(payload);
    let bytes = LENIENT
        .decode(cleaned.as_bytes())
        .map_err(|e| DecodeError::InvalidBase64(e.to_string()))?;

    if bytes.is_empty() {
        return Err(DecodeError::NoData);
    }

    tracing::debug!(
        input_len = input.len(),
        decoded_len = bytes.len(),
        "decoded base64 payload"
    );
    Ok(ImageBuffer::new(bytes))
}

/// Decode an optional request field. `None` maps to `DecodeError::Missing`.
pub fn decode_field(input: Option<&str>) -> Result<ImageBuffer, DecodeError> {
    match input {
        Some(value) => decode(value),
        None => Err(DecodeError::Missing),
    }
}

/// Remove a `data:<mime>;base64,` header or a bare `base64,` marker.
fn strip_header(input: &str) -> &str {
    let trimmed = input.trim_start();
    match trimmed.find(BASE64_MARKER) {
        Some(idx) => {
            let head = &trimmed[..idx];
            if head.is_empty() || head.starts_with("data:") {
                &trimmed[idx + BASE64_MARKER.len()..]
            } else {
                trimmed
            }
        }
        None => trimmed,
    }
}

/// Keep only base64 alphabet characters.
///
/// URL-safe characters are mapped onto the standard alphabet, padding and
/// everything else is dropped. A single dangling character cannot encode a
/// byte and is discarded.
fn sanitize(payload: &str) -> String {
    let mut cleaned: String = payload
        .chars()
        .filter_map(|c| match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '+' | '/' => Some(c),
            '-' => Some('+'),
            '_' => Some('/'),
            _ => None,
        })
        .collect();

    if cleaned.len() % 4 == 1 {
        cleaned.pop();
    }
    cleaned
}
