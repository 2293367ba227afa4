//! Turns image payloads into values usable as an `<img src>`

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Normalise an image payload.
///
/// URLs and data URIs pass through untouched. Anything else is taken to be
/// raw base64, which is wrapped in a data URI with a sniffed MIME type.
/// Payloads that are empty or do not decode fall back to `placeholder`.
pub fn image_source(payload: &str, placeholder: &str) -> String {
    let payload = payload.trim();
    if payload.is_empty() {
        return placeholder.to_string();
    }

    if payload.starts_with("data:")
        || payload.starts_with("http://")
        || payload.starts_with("https://")
    {
        return payload.to_string();
    }

    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    match sniff_base64(&compact) {
        Ok(mime) => format!("data:{};base64,{}", mime, compact),
        Err(e) => {
            tracing::warn!("Image payload is not valid base64 ({}), using placeholder", e);
            placeholder.to_string()
        }
    }
}

/// Base64 characters decoded per step; a multiple of 4 so only the last
/// chunk may carry padding
const DECODE_CHUNK: usize = 4096;

/// Check that `encoded` is valid base64 and sniff the MIME type from its
/// leading bytes, decoding through a fixed buffer instead of the whole image
fn sniff_base64(encoded: &str) -> Result<&'static str, base64::DecodeSliceError> {
    let mut buffer = [0u8; DECODE_CHUNK / 4 * 3];
    let mut mime = None;

    for chunk in encoded.as_bytes().chunks(DECODE_CHUNK) {
        let decoded = STANDARD.decode_slice(chunk, &mut buffer)?;
        if mime.is_none() {
            mime = Some(sniff_mime(&buffer[..decoded]));
        }
    }

    Ok(mime.unwrap_or_else(|| sniff_mime(&[])))
}

/// Guess an image MIME type from its magic bytes
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        "image/png"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if bytes.starts_with(b"GIF8") {
        "image/gif"
    } else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else if bytes.starts_with(b"BM") {
        "image/bmp"
    } else {
        "application/octet-stream"
    }
}
