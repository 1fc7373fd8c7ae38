//! Inline photo encoding.
//!
//! Photos are stored inside the record as self-contained `data:` URLs so the
//! collection never references external files.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::app_response::AppResponse;

/// Encodes raw image bytes as `data:<mime>;base64,<payload>`.
pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// MIME type guessed from a file extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}

/// Reads an image file into a `data:` URL.
pub fn read_photo(path: impl AsRef<Path>) -> Result<String, AppResponse> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| {
        AppResponse::BadRequest(format!("Cannot read photo {}: {e}", path.display()))
    })?;
    Ok(encode_data_url(mime_for_path(path), &bytes))
}

/// Splits a `data:` URL back into MIME type and bytes.
pub fn decode_data_url(url: &str) -> Result<(String, Vec<u8>), AppResponse> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| AppResponse::BadRequest("Photo is not a data URL".to_string()))?;
    let (mime, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| AppResponse::BadRequest("Photo data URL is not base64 encoded".to_string()))?;
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| AppResponse::BadRequest(format!("Invalid base64 photo payload: {e}")))?;
    Ok((mime.to_string(), bytes))
}
