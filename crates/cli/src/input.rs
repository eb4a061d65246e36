//! Reading command inputs from disk.

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::Path;

/// Turn an image argument into something a vision model can fetch.
///
/// URLs and `data:` URIs pass through; anything else is read as a local
/// file and inlined as a base64 `data:` URI.
pub fn image_ref(image: &str) -> Result<String> {
    let trimmed = image.trim();
    if is_remote(trimmed) {
        return Ok(trimmed.to_string());
    }

    let path = Path::new(trimmed);
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(data_uri(mime_type(path), &bytes))
}

fn is_remote(image: &str) -> bool {
    let lower = image.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("data:")
}

fn mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}

pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Read a UTF-8 text file.
pub fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
