//! Tile blob format detection and extension normalization.
//!
//! An MBTiles archive may declare its tile format in the metadata table
//! (`format` key); when it does not, the format is sniffed from each blob's
//! magic bytes. Recognized signatures:
//!
//! - PNG: `89 50 4E 47`
//! - JPEG: `FF D8 FF` (SOI marker)
//! - WebP: `RIFF....WEBP`
//!
//! Anything else falls back to the generic `bin` extension. Extensions are
//! normalized to lower case without a leading dot, with `jpeg` folded into
//! `jpg`.

/// Extension used when a blob matches no known signature.
pub const GENERIC_EXTENSION: &str = "bin";

/// Sniff a tile blob's format from its magic bytes.
///
/// Returns a normalized extension (`png`, `jpg`, `webp`) or
/// [`GENERIC_EXTENSION`] when the signature is unrecognized.
pub fn detect_extension(data: &[u8]) -> &'static str {
    if data.len() >= 8 {
        if data[0] == 0x89 && data[1] == 0x50 && data[2] == 0x4E && data[3] == 0x47 {
            return "png";
        }
        if data[0] == 0xFF && data[1] == 0xD8 && data[2] == 0xFF {
            return "jpg";
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return "webp";
        }
    }
    GENERIC_EXTENSION
}

/// Normalize an extension token: trim whitespace, strip a leading dot,
/// lower-case, and fold `jpeg` into `jpg`.
///
/// Returns an empty string for empty or all-whitespace input.
pub fn normalize_extension(value: &str) -> String {
    let trimmed = value.trim();
    let stripped = trimmed.strip_prefix('.').unwrap_or(trimmed);
    let lower = stripped.to_ascii_lowercase();
    if lower == "jpeg" {
        "jpg".to_string()
    } else {
        lower
    }
}

/// True if the path's extension is one the grayscale converter handles
/// (`png`, `jpg`, `jpeg`, any case).
pub fn is_supported_image_extension(path: &std::path::Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => {
            let lower = ext.to_ascii_lowercase();
            lower == "png" || lower == "jpg" || lower == "jpeg"
        }
        None => false,
    }
}

// =============================================================================
// Tests
// =============================================================================
