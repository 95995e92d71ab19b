//! Encoding detection and decoding of raw source bytes.
//!
//! Strategy:
//! - BOM detection (UTF-8, UTF-16 LE/BE)
//! - UTF-8 fast-path with strict validation
//! - Fallback encoding detection using chardetng
//! - Last resort: UTF-8 with replacement characters

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};

const DEFAULT_SAMPLE_SIZE: usize = 8192;

/// Detect the encoding of a byte buffer from its first `sample_size` bytes.
///
/// Returns a normalized encoding label (e.g. "utf-8", "utf-8-sig", "utf-16-le",
/// "windows-1252").
pub fn detect_encoding(bytes: &[u8], sample_size: usize) -> String {
    let sample = &bytes[..bytes.len().min(sample_size)];

    if sample.is_empty() {
        return "utf-8".to_string();
    }

    // BOM markers are the most reliable signal
    if sample.starts_with(&[0xef, 0xbb, 0xbf]) {
        return "utf-8-sig".to_string();
    }
    if sample.starts_with(&[0xff, 0xfe]) {
        return "utf-16-le".to_string();
    }
    if sample.starts_with(&[0xfe, 0xff]) {
        return "utf-16-be".to_string();
    }

    if std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }

    let mut detector = EncodingDetector::new();
    detector.feed(sample, true);
    let encoding = detector.guess(None, true);

    let name = encoding.name().to_lowercase();
    if name.contains("utf-8") || name == "ascii" {
        "utf-8".to_string()
    } else {
        name
    }
}

/// Decode source bytes to text.
///
/// Returns `(content, encoding_used)`. Never fails: undecodable sequences become
/// replacement characters.
pub fn decode_text(bytes: &[u8]) -> (String, String) {
    let detected = detect_encoding(bytes, DEFAULT_SAMPLE_SIZE);

    match detected.as_str() {
        "utf-8" => {
            if let Ok(content) = std::str::from_utf8(bytes) {
                return (content.to_string(), detected);
            }
        }
        "utf-8-sig" => {
            let (decoded, _) = UTF_8.decode_with_bom_removal(bytes);
            return (decoded.into_owned(), detected);
        }
        "utf-16-le" => {
            let (decoded, _) = UTF_16LE.decode_with_bom_removal(bytes);
            return (decoded.into_owned(), detected);
        }
        "utf-16-be" => {
            let (decoded, _) = UTF_16BE.decode_with_bom_removal(bytes);
            return (decoded.into_owned(), detected);
        }
        label => {
            if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
                let (decoded, used, _had_errors) = encoding.decode(bytes);
                return (decoded.into_owned(), used.name().to_lowercase());
            }
        }
    }

    let (decoded, _, _) = UTF_8.decode(bytes);
    (decoded.into_owned(), "utf-8".to_string())
}
