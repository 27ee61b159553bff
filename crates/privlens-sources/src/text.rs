//! Text-like file detection and bounded text extraction

use crate::input::SourceFile;

pub const TEXT_MEDIA_TYPES: &[&str] = &[
    "application/json",
    "application/javascript",
    "application/xml",
];

/// Whether the raw bytes of `file` should be scanned as text
pub fn is_text_like(file: &SourceFile, extensions: &[String]) -> bool {
    let media_type = file.media_type.trim().to_ascii_lowercase();
    if media_type.starts_with("text/") || TEXT_MEDIA_TYPES.contains(&media_type.as_str()) {
        return true;
    }
    file.extension()
        .is_some_and(|ext| extensions.iter().any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(&ext)))
}

/// Decoded text of at most `max_bytes` input bytes, and whether input was cut
pub fn bounded_text(bytes: &[u8], max_bytes: usize) -> (String, bool) {
    let truncated = bytes.len() > max_bytes;
    let prefix = if truncated { &bytes[..max_bytes] } else { bytes };
    (String::from_utf8_lossy(prefix).into_owned(), truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extensions() -> Vec<String> {
        ["txt", "log", "csv"].iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_text_like_by_media_type() {
        let exts = extensions();
        assert!(is_text_like(&SourceFile::new("a", "text/plain", Vec::new()), &exts));
        assert!(is_text_like(&SourceFile::new("a", "Application/JSON", Vec::new()), &exts));
        assert!(!is_text_like(&SourceFile::new("a.jpg", "image/jpeg", Vec::new()), &exts));
    }

    #[test]
    fn test_text_like_by_extension() {
        let file = SourceFile::new("server.LOG", "application/octet-stream", Vec::new());
        assert!(is_text_like(&file, &extensions()));
        assert!(!is_text_like(&file, &[]));
        assert!(is_text_like(&file, &[".log".to_string()]));
    }

    #[test]
    fn test_bounded_text() {
        assert_eq!(bounded_text(b"hello", 10), ("hello".to_string(), false));
        assert_eq!(bounded_text(b"hello", 4), ("hell".to_string(), true));

        // a cut through a multi-byte char decodes lossily
        let (text, truncated) = bounded_text("héllo".as_bytes(), 2);
        assert!(truncated);
        assert_eq!(text, "h\u{FFFD}");
    }
}
