//! Loaded input file: raw bytes plus declared media type

use std::path::Path;
use std::sync::Arc;

use crate::error::Result;

/// Extension to media type, for files loaded from disk without a declared type
const MEDIA_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("jpe", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("heic", "image/heic"),
    ("pdf", "application/pdf"),
    ("docx", "application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
    ("json", "application/json"),
    ("js", "application/javascript"),
    ("xml", "application/xml"),
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("csv", "text/csv"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
];

const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Display name, usually the file name
    pub name: String,
    pub media_type: String,
    pub bytes: Arc<[u8]>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, deriving the media type from its extension
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self::new(name, media_type_for(path), bytes))
    }

    /// Lower-cased extension of the file name, without the dot
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

pub fn media_type_for(path: &Path) -> &'static str {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .and_then(|ext| MEDIA_TYPES.iter().find(|(e, _)| *e == ext).map(|(_, m)| *m))
        .unwrap_or(FALLBACK_MEDIA_TYPE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_for() {
        assert_eq!(media_type_for(Path::new("photo.JPG")), "image/jpeg");
        assert_eq!(media_type_for(Path::new("notes.txt")), "text/plain");
        assert_eq!(media_type_for(Path::new("blob")), FALLBACK_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.Json");
        std::fs::write(&path, b"{}").unwrap();

        let file = SourceFile::load(&path).await.unwrap();
        assert_eq!(file.name, "report.Json");
        assert_eq!(file.media_type, "application/json");
        assert_eq!(file.extension().as_deref(), Some("json"));
        assert_eq!(file.len(), 2);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SourceFile::load(dir.path().join("missing.jpg")).await.is_err());
    }
}
