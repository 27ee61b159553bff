//! Decoder for JSON tag lists written by external metadata tools
//!
//! Two shapes are accepted:
//! - an array of `{ "key": "EXIF:Make", "value": "Canon", "container": "EXIF" }` records
//!   (`container` optional, derived from the key prefix when missing)
//! - a flat object `{ "EXIF:Make": "Canon", ... }`
//!
//! Non-string values are stringified; records with malformed keys are skipped.

use std::path::PathBuf;

use async_trait::async_trait;
use privlens_core::{Container, Tag};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::decoder::TagDecoder;
use crate::error::Result;
use crate::input::SourceFile;

#[derive(Debug, Deserialize)]
struct TagRecord {
    key: String,
    value: Value,
    #[serde(default)]
    container: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TagList {
    Records(Vec<TagRecord>),
    Map(serde_json::Map<String, Value>),
}

#[derive(Debug, Clone)]
enum Origin {
    Path(PathBuf),
    Inline(Vec<u8>),
}

/// Supplies tags decoded elsewhere, for any file
#[derive(Debug, Clone)]
pub struct JsonTagDecoder {
    origin: Origin,
}

impl JsonTagDecoder {
    /// Read the tag list from `path` when decoding
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            origin: Origin::Path(path.into()),
        }
    }

    pub fn from_slice(json: impl Into<Vec<u8>>) -> Self {
        Self {
            origin: Origin::Inline(json.into()),
        }
    }
}

#[async_trait]
impl TagDecoder for JsonTagDecoder {
    fn name(&self) -> &str {
        "json-tags"
    }

    fn supports(&self, _file: &SourceFile) -> bool {
        true
    }

    async fn decode(&self, file: &SourceFile) -> Result<Vec<Tag>> {
        let tags = match &self.origin {
            Origin::Path(path) => parse_tag_list(&tokio::fs::read(path).await?)?,
            Origin::Inline(json) => parse_tag_list(json)?,
        };
        debug!(file = %file.name, count = tags.len(), "loaded external tag list");
        Ok(tags)
    }
}

pub fn parse_tag_list(json: &[u8]) -> Result<Vec<Tag>> {
    let list: TagList = serde_json::from_slice(json)?;
    let records: Vec<TagRecord> = match list {
        TagList::Records(records) => records,
        TagList::Map(map) => map
            .into_iter()
            .map(|(key, value)| TagRecord {
                key,
                value,
                container: None,
            })
            .collect(),
    };

    let tags = records
        .into_iter()
        .filter_map(|record| {
            let value = stringify(record.value);
            let tag = match record.container {
                Some(container) => record
                    .key
                    .split_once(':')
                    .map(|(_, field)| Tag::new(Container::from(container), field, value))
                    .ok_or_else(|| privlens_core::CoreError::InvalidTagKey(record.key.clone())),
                None => Tag::from_key(&record.key, value),
            };
            tag.map_err(|err| warn!(%err, "skipping tag record")).ok()
        })
        .collect();
    Ok(tags)
}

fn stringify(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Array(items) => items.into_iter().map(stringify).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;

    #[test]
    fn test_record_list() {
        let tags = parse_tag_list(
            br#"[
                {"key": "PDF:Author", "value": "Jane Doe", "container": "PDF"},
                {"key": "XMP:Rating", "value": 5},
                {"key": "broken", "value": "x"}
            ]"#,
        )
        .unwrap();

        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].container, Container::Pdf);
        assert_eq!(tags[0].value, "Jane Doe");
        assert_eq!(tags[1].key, "XMP:Rating");
        assert_eq!(tags[1].value, "5");
    }

    #[test]
    fn test_flat_object() {
        let tags = parse_tag_list(br#"{"DOCX:creator": "jdoe", "DOCX:keywords": ["a", "b"]}"#).unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].container, Container::Docx);
        assert_eq!(tags[1].value, "a, b");
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(parse_tag_list(b"[1, 2"), Err(DecodeError::Json(_))));
    }

    #[tokio::test]
    async fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tags.json");
        std::fs::write(&path, br#"{"PDF:Creator": "Writer"}"#).unwrap();

        let file = SourceFile::new("doc.pdf", "application/pdf", Vec::new());
        let tags = JsonTagDecoder::from_path(&path).decode(&file).await.unwrap();
        assert_eq!(tags[0].key, "PDF:Creator");

        let missing = JsonTagDecoder::from_path(dir.path().join("nope.json"));
        assert!(matches!(missing.decode(&file).await, Err(DecodeError::Io(_))));
    }
}
