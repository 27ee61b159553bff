//! Metadata tags and the per-file tag store

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Source container a tag was decoded from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Container {
    Exif,
    Gps,
    Xmp,
    Iptc,
    Icc,
    Pdf,
    Docx,
    Other(String),
}

impl Container {
    pub fn as_str(&self) -> &str {
        match self {
            Container::Exif => "EXIF",
            Container::Gps => "GPS",
            Container::Xmp => "XMP",
            Container::Iptc => "IPTC",
            Container::Icc => "ICC",
            Container::Pdf => "PDF",
            Container::Docx => "DOCX",
            Container::Other(name) => name,
        }
    }
}

impl From<&str> for Container {
    fn from(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "EXIF" => Container::Exif,
            "GPS" => Container::Gps,
            "XMP" => Container::Xmp,
            "IPTC" => Container::Iptc,
            "ICC" => Container::Icc,
            "PDF" => Container::Pdf,
            "DOCX" => Container::Docx,
            other => Container::Other(other.to_string()),
        }
    }
}

impl From<String> for Container {
    fn from(value: String) -> Self {
        Container::from(value.as_str())
    }
}

impl From<Container> for String {
    fn from(value: Container) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structured metadata field, keyed `<CONTAINER>:<field>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
    pub container: Container,
}

impl Tag {
    pub fn new(container: Container, field: &str, value: impl Into<String>) -> Self {
        Self {
            key: format!("{}:{}", container, field),
            value: value.into(),
            container,
        }
    }

    /// Build a tag from an already composed key
    pub fn from_key(key: &str, value: impl Into<String>) -> Result<Self> {
        let (container, field) = split_key(key)?;
        Ok(Self::new(Container::from(container), field, value))
    }

    /// Field part of the key (after the container prefix)
    pub fn field(&self) -> &str {
        self.key
            .split_once(':')
            .map(|(_, field)| field)
            .unwrap_or(&self.key)
    }
}

/// Split `<CONTAINER>:<field>` into its two halves
pub fn split_key(key: &str) -> Result<(&str, &str)> {
    match key.split_once(':') {
        Some((container, field)) if !container.is_empty() && !field.is_empty() => {
            Ok((container, field))
        }
        _ => Err(CoreError::InvalidTagKey(key.to_string())),
    }
}

/// Flat tag list for the single loaded file.
///
/// Keys are opaque; a repeated key keeps its first position and takes the latest value.
#[derive(Debug, Clone, Default)]
pub struct TagStore {
    tags: Vec<Tag>,
    index: HashMap<String, usize>,
}

impl TagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the store wholesale
    pub fn load(&mut self, tags: impl IntoIterator<Item = Tag>) {
        self.tags.clear();
        self.index.clear();
        for tag in tags {
            self.insert(tag);
        }
    }

    pub fn insert(&mut self, tag: Tag) {
        match self.index.get(&tag.key) {
            Some(&pos) => self.tags[pos] = tag,
            None => {
                self.index.insert(tag.key.clone(), self.tags.len());
                self.tags.push(tag);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.index.get(key).map(|&pos| self.tags[pos].value.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(|t| t.key.as_str())
    }
}

impl FromIterator<Tag> for TagStore {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        let mut store = TagStore::new();
        store.load(iter);
        store
    }
}
