//! Keyword classification of metadata tags

use privlens_core::{Container, Tag};
use serde::{Deserialize, Serialize};

const SENSITIVE_TAG_PENALTY: f64 = 1.5;
const WARNING_TAG_PENALTY: f64 = 0.5;
const DOCUMENT_AUTHOR_PENALTY: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagClass {
    Sensitive,
    Warning,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TagAssessment {
    pub class: TagClass,
    pub penalty: f64,
}

impl TagAssessment {
    const NEUTRAL: TagAssessment = TagAssessment {
        class: TagClass::Neutral,
        penalty: 0.0,
    };

    fn sensitive(penalty: f64) -> Self {
        Self {
            class: TagClass::Sensitive,
            penalty,
        }
    }
}

/// Two independent membership tests over a tag's field name
#[derive(Debug, Clone)]
pub struct TagClassifier {
    sensitive: Vec<String>,
    warning: Vec<String>,
}

impl TagClassifier {
    pub fn new(sensitive: Vec<String>, warning: Vec<String>) -> Self {
        Self { sensitive, warning }
    }

    pub fn is_sensitive_field(&self, field: &str) -> bool {
        self.sensitive.iter().any(|k| field.contains(k.as_str()))
    }

    pub fn is_warning_field(&self, field: &str) -> bool {
        self.warning.iter().any(|k| field.contains(k.as_str()))
    }

    pub fn classify(&self, tag: &Tag) -> TagAssessment {
        let field = tag.field();
        match &tag.container {
            // location data is sensitive whatever the field is called
            Container::Gps => TagAssessment::sensitive(SENSITIVE_TAG_PENALTY),
            Container::Pdf if contains_any(field, &["author", "creator"]) => {
                TagAssessment::sensitive(DOCUMENT_AUTHOR_PENALTY)
            }
            Container::Docx if contains_any(field, &["creator", "lastmodifiedby"]) => {
                TagAssessment::sensitive(DOCUMENT_AUTHOR_PENALTY)
            }
            // keyword lists only apply to EXIF fields
            Container::Exif if self.is_sensitive_field(field) => TagAssessment::sensitive(SENSITIVE_TAG_PENALTY),
            Container::Exif if self.is_warning_field(field) => TagAssessment {
                class: TagClass::Warning,
                penalty: WARNING_TAG_PENALTY,
            },
            _ => TagAssessment::NEUTRAL,
        }
    }
}

impl Default for TagClassifier {
    fn default() -> Self {
        Self::new(
            ["GPS", "Latitude", "Longitude", "Altitude", "Location"]
                .map(String::from)
                .to_vec(),
            [
                "Make",
                "Model",
                "Software",
                "SerialNumber",
                "LensSerialNumber",
                "CameraSerialNumber",
            ]
            .map(String::from)
            .to_vec(),
        )
    }
}

fn contains_any(field: &str, needles: &[&str]) -> bool {
    let lower = field.to_lowercase();
    needles.iter().any(|n| lower.contains(n))
}
