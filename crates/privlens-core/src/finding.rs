//! Finding domain model

use serde::{Deserialize, Serialize};

/// A validated occurrence of a sensitive pattern in text.
///
/// `normalized_value` is the identity used for deduplication and is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub label: String,
    pub raw_value: String,
    pub normalized_value: String,
    pub severity_weight: f64,
}
