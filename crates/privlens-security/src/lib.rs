//! Sensitive-content detection for privlens
//!
//! - Pattern registry with secondary validators
//! - Text scanner with normalization and deduplication
//! - Tag keyword classification
//! - Privacy scoring

pub mod classify;
pub mod registry;
pub mod scanner;
pub mod score;
pub mod validators;

pub use classify::{TagAssessment, TagClass, TagClassifier};
pub use registry::{PatternRegistry, PatternRule, Validator};
pub use scanner::{FindingSet, ScanOutcome, Scanner};
pub use score::{PrivacyScore, ScoreTier};
