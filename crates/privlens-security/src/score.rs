//! Privacy score: bounded exposure value and its tier

use privlens_core::Finding;
use serde::{Deserialize, Serialize};

pub const BASELINE: f64 = 10.0;

/// Penalty per full block of ten tags
const TAG_VOLUME_STEP: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTier {
    Poor,
    Warning,
    Good,
    Excellent,
}

impl ScoreTier {
    pub fn from_value(value: f64) -> Self {
        if value >= 9.0 {
            ScoreTier::Excellent
        } else if value >= 7.0 {
            ScoreTier::Good
        } else if value >= 4.0 {
            ScoreTier::Warning
        } else {
            ScoreTier::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreTier::Excellent => "excellent",
            ScoreTier::Good => "good",
            ScoreTier::Warning => "warning",
            ScoreTier::Poor => "poor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrivacyScore {
    pub value: f64,
    pub tier: ScoreTier,
}

impl PrivacyScore {
    /// Score from findings and structured-tag volume
    pub fn compute(findings: &[Finding], tag_count: usize) -> Self {
        Self::compute_with_tag_penalty(findings, tag_count, 0.0)
    }

    /// Same as [`PrivacyScore::compute`], also subtracting per-tag classification penalties
    pub fn compute_with_tag_penalty(findings: &[Finding], tag_count: usize, tag_penalty: f64) -> Self {
        let finding_penalty: f64 = findings.iter().map(|f| f.severity_weight.max(0.0)).sum();
        let volume_penalty = (tag_count / 10) as f64 * TAG_VOLUME_STEP;

        let value = (BASELINE - finding_penalty - volume_penalty - tag_penalty.max(0.0)).clamp(0.0, BASELINE);
        Self {
            value,
            tier: ScoreTier::from_value(value),
        }
    }
}
