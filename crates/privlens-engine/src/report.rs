//! Analysis report handed to presentation

use privlens_security::{FindingSet, PrivacyScore};

/// Values shown per finding label before collapsing into a count
pub const MAX_GROUP_VALUES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivacyStatus {
    /// No tags and no findings
    Clean,
    MetadataPresent,
    /// Any finding, or any tag classified sensitive
    Sensitive,
}

impl PrivacyStatus {
    pub fn from_counts(tag_count: usize, finding_count: usize, sensitive_tags: usize) -> Self {
        if finding_count > 0 || sensitive_tags > 0 {
            PrivacyStatus::Sensitive
        } else if tag_count > 0 {
            PrivacyStatus::MetadataPresent
        } else {
            PrivacyStatus::Clean
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrivacyStatus::Clean => "clean",
            PrivacyStatus::MetadataPresent => "metadata present",
            PrivacyStatus::Sensitive => "sensitive",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FindingGroup {
    pub label: String,
    pub values: Vec<String>,
    /// Findings beyond [`MAX_GROUP_VALUES`]
    pub overflow: usize,
    pub weight: f64,
}

impl FindingGroup {
    pub fn count(&self) -> usize {
        self.values.len() + self.overflow
    }

    pub fn from_set(findings: &FindingSet) -> Vec<Self> {
        findings
            .grouped()
            .into_iter()
            .map(|(label, items)| FindingGroup {
                label: label.to_string(),
                values: items
                    .iter()
                    .take(MAX_GROUP_VALUES)
                    .map(|f| f.raw_value.clone())
                    .collect(),
                overflow: items.len().saturating_sub(MAX_GROUP_VALUES),
                weight: items.iter().map(|f| f.severity_weight).sum(),
            })
            .collect()
    }
}

/// A decoder that failed; analysis continued without its tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDecoder {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub file_name: String,
    pub media_type: String,
    pub size: usize,
    pub status: PrivacyStatus,
    pub score: PrivacyScore,
    pub tag_count: usize,
    pub sensitive_tags: Vec<String>,
    pub warning_tags: Vec<String>,
    pub findings: Vec<FindingGroup>,
    pub finding_count: usize,
    /// Scanned text was cut at the configured byte bound
    pub truncated: bool,
    pub skipped_decoders: Vec<SkippedDecoder>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_counts() {
        assert_eq!(PrivacyStatus::from_counts(0, 0, 0), PrivacyStatus::Clean);
        assert_eq!(PrivacyStatus::from_counts(3, 0, 0), PrivacyStatus::MetadataPresent);
        assert_eq!(PrivacyStatus::from_counts(3, 0, 1), PrivacyStatus::Sensitive);
        assert_eq!(PrivacyStatus::from_counts(0, 1, 0), PrivacyStatus::Sensitive);
    }

    #[test]
    fn test_groups_collapse_overflow() {
        let mut set = FindingSet::new();
        for i in 0..7 {
            set.register("Email", &format!("user{i}@example.com"), 1.0);
        }
        set.register("IPv4", "10.0.0.1", 0.5);

        let groups = FindingGroup::from_set(&set);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].label, "Email");
        assert_eq!(groups[0].values.len(), MAX_GROUP_VALUES);
        assert_eq!(groups[0].overflow, 2);
        assert_eq!(groups[0].count(), 7);
        assert_eq!(groups[1].values, vec!["10.0.0.1"]);
    }
}
