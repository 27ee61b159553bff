//! Sensitive-text scanner
//!
//! Applies every rule of a [`PatternRegistry`] to decoded text, validates and
//! normalizes candidates, and accumulates deduplicated findings for one file.

use std::collections::HashSet;

use privlens_core::Finding;
use tracing::debug;

use crate::registry::{NUMERIC_IDENTITY_LABELS, NUMERIC_PRIORITY_LABELS, PHONE, PatternRegistry, PatternRule};
use crate::validators::normalize_digits;

/// Default bound on scanned text (2 MiB)
pub const DEFAULT_MAX_SCAN_BYTES: usize = 2 * 1024 * 1024;

/// Normalized identity of a candidate value
pub fn normalize_value(label: &str, value: &str) -> String {
    let raw = value.trim();
    if NUMERIC_IDENTITY_LABELS.contains(&label) {
        normalize_digits(raw)
    } else {
        raw.to_lowercase()
    }
}

/// Accumulating finding set owned by the caller for the duration of one file
#[derive(Debug, Clone, Default)]
pub struct FindingSet {
    findings: Vec<Finding>,
    seen: HashSet<(String, String)>,
    numeric_tokens: HashSet<String>,
    truncated: bool,
}

impl FindingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a candidate; returns false when it was empty or a duplicate
    pub fn register(&mut self, label: &str, raw_value: &str, severity_weight: f64) -> bool {
        let value = raw_value.trim();
        if value.is_empty() {
            return false;
        }
        let normalized = normalize_value(label, value);
        if normalized.is_empty() {
            return false;
        }
        if label == PHONE && self.numeric_tokens.contains(&normalized) {
            debug!(label, "suppressed phone candidate shadowed by numeric identifier");
            return false;
        }
        if !self.seen.insert((label.to_string(), normalized.clone())) {
            return false;
        }
        if NUMERIC_PRIORITY_LABELS.contains(&label) {
            self.numeric_tokens.insert(normalized.clone());
        }

        self.findings.push(Finding {
            label: label.to_string(),
            raw_value: value.to_string(),
            normalized_value: normalized,
            severity_weight,
        });
        true
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn into_findings(self) -> Vec<Finding> {
        self.findings
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// Whether any scanned input was cut at the byte bound
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    pub fn total_weight(&self) -> f64 {
        self.findings.iter().map(|f| f.severity_weight).sum()
    }

    /// Findings grouped by label in first-seen order
    pub fn grouped(&self) -> Vec<(&str, Vec<&Finding>)> {
        let mut groups: Vec<(&str, Vec<&Finding>)> = Vec::new();
        for finding in &self.findings {
            match groups.iter_mut().find(|(label, _)| *label == finding.label) {
                Some((_, items)) => items.push(finding),
                None => groups.push((&finding.label, vec![finding])),
            }
        }
        groups
    }
}

/// Result of one `scan_into` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOutcome {
    pub accepted: usize,
    pub truncated: bool,
}

pub struct Scanner<'r> {
    registry: &'r PatternRegistry,
    max_bytes: usize,
}

impl<'r> Scanner<'r> {
    pub fn new(registry: &'r PatternRegistry) -> Self {
        Self {
            registry,
            max_bytes: DEFAULT_MAX_SCAN_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Scan text into a fresh finding set
    pub fn scan(&self, text: &str) -> Vec<Finding> {
        let mut set = FindingSet::new();
        self.scan_into(text, &mut set);
        set.into_findings()
    }

    /// Scan text, appending to a caller-owned finding set
    pub fn scan_into(&self, text: &str, set: &mut FindingSet) -> ScanOutcome {
        let (text, truncated) = bounded_prefix(text, self.max_bytes);
        if truncated {
            debug!(max_bytes = self.max_bytes, "scan input truncated");
            set.truncated = true;
        }

        let mut accepted = 0;
        for rule in self.registry.rules() {
            for candidate in candidates(rule, text) {
                if !rule.accepts(candidate) {
                    debug!(label = rule.name, "candidate rejected by validator");
                    continue;
                }
                if set.register(rule.name, candidate, rule.severity_weight) {
                    accepted += 1;
                }
            }
        }

        ScanOutcome { accepted, truncated }
    }
}

/// Matched values of one rule, non-overlapping, left to right
fn candidates<'t>(rule: &PatternRule, text: &'t str) -> Vec<&'t str> {
    if !rule.uses_capture_group {
        return rule.matcher.find_iter(text).map(|m| m.as_str()).collect();
    }

    rule.matcher
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        // the captured value must not run into a following digit
        .filter(|m| {
            !text[m.end()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_digit())
        })
        .map(|m| m.as_str())
        .collect()
}

/// Cut `text` to at most `max_bytes`, backing off to a char boundary
fn bounded_prefix(text: &str, max_bytes: usize) -> (&str, bool) {
    if text.len() <= max_bytes {
        return (text, false);
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    (&text[..end], true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{CREDIT_CARD, EMAIL, IMEI, IMSI, IPV4, SSN};

    fn labels(findings: &[Finding]) -> Vec<&str> {
        findings.iter().map(|f| f.label.as_str()).collect()
    }

    #[test]
    fn test_email_and_ipv4_scenario() {
        let registry = PatternRegistry::builtin().only(&[EMAIL, IPV4]);
        let findings = Scanner::new(&registry).scan("Contact me at a@b.com or 192.168.1.5");

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].label, EMAIL);
        assert_eq!(findings[0].raw_value, "a@b.com");
        assert_eq!(findings[1].label, IPV4);
        assert_eq!(findings[1].raw_value, "192.168.1.5");
    }

    #[test]
    fn test_duplicates_are_dropped() {
        let registry = PatternRegistry::builtin().only(&[EMAIL]);
        let findings = Scanner::new(&registry).scan("Jane@Example.com wrote to jane@example.com twice");

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].normalized_value, "jane@example.com");
    }

    #[test]
    fn test_values_touching_non_latin_text() {
        let cards = PatternRegistry::builtin().only(&[CREDIT_CARD]);
        let findings = Scanner::new(&cards).scan("カード番号4111111111111111です");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].normalized_value, "4111111111111111");

        let emails = PatternRegistry::builtin().only(&[EMAIL]);
        let findings = Scanner::new(&emails).scan("почтаjane@example.comспасибо");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].raw_value, "jane@example.com");
    }

    #[test]
    fn test_invalid_ipv4_rejected() {
        let registry = PatternRegistry::builtin().only(&[IPV4]);
        assert!(Scanner::new(&registry).scan("version 300.1.2.3").is_empty());
    }

    #[test]
    fn test_credit_card_suppresses_phone() {
        let mut set = FindingSet::new();
        set.register(CREDIT_CARD, "4111 1111 1111 1111", 3.0);
        assert!(!set.register(PHONE, "4111-1111-1111-1111", 1.5));
        assert!(set.register(PHONE, "415-555-2671", 1.5));
        assert_eq!(labels(set.findings()), vec![CREDIT_CARD, PHONE]);
    }

    #[test]
    fn test_card_number_found_by_full_registry() {
        let findings = Scanner::new(PatternRegistry::builtin()).scan("card: 4111 1111 1111 1111");
        let card = findings.iter().find(|f| f.label == CREDIT_CARD).unwrap();
        assert_eq!(card.normalized_value, "4111111111111111");
    }

    #[test]
    fn test_imei_and_imsi_do_not_collide() {
        let registry = PatternRegistry::builtin().only(&[IMEI, IMSI]);
        let findings = Scanner::new(&registry).scan("imei 490154203237518 imsi 310150123456789");

        assert_eq!(labels(&findings), vec![IMEI, IMSI]);
        assert_eq!(findings[0].normalized_value, "490154203237518");
    }

    #[test]
    fn test_phone_extracted_from_prose() {
        let registry = PatternRegistry::builtin().only(&[PHONE]);
        let findings = Scanner::new(&registry).scan("Call me at (415) 555-2671 tomorrow");

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].raw_value, "(415) 555-2671");
        assert_eq!(findings[0].normalized_value, "4155552671");
    }

    #[test]
    fn test_phone_followed_by_digit_is_skipped() {
        let registry = PatternRegistry::builtin().only(&[PHONE]);
        assert!(Scanner::new(&registry).scan("id 415-555-2671999").is_empty());
    }

    #[test]
    fn test_ssn_normalizes_to_digits() {
        let registry = PatternRegistry::builtin().only(&[SSN]);
        let findings = Scanner::new(&registry).scan("SSN 078-05-1120 and again 078-05-1120");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].normalized_value, "078051120");
    }

    #[test]
    fn test_truncation_is_recorded() {
        let registry = PatternRegistry::builtin().only(&[EMAIL]);
        let scanner = Scanner::new(&registry).with_max_bytes(16);
        let mut set = FindingSet::new();

        let outcome = scanner.scan_into("padding padding padding a@b.com", &mut set);
        assert!(outcome.truncated);
        assert!(set.truncated());
        assert!(set.is_empty());
    }

    #[test]
    fn test_bounded_prefix_respects_char_boundary() {
        let (prefix, truncated) = bounded_prefix("aé", 2);
        assert!(truncated);
        assert_eq!(prefix, "a");
    }

    #[test]
    fn test_grouped_keeps_first_seen_order() {
        let mut set = FindingSet::new();
        set.register(EMAIL, "a@b.com", 1.0);
        set.register(IPV4, "10.0.0.1", 0.5);
        set.register(EMAIL, "c@d.com", 1.0);

        let groups = set.grouped();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, EMAIL);
        assert_eq!(groups[0].1.len(), 2);
        assert!((set.total_weight() - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_whitespace_candidate_discarded() {
        let mut set = FindingSet::new();
        assert!(!set.register(EMAIL, "   ", 1.0));
        assert!(set.is_empty());
    }
}
