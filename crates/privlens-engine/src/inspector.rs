//! Analysis pipeline: decode -> scan -> classify -> score

use std::sync::Arc;

use privlens_config::Config;
use privlens_core::{Tag, TagStore};
use privlens_security::{FindingSet, PatternRegistry, PrivacyScore, Scanner, TagClass, TagClassifier};
use privlens_sources::text::{bounded_text, is_text_like};
use privlens_sources::{DecoderRegistry, SourceFile, TagDecoder};
use tracing::{debug, info, warn};

use crate::report::{AnalysisReport, FindingGroup, PrivacyStatus, SkippedDecoder};
use crate::session::AnalysisSession;

/// Stateless analyzer; one instance serves every file
#[derive(Debug, Clone)]
pub struct Inspector {
    registry: Arc<PatternRegistry>,
    decoders: DecoderRegistry,
    classifier: TagClassifier,
    max_scan_bytes: usize,
    text_extensions: Vec<String>,
    tag_penalties: bool,
}

impl Inspector {
    pub fn new() -> Self {
        Self::from_config(&Config::default())
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            registry: Arc::new(PatternRegistry::builtin().clone()),
            decoders: DecoderRegistry::with_defaults(),
            classifier: TagClassifier::new(config.keywords.sensitive.clone(), config.keywords.warning.clone()),
            max_scan_bytes: config.scan.max_scan_bytes,
            text_extensions: config.scan.text_extensions.clone(),
            tag_penalties: config.scoring.tag_penalties,
        }
    }

    pub fn with_registry(mut self, registry: PatternRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn TagDecoder>) -> Self {
        self.decoders.register(decoder);
        self
    }

    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    pub fn decoders(&self) -> &DecoderRegistry {
        &self.decoders
    }

    /// Full analysis of a freshly loaded file
    pub async fn analyze(&self, file: SourceFile) -> AnalysisSession {
        info!(file = %file.name, media_type = %file.media_type, size = file.len(), "analyzing file");

        let (tags, skipped) = self.decode_tags(&file).await;
        let store: TagStore = tags.into_iter().collect();
        let (findings, report) = self.evaluate(&file, &store, skipped);

        info!(
            file = %file.name,
            status = report.status.as_str(),
            score = report.score.value,
            tags = report.tag_count,
            findings = report.finding_count,
            "analysis complete"
        );
        AnalysisSession::new(file, store, findings, report)
    }

    /// Run every supporting decoder; a failing decoder is skipped, not fatal
    pub async fn decode_tags(&self, file: &SourceFile) -> (Vec<Tag>, Vec<SkippedDecoder>) {
        let mut tags = Vec::new();
        let mut skipped = Vec::new();

        for decoder in self.decoders.decoders_for(file) {
            match decoder.decode(file).await {
                Ok(decoded) => {
                    debug!(decoder = decoder.name(), count = decoded.len(), "decoder finished");
                    tags.extend(decoded);
                }
                Err(err) => {
                    warn!(decoder = decoder.name(), %err, "decoder failed; continuing without it");
                    skipped.push(SkippedDecoder {
                        name: decoder.name().to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        (tags, skipped)
    }

    /// Scan, classify and score already decoded tags
    pub fn evaluate(
        &self,
        file: &SourceFile,
        tags: &TagStore,
        skipped_decoders: Vec<SkippedDecoder>,
    ) -> (FindingSet, AnalysisReport) {
        let scanner = Scanner::new(&self.registry).with_max_bytes(self.max_scan_bytes);
        let mut findings = FindingSet::new();
        let mut raw_truncated = false;

        if is_text_like(file, &self.text_extensions) {
            let (text, truncated) = bounded_text(&file.bytes, self.max_scan_bytes);
            raw_truncated = truncated;
            let outcome = scanner.scan_into(&text, &mut findings);
            debug!(accepted = outcome.accepted, "scanned file text");
        }

        let mut sensitive_tags = Vec::new();
        let mut warning_tags = Vec::new();
        let mut tag_penalty = 0.0;
        for tag in tags.iter() {
            scanner.scan_into(&tag.value, &mut findings);

            let assessment = self.classifier.classify(tag);
            tag_penalty += assessment.penalty;
            match assessment.class {
                TagClass::Sensitive => sensitive_tags.push(tag.key.clone()),
                TagClass::Warning => warning_tags.push(tag.key.clone()),
                TagClass::Neutral => {}
            }
        }

        let tag_penalty = if self.tag_penalties { tag_penalty } else { 0.0 };
        let score = PrivacyScore::compute_with_tag_penalty(findings.findings(), tags.len(), tag_penalty);

        let report = AnalysisReport {
            file_name: file.name.clone(),
            media_type: file.media_type.clone(),
            size: file.len(),
            status: PrivacyStatus::from_counts(tags.len(), findings.len(), sensitive_tags.len()),
            score,
            tag_count: tags.len(),
            sensitive_tags,
            warning_tags,
            findings: FindingGroup::from_set(&findings),
            finding_count: findings.len(),
            truncated: raw_truncated || findings.truncated(),
            skipped_decoders,
        };
        (findings, report)
    }
}

impl Default for Inspector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use privlens_core::Container;
    use privlens_security::ScoreTier;
    use privlens_sources::{DecodeError, JsonTagDecoder};

    struct BrokenDecoder;

    #[async_trait]
    impl TagDecoder for BrokenDecoder {
        fn name(&self) -> &str {
            "broken"
        }

        fn supports(&self, _file: &SourceFile) -> bool {
            true
        }

        async fn decode(&self, _file: &SourceFile) -> privlens_sources::Result<Vec<Tag>> {
            Err(DecodeError::Unavailable("tool not installed".to_string()))
        }
    }

    #[tokio::test]
    async fn test_clean_text_file() {
        let file = SourceFile::new("notes.txt", "text/plain", b"nothing to see here".to_vec());
        let session = Inspector::new().analyze(file).await;
        let report = session.report();

        assert_eq!(report.status, PrivacyStatus::Clean);
        assert_eq!(report.score.value, 10.0);
        assert_eq!(report.score.tier, ScoreTier::Excellent);
    }

    #[tokio::test]
    async fn test_text_findings_are_scored() {
        let file = SourceFile::new(
            "contacts.txt",
            "text/plain",
            b"Contact me at a@b.com or 192.168.1.5, again a@b.com".to_vec(),
        );
        let session = Inspector::new().analyze(file).await;
        let report = session.report();

        assert_eq!(report.status, PrivacyStatus::Sensitive);
        assert_eq!(report.finding_count, 2);
        assert!((report.score.value - 8.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_binary_bytes_are_not_scanned() {
        let file = SourceFile::new("blob.bin", "application/octet-stream", b"a@b.com".to_vec());
        let session = Inspector::new().analyze(file).await;
        assert_eq!(session.report().finding_count, 0);
    }

    #[tokio::test]
    async fn test_failing_decoder_is_isolated() {
        let inspector = Inspector::new()
            .with_decoder(Arc::new(BrokenDecoder))
            .with_decoder(Arc::new(JsonTagDecoder::from_slice(
                br#"{"PDF:Author": "Jane", "PDF:Producer": "Writer"}"#.to_vec(),
            )));
        let file = SourceFile::new("doc.pdf", "application/pdf", b"%PDF-1.7".to_vec());
        let session = inspector.analyze(file).await;
        let report = session.report();

        assert_eq!(report.skipped_decoders.len(), 1);
        assert_eq!(report.skipped_decoders[0].name, "broken");
        assert_eq!(report.tag_count, 2);
        assert_eq!(report.sensitive_tags, vec!["PDF:Author"]);
        assert_eq!(report.status, PrivacyStatus::Sensitive);
        assert!((report.score.value - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_tag_values_are_scanned_and_penalties_optional() {
        let store: TagStore = vec![
            Tag::new(Container::Exif, "Artist", "jane@example.com"),
            Tag::new(Container::Exif, "Make", "Canon"),
        ]
        .into_iter()
        .collect();
        let file = SourceFile::new("p.jpg", "image/jpeg", Vec::new());

        let (findings, report) = Inspector::new().evaluate(&file, &store, Vec::new());
        assert_eq!(findings.len(), 1);
        assert_eq!(report.warning_tags, vec!["EXIF:Make"]);
        assert!((report.score.value - 8.5).abs() < 1e-9);

        let mut config = Config::default();
        config.scoring.tag_penalties = false;
        let (_, report) = Inspector::from_config(&config).evaluate(&file, &store, Vec::new());
        assert!((report.score.value - 9.0).abs() < 1e-9);
        assert_eq!(report.status, PrivacyStatus::Sensitive);
    }

    #[test]
    fn test_truncation_is_recorded() {
        let mut config = Config::default();
        config.scan.max_scan_bytes = 16;
        let file = SourceFile::new("big.log", "text/plain", vec![b'x'; 64]);

        let (_, report) = Inspector::from_config(&config).evaluate(&file, &TagStore::new(), Vec::new());
        assert!(report.truncated);
    }
}
