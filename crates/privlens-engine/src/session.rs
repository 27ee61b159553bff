//! One loaded file: its tags, findings and redaction history

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use privlens_core::{HistoryManager, HistoryState, StateKind, TagStore};
use privlens_jpeg::{RedactionOutcome, Selection};
use privlens_security::FindingSet;
use privlens_sources::SourceFile;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::inspector::Inspector;
use crate::report::AnalysisReport;

/// Value reported for a removed key that is not in the tag store
pub const UNKNOWN_VALUE: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedTag {
    pub key: String,
    pub value: String,
}

/// Owns the tag store and history of the single active file.
///
/// Constructed by [`Inspector::analyze`] and dropped when another file is opened.
#[derive(Debug)]
pub struct AnalysisSession {
    id: Uuid,
    file: SourceFile,
    tags: TagStore,
    findings: FindingSet,
    report: AnalysisReport,
    history: HistoryManager,
}

impl AnalysisSession {
    pub fn new(file: SourceFile, tags: TagStore, findings: FindingSet, report: AnalysisReport) -> Self {
        let history = HistoryManager::new(file.bytes.clone());
        Self {
            id: Uuid::new_v4(),
            file,
            tags,
            findings,
            report,
            history,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn file(&self) -> &SourceFile {
        &self.file
    }

    pub fn tags(&self) -> &TagStore {
        &self.tags
    }

    pub fn findings(&self) -> &FindingSet {
        &self.findings
    }

    pub fn report(&self) -> &AnalysisReport {
        &self.report
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn current(&self) -> &HistoryState {
        self.history.current()
    }

    /// Shared bytes of the current artifact
    pub fn artifact(&self) -> Arc<[u8]> {
        self.history.current().artifact.clone()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> &HistoryState {
        self.history.undo()
    }

    pub fn redo(&mut self) -> &HistoryState {
        self.history.redo()
    }

    /// Whether this file's format supports binary redaction
    pub fn is_redactable(&self) -> bool {
        privlens_jpeg::is_supported_media_type(&self.file.media_type)
    }

    fn ensure_redactable(&self) -> Result<()> {
        if self.is_redactable() {
            Ok(())
        } else {
            Err(EngineError::UnsupportedContainerFormat(self.file.media_type.clone()))
        }
    }

    /// Remove the selected keys from the current artifact and push the result.
    ///
    /// Keys the format cannot act on are skipped. When nothing actionable is
    /// selected the history is left alone and the current state is returned.
    pub async fn redact<I, S>(&mut self, keys: I) -> Result<&HistoryState>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ensure_redactable()?;
        let keys: Vec<String> = keys.into_iter().map(|k| k.as_ref().to_string()).collect();
        let selection = Selection::from_keys(&keys);
        for key in &selection.ignored {
            warn!(key = key.as_str(), "key cannot be removed from this format");
        }
        if selection.is_empty() {
            debug!("nothing actionable selected");
            return Ok(self.history.current());
        }

        let mut removed_keys = self.history.current().removed_keys.clone();
        removed_keys.extend(keys.into_iter().filter(|k| !selection.ignored.contains(k)));

        let artifact = self.history.current().artifact.clone();
        let outcome = run_blocking(move || privlens_jpeg::redact(&artifact, &selection)).await??;
        Ok(self.commit(outcome, removed_keys, StateKind::Selective))
    }

    /// Strip every metadata segment from the current artifact
    pub async fn full_clean(&mut self) -> Result<&HistoryState> {
        self.ensure_redactable()?;
        let removed_keys: BTreeSet<String> = self.tags.keys().map(str::to_string).collect();

        let artifact = self.history.current().artifact.clone();
        let outcome = run_blocking(move || privlens_jpeg::strip_metadata(&artifact)).await??;
        Ok(self.commit(outcome, removed_keys, StateKind::FullClean))
    }

    fn commit(&mut self, outcome: RedactionOutcome, removed_keys: BTreeSet<String>, kind: StateKind) -> &HistoryState {
        if outcome.directory_recovered {
            warn!(file = %self.file.name, "tag directory was unreadable; only whole segments were removed");
        }
        info!(
            file = %self.file.name,
            ?kind,
            removed = removed_keys.len(),
            size = outcome.bytes.len(),
            "recorded redacted artifact"
        );
        self.history.push(HistoryState::new(outcome.bytes, removed_keys, kind))
    }

    /// Keys removed to reach the current state, with their original values
    pub fn diff(&self) -> Vec<RemovedTag> {
        self.diff_for(self.history.current())
    }

    pub fn diff_for(&self, state: &HistoryState) -> Vec<RemovedTag> {
        state
            .removed_keys
            .iter()
            .map(|key| RemovedTag {
                key: key.clone(),
                value: self.tags.get(key).unwrap_or(UNKNOWN_VALUE).to_string(),
            })
            .collect()
    }

    /// Re-analyze the current artifact; removed keys are excluded even when an
    /// external decoder still reports them
    pub async fn rescan(&self, inspector: &Inspector) -> AnalysisReport {
        let state = self.history.current();
        let file = SourceFile::new(self.file.name.clone(), self.file.media_type.clone(), state.artifact.clone());

        let (tags, skipped) = inspector.decode_tags(&file).await;
        let store: TagStore = tags
            .into_iter()
            .filter(|tag| !state.removed_keys.contains(&tag.key))
            .collect();
        inspector.evaluate(&file, &store, skipped).1
    }

    /// File name for the current artifact, `<stem>_clean<ext>`
    pub fn output_name(&self) -> String {
        clean_file_name(&self.file.name)
    }
}

pub fn clean_file_name(name: &str) -> String {
    let path = Path::new(name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| name.to_string());
    match path.extension() {
        Some(ext) => format!("{}_clean.{}", stem, ext.to_string_lossy()),
        None => format!("{stem}_clean"),
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| EngineError::Other(anyhow::anyhow!("redaction task failed: {e}")))
}
