//! Holder of the single active session

use std::sync::Arc;

use privlens_sources::SourceFile;
use tokio::task::JoinHandle;
use tracing::info;

use crate::error::{EngineError, Result};
use crate::inspector::Inspector;
use crate::session::AnalysisSession;

/// At most one file is open; opening another cancels any analysis still in
/// flight and drops the previous session.
pub struct Workbench {
    inspector: Arc<Inspector>,
    session: Option<AnalysisSession>,
    pending: Option<JoinHandle<AnalysisSession>>,
}

impl Workbench {
    pub fn new(inspector: Inspector) -> Self {
        Self {
            inspector: Arc::new(inspector),
            session: None,
            pending: None,
        }
    }

    pub fn inspector(&self) -> &Inspector {
        &self.inspector
    }

    /// Start analyzing `file` in the background
    pub fn open(&mut self, file: SourceFile) {
        if let Some(stale) = self.pending.take() {
            stale.abort();
            info!("cancelled stale analysis");
        }
        self.session = None;

        let inspector = self.inspector.clone();
        self.pending = Some(tokio::spawn(async move { inspector.analyze(file).await }));
    }

    /// Wait for the pending analysis, if any, and return the active session
    pub async fn ready(&mut self) -> Result<&mut AnalysisSession> {
        if let Some(pending) = self.pending.take() {
            let session = pending.await.map_err(|e| {
                if e.is_cancelled() {
                    EngineError::Cancelled
                } else {
                    EngineError::Other(anyhow::anyhow!("analysis task failed: {e}"))
                }
            })?;
            self.session = Some(session);
        }
        self.session.as_mut().ok_or(EngineError::NoActiveSession)
    }

    /// Active session, without waiting for a pending analysis
    pub fn session(&self) -> Option<&AnalysisSession> {
        self.session.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop the active session and cancel any pending analysis
    pub fn close(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
        self.session = None;
    }
}

impl Drop for Workbench {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(name: &str, body: &str) -> SourceFile {
        SourceFile::new(name, "text/plain", body.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn test_ready_without_open() {
        let mut bench = Workbench::new(Inspector::new());
        assert!(matches!(bench.ready().await, Err(EngineError::NoActiveSession)));
    }

    #[tokio::test]
    async fn test_second_open_replaces_first() {
        let mut bench = Workbench::new(Inspector::new());
        bench.open(text("first.txt", "a@b.com"));
        bench.open(text("second.txt", "nothing"));
        assert!(bench.is_pending());

        let session = bench.ready().await.unwrap();
        assert_eq!(session.file().name, "second.txt");
        assert_eq!(session.report().finding_count, 0);
        assert!(!bench.is_pending());
    }

    #[tokio::test]
    async fn test_open_discards_previous_session() {
        let mut bench = Workbench::new(Inspector::new());
        bench.open(text("first.txt", "a@b.com"));
        let first = bench.ready().await.unwrap().id();

        bench.open(text("second.txt", "x"));
        assert!(bench.session().is_none());
        let second = bench.ready().await.unwrap().id();
        assert_ne!(first, second);

        bench.close();
        assert!(bench.session().is_none());
    }
}
