//! Analysis pipeline and per-file sessions for privlens

pub mod error;
pub mod inspector;
pub mod report;
pub mod session;
pub mod workbench;

pub use error::{EngineError, Result};
pub use inspector::Inspector;
pub use report::{AnalysisReport, FindingGroup, PrivacyStatus, SkippedDecoder};
pub use session::{AnalysisSession, RemovedTag, clean_file_name};
pub use workbench::Workbench;
