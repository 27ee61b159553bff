//! Core domain models for privlens
//!
//! This crate contains:
//! - Metadata tags and the per-file tag store
//! - Findings produced by the sensitive-text scanner
//! - The linear undo/redo history of redacted artifacts

pub mod error;
pub mod finding;
pub mod history;
pub mod tag;

pub use error::{CoreError, Result};
pub use finding::Finding;
pub use history::{HistoryManager, HistoryState, StateKind};
pub use tag::{Container, Tag, TagStore};
