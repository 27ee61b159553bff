//! Error types for privlens-engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Redaction is not supported for {0}")]
    UnsupportedContainerFormat(String),

    #[error("Redaction failed: {0}")]
    Redaction(#[from] privlens_jpeg::JpegError),

    #[error("Decode error: {0}")]
    Decode(#[from] privlens_sources::DecodeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Analysis was cancelled")]
    Cancelled,

    #[error("No file is open")]
    NoActiveSession,

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}
