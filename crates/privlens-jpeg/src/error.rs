//! Error types for privlens-jpeg

use thiserror::Error;

pub type Result<T> = std::result::Result<T, JpegError>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum JpegError {
    #[error("Missing start-of-image marker")]
    MissingStartOfImage,

    #[error("Malformed tag directory: {0}")]
    MalformedDirectory(String),

    #[error("Rewritten segment exceeds 65535 bytes: {0}")]
    SegmentTooLarge(usize),

    #[error("Data truncated at offset {offset}")]
    Truncated { offset: usize },
}
