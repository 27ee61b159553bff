//! JPEG metadata handling for privlens
//!
//! This crate contains:
//! - Segment walker for the marker/length container structure
//! - TIFF tag-directory (EXIF/GPS) parser and serializer
//! - The binary redactor and a built-in tag reader

pub mod error;
pub mod read;
pub mod redact;
pub mod segment;
pub mod tags;
pub mod tiff;

pub use error::{JpegError, Result};
pub use read::read_tags;
pub use redact::{RedactionOutcome, Selection, redact, strip_metadata};
pub use segment::{JpegLayout, Segment, SegmentKind};
pub use tiff::{ByteOrder, ExifDirectory, IfdEntry, IfdGroup};

/// Media types accepted for binary redaction
pub fn is_supported_media_type(media_type: &str) -> bool {
    matches!(
        media_type.trim().to_ascii_lowercase().as_str(),
        "image/jpeg" | "image/jpg"
    )
}
