//! Tag decoders and file loading for privlens
//!
//! External metadata decoders plug in through [`TagDecoder`]; the crate ships a
//! JPEG decoder backed by `privlens-jpeg` and a decoder for JSON tag lists.

pub mod decoder;
pub mod error;
pub mod input;
pub mod jpeg;
pub mod json;
pub mod text;

pub use decoder::{DecoderRegistry, TagDecoder};
pub use error::{DecodeError, Result};
pub use input::SourceFile;
pub use jpeg::JpegDecoder;
pub use json::JsonTagDecoder;
