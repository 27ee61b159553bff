//! Built-in decoder for JPEG metadata

use async_trait::async_trait;
use privlens_core::Tag;
use tracing::debug;

use crate::decoder::TagDecoder;
use crate::error::{DecodeError, Result};
use crate::input::SourceFile;

pub struct JpegDecoder;

#[async_trait]
impl TagDecoder for JpegDecoder {
    fn name(&self) -> &str {
        "jpeg"
    }

    fn supports(&self, file: &SourceFile) -> bool {
        privlens_jpeg::is_supported_media_type(&file.media_type)
    }

    async fn decode(&self, file: &SourceFile) -> Result<Vec<Tag>> {
        let bytes = file.bytes.clone();
        let tags = tokio::task::spawn_blocking(move || privlens_jpeg::read_tags(&bytes))
            .await
            .map_err(|e| DecodeError::Unavailable(format!("jpeg decoder task failed: {e}")))??;

        debug!(file = %file.name, count = tags.len(), "decoded jpeg tags");
        Ok(tags)
    }
}
