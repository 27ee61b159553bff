//! Tag decoder trait and registry

use std::sync::Arc;

use async_trait::async_trait;
use privlens_core::Tag;

use crate::error::Result;
use crate::input::SourceFile;
use crate::jpeg::JpegDecoder;

/// Produces a flat tag list for one container kind
#[async_trait]
pub trait TagDecoder: Send + Sync {
    /// Short name used in logs and skipped-decoder reports
    fn name(&self) -> &str;

    /// Whether this decoder applies to the file
    fn supports(&self, file: &SourceFile) -> bool;

    async fn decode(&self, file: &SourceFile) -> Result<Vec<Tag>>;
}

/// Ordered set of decoders; every supporting decoder runs for a file
#[derive(Clone, Default)]
pub struct DecoderRegistry {
    decoders: Vec<Arc<dyn TagDecoder>>,
}

impl DecoderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in decoders
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(JpegDecoder));
        registry
    }

    pub fn register(&mut self, decoder: Arc<dyn TagDecoder>) {
        self.decoders.push(decoder);
    }

    pub fn decoders_for<'a>(&'a self, file: &'a SourceFile) -> impl Iterator<Item = &'a Arc<dyn TagDecoder>> {
        self.decoders.iter().filter(move |d| d.supports(file))
    }

    pub fn names(&self) -> Vec<&str> {
        self.decoders.iter().map(|d| d.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}

impl std::fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoderRegistry")
            .field("decoders", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use privlens_core::Container;

    struct PdfStub;

    #[async_trait]
    impl TagDecoder for PdfStub {
        fn name(&self) -> &str {
            "pdf"
        }

        fn supports(&self, file: &SourceFile) -> bool {
            file.media_type == "application/pdf"
        }

        async fn decode(&self, _file: &SourceFile) -> Result<Vec<Tag>> {
            Ok(vec![Tag::new(Container::Pdf, "Author", "Jane")])
        }
    }

    #[test]
    fn test_decoders_filtered_by_support() {
        let mut registry = DecoderRegistry::with_defaults();
        registry.register(Arc::new(PdfStub));
        assert_eq!(registry.names(), vec!["jpeg", "pdf"]);

        let pdf = SourceFile::new("a.pdf", "application/pdf", b"%PDF".to_vec());
        let names: Vec<_> = registry.decoders_for(&pdf).map(|d| d.name()).collect();
        assert_eq!(names, vec!["pdf"]);

        let jpeg = SourceFile::new("a.jpg", "image/jpeg", vec![0xFF, 0xD8]);
        assert_eq!(registry.decoders_for(&jpeg).count(), 1);
    }
}
