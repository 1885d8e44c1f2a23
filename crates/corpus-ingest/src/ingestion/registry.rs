//! Extension-to-extractor registry

use std::collections::HashMap;
use std::sync::Arc;

use super::{
    BinaryExtractor, DocumentConverter, Extractor, HtmlExtractor, JsonExtractor,
    SpreadsheetExtractor, TabularExtractor, TextExtractor, XmlExtractor,
};
use crate::error::{Error, Result};
use crate::types::{ConvertFormat, Source};

/// Registry of extractors keyed by lower-cased extension
#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    extractors: HashMap<String, Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in format; binary formats use `converter`
    pub fn with_defaults(converter: Arc<dyn DocumentConverter>) -> Self {
        let mut registry = Self::new();
        registry.register(&["txt"], TextExtractor);
        registry.register(&["csv", "tab", "tsv"], TabularExtractor);
        registry.register(&["json", "ndjson", "jsonl"], JsonExtractor);
        registry.register(&["xml"], XmlExtractor);
        registry.register(&["html", "htm"], HtmlExtractor);
        registry.register(&["xlsx", "xls", "ods"], SpreadsheetExtractor);
        for format in [ConvertFormat::Pdf, ConvertFormat::Doc, ConvertFormat::Docx] {
            registry.register(
                &[format.extension()],
                BinaryExtractor::new(format, converter.clone()),
            );
        }
        registry
    }

    /// Map extensions to an extractor, replacing earlier mappings
    pub fn register<E: Extractor + 'static>(&mut self, extensions: &[&str], extractor: E) {
        let extractor: Arc<dyn Extractor> = Arc::new(extractor);
        for ext in extensions {
            let ext = ext.trim_start_matches('.').to_lowercase();
            self.extractors.insert(ext, extractor.clone());
        }
    }

    /// Extractor for an extension, if registered
    pub fn get(&self, extension: &str) -> Option<Arc<dyn Extractor>> {
        self.extractors.get(&extension.to_lowercase()).cloned()
    }

    /// Extractor for a source, or `UnsupportedFormat` naming it
    pub fn dispatch(&self, source: &Source) -> Result<Arc<dyn Extractor>> {
        self.get(&source.extension)
            .ok_or_else(|| Error::UnsupportedFormat {
                source_id: source.id.clone(),
                extension: source.extension.clone(),
            })
    }

    /// Registered extensions, sorted
    pub fn extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.extractors.keys().map(String::as_str).collect();
        exts.sort_unstable();
        exts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::{ExtractInput, LocalConverter};
    use crate::types::DocumentRecord;

    fn defaults() -> ExtractorRegistry {
        ExtractorRegistry::with_defaults(Arc::new(LocalConverter::default()))
    }

    #[test]
    fn test_default_table() {
        let registry = defaults();
        let expected = [
            ("txt", "text"),
            ("CSV", "tabular"),
            ("tab", "tabular"),
            ("tsv", "tabular"),
            ("json", "json"),
            ("xml", "xml"),
            ("pdf", "pdf"),
            ("doc", "doc"),
            ("DOCX", "docx"),
        ];
        for (ext, name) in expected {
            assert_eq!(registry.get(ext).map(|e| e.name()), Some(name), "{}", ext);
        }
    }

    #[test]
    fn test_unknown_extension_is_an_error() {
        let registry = defaults();
        let source = Source::from_path("img/scan.bmp", "img/scan.bmp");
        match registry.dispatch(&source) {
            Err(Error::UnsupportedFormat { source_id, extension }) => {
                assert_eq!(source_id, "img/scan.bmp");
                assert_eq!(extension, "bmp");
            }
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("bmp must not be dispatched"),
        }
    }

    struct Shouting;

    impl Extractor for Shouting {
        fn name(&self) -> &'static str {
            "shouting"
        }

        fn extract(&self, input: &ExtractInput<'_>) -> Result<Vec<DocumentRecord>> {
            Ok(vec![DocumentRecord::text(input.decode()?.to_uppercase())])
        }
    }

    #[test]
    fn test_register_new_format() {
        let mut registry = defaults();
        registry.register(&[".md"], Shouting);
        assert_eq!(registry.get("md").map(|e| e.name()), Some("shouting"));
        assert_eq!(registry.get("txt").map(|e| e.name()), Some("text"));
        assert!(registry.extensions().contains(&"md"));
    }
}
