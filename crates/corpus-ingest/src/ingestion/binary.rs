//! PDF / DOC / DOCX extractor delegating to the external converter

use std::sync::Arc;

use super::converter::DocumentConverter;
use super::{ExtractInput, Extractor};
use crate::error::{Error, Result};
use crate::types::{ConvertFormat, DocumentRecord};

/// Wraps converter output into a single record
#[derive(Clone)]
pub struct BinaryExtractor {
    format: ConvertFormat,
    converter: Arc<dyn DocumentConverter>,
}

impl BinaryExtractor {
    /// Extractor for one binary format
    pub fn new(format: ConvertFormat, converter: Arc<dyn DocumentConverter>) -> Self {
        Self { format, converter }
    }
}

impl Extractor for BinaryExtractor {
    fn name(&self) -> &'static str {
        match self.format {
            ConvertFormat::Pdf => "pdf",
            ConvertFormat::Doc => "doc",
            ConvertFormat::Docx => "docx",
        }
    }

    fn extract(&self, input: &ExtractInput<'_>) -> Result<Vec<DocumentRecord>> {
        let text = self
            .converter
            .convert(input.bytes, self.format)
            .map_err(|failure| Error::Converter {
                source_id: input.source_id.to_string(),
                reason: failure.reason,
            })?;
        Ok(vec![DocumentRecord::text(text)])
    }
}
