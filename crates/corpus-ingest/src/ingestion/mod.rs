//! Format dispatch and per-format extraction

mod binary;
pub mod converter;
mod html;
mod json;
mod registry;
mod spreadsheet;
mod tabular;
mod text;
mod xml;

use encoding_rs::Encoding;

use crate::config::FieldSelector;
use crate::error::Result;
use crate::types::DocumentRecord;

pub use binary::BinaryExtractor;
pub use converter::{ConverterFailure, DocumentConverter, LocalConverter, LocalConverterConfig};
pub use html::HtmlExtractor;
pub use json::JsonExtractor;
pub use registry::ExtractorRegistry;
pub use spreadsheet::SpreadsheetExtractor;
pub use tabular::TabularExtractor;
pub use text::TextExtractor;
pub use xml::XmlExtractor;

/// Format-specific options, shared by every source in a run
#[derive(Debug, Clone, Default)]
pub struct ExtractionOptions {
    /// Column/key (or XML element) holding the body text
    pub text_field: Option<FieldSelector>,
    /// Column/key holding an explicit document id
    pub docid_field: Option<FieldSelector>,
    /// Delimiter override for tabular sources
    pub delimiter: Option<u8>,
    /// Whether tabular sources carry a header row
    pub has_header: bool,
}

/// Everything an extractor may look at for one source
#[derive(Debug, Clone, Copy)]
pub struct ExtractInput<'a> {
    /// Source identifier, for error reporting
    pub source_id: &'a str,
    /// Lower-cased extension
    pub extension: &'a str,
    /// Raw payload
    pub bytes: &'a [u8],
    /// Declared encoding for text formats
    pub encoding: &'static Encoding,
    /// Run-wide options
    pub options: &'a ExtractionOptions,
}

impl ExtractInput<'_> {
    /// Decode the payload under the declared encoding
    pub fn decode(&self) -> Result<String> {
        crate::encoding::decode(self.bytes, self.encoding, self.source_id)
    }
}

/// Converts one source into document records
///
/// Implementations must be pure: the same bytes and options always give the
/// same records, and no state is shared between calls.
pub trait Extractor: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Extract records from one source
    fn extract(&self, input: &ExtractInput<'_>) -> Result<Vec<DocumentRecord>>;
}
