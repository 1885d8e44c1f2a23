//! Plain text extractor

use super::{ExtractInput, Extractor};
use crate::error::Result;
use crate::types::DocumentRecord;

/// Whole decoded payload becomes one record
#[derive(Debug, Default, Clone, Copy)]
pub struct TextExtractor;

impl Extractor for TextExtractor {
    fn name(&self) -> &'static str {
        "text"
    }

    fn extract(&self, input: &ExtractInput<'_>) -> Result<Vec<DocumentRecord>> {
        Ok(vec![DocumentRecord::text(input.decode()?)])
    }
}
