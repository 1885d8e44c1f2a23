//! HTML extractor

use scraper::{Html, Selector};

use super::{ExtractInput, Extractor};
use crate::error::{Error, Result};
use crate::types::{DocumentRecord, Value};

/// Body text of an HTML page as one record; `<title>` becomes a docvar
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlExtractor;

fn joined_text<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    let mut content = String::new();
    for text in parts {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            if !content.is_empty() {
                content.push(' ');
            }
            content.push_str(trimmed);
        }
    }
    content
}

impl Extractor for HtmlExtractor {
    fn name(&self) -> &'static str {
        "html"
    }

    fn extract(&self, input: &ExtractInput<'_>) -> Result<Vec<DocumentRecord>> {
        let html = input.decode()?;
        let document = Html::parse_document(&html);

        let selector = |css: &str| {
            Selector::parse(css).map_err(|e| Error::parse(input.source_id, "html", e))
        };
        let body_selector = selector("body")?;
        let title_selector = selector("title")?;

        let text = document
            .select(&body_selector)
            .next()
            .map(|body| joined_text(body.text()))
            .unwrap_or_default();

        let mut record = DocumentRecord::text(text);
        if let Some(title) = document.select(&title_selector).next() {
            let title = joined_text(title.text());
            if !title.is_empty() {
                record.docvars.push(("title".to_string(), Value::Text(title)));
            }
        }

        Ok(vec![record])
    }
}
