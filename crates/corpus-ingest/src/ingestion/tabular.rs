//! Delimited table extractor (csv, tab, tsv)

use super::{ExtractInput, ExtractionOptions, Extractor};
use crate::config::FieldSelector;
use crate::error::{Error, Result};
use crate::types::{DocumentRecord, Value};

/// One record per data row; the text column becomes `text`, the rest docvars
#[derive(Debug, Default, Clone, Copy)]
pub struct TabularExtractor;

impl TabularExtractor {
    fn default_delimiter(extension: &str) -> u8 {
        match extension {
            "tsv" | "tab" => b'\t',
            _ => b',',
        }
    }
}

impl Extractor for TabularExtractor {
    fn name(&self) -> &'static str {
        "tabular"
    }

    fn extract(&self, input: &ExtractInput<'_>) -> Result<Vec<DocumentRecord>> {
        let content = input.decode()?;
        let options = input.options;
        let delimiter = options
            .delimiter
            .unwrap_or_else(|| Self::default_delimiter(input.extension));

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(options.has_header)
            .from_reader(content.as_bytes());

        let mut rows = Vec::new();
        for (i, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                Error::parse(input.source_id, "tabular", format!("row {}: {}", i + 1, e))
            })?;
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        let headers: Vec<String> = if options.has_header {
            reader
                .headers()
                .map_err(|e| Error::parse(input.source_id, "tabular", e))?
                .iter()
                .map(str::to_string)
                .collect()
        } else {
            let width = rows.first().map(Vec::len).unwrap_or(0);
            (1..=width).map(|i| format!("V{}", i)).collect()
        };

        records_from_rows(input.source_id, "tabular", &headers, rows, options)
    }
}

/// Position of the selected column in `headers`
pub(crate) fn resolve_column(headers: &[String], selector: &FieldSelector) -> Option<usize> {
    match selector {
        FieldSelector::Index(i) => (*i >= 1 && *i <= headers.len()).then(|| i - 1),
        FieldSelector::Name(name) => headers.iter().position(|h| h == name),
    }
}

/// Turn header + string rows into records; shared with the spreadsheet extractor
pub(crate) fn records_from_rows(
    source_id: &str,
    format: &'static str,
    headers: &[String],
    rows: Vec<Vec<String>>,
    options: &ExtractionOptions,
) -> Result<Vec<DocumentRecord>> {
    let selector = options.text_field.as_ref().ok_or_else(|| {
        Error::config_for(source_id, format!("text_field is required for {} sources", format))
    })?;
    let text_col = resolve_column(headers, selector).ok_or_else(|| {
        Error::config_for(
            source_id,
            format!(
                "text_field '{}' not found; columns are: {}",
                selector,
                headers.join(", ")
            ),
        )
    })?;
    let docid_col = match &options.docid_field {
        Some(sel) => Some(resolve_column(headers, sel).ok_or_else(|| {
            Error::config_for(source_id, format!("docid_field '{}' not found", sel))
        })?),
        None => None,
    };

    let records = rows
        .into_iter()
        .map(|row| {
            let mut record = DocumentRecord::text(row.get(text_col).cloned().unwrap_or_default());
            for (i, (name, cell)) in headers.iter().zip(row.iter()).enumerate() {
                if i == text_col {
                    continue;
                }
                if Some(i) == docid_col {
                    record.doc_id = (!cell.is_empty()).then(|| cell.clone());
                    continue;
                }
                record.docvars.push((name.clone(), Value::infer(cell)));
            }
            record
        })
        .collect();

    Ok(records)
}
