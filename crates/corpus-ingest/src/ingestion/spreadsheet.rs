//! Spreadsheet extractor (xlsx, xls, ods)
//!
//! Reads the first worksheet. Header handling (`has_header`, `V1..Vn` names
//! otherwise) and the text and docvar contract are the same as for
//! delimited tables.

use calamine::{Data, Reader};
use std::io::Cursor;

use super::tabular::records_from_rows;
use super::{ExtractInput, Extractor};
use crate::error::{Error, Result};
use crate::types::DocumentRecord;

/// One record per data row of the first worksheet
#[derive(Debug, Default, Clone, Copy)]
pub struct SpreadsheetExtractor;

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

impl Extractor for SpreadsheetExtractor {
    fn name(&self) -> &'static str {
        "spreadsheet"
    }

    fn extract(&self, input: &ExtractInput<'_>) -> Result<Vec<DocumentRecord>> {
        let source_id = input.source_id;
        let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(input.bytes))
            .map_err(|e| Error::parse(source_id, "spreadsheet", e))?;

        let sheet = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| Error::parse(source_id, "spreadsheet", "workbook has no sheets"))?;
        let range = workbook
            .worksheet_range(&sheet)
            .map_err(|e| Error::parse(source_id, "spreadsheet", e))?;

        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        let (headers, rows) = split_header(rows, input.options.has_header);
        if headers.is_empty() {
            return Ok(Vec::new());
        }

        records_from_rows(source_id, "spreadsheet", &headers, rows, input.options)
    }
}

/// Header names and non-blank data rows of a sheet
fn split_header(rows: Vec<Vec<String>>, has_header: bool) -> (Vec<String>, Vec<Vec<String>>) {
    let mut rows = rows.into_iter();
    let headers: Vec<String> = if has_header {
        rows.next().unwrap_or_default()
    } else {
        Vec::new()
    };
    let data: Vec<Vec<String>> = rows
        .filter(|row| !row.iter().all(String::is_empty))
        .collect();

    if has_header {
        return (headers, data);
    }
    let width = data.first().map(Vec::len).unwrap_or(0);
    ((1..=width).map(|i| format!("V{}", i)).collect(), data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::ExtractionOptions;

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::Float(2017.0)), "2017");
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::String("SPD".to_string())), "SPD");
    }

    fn sheet(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_split_header_first_row() {
        let rows = sheet(&[&["text", "year"], &["hello", "2017"], &["", ""], &["bye", "2018"]]);
        let (headers, data) = split_header(rows, true);
        assert_eq!(headers, vec!["text", "year"]);
        assert_eq!(data.len(), 2);
        assert_eq!(data[1][0], "bye");
    }

    #[test]
    fn test_split_header_without_header_row() {
        let rows = sheet(&[&["hello", "2017"], &["bye", "2018"]]);
        let (headers, data) = split_header(rows, false);
        assert_eq!(headers, vec!["V1", "V2"]);
        assert_eq!(data.len(), 2);
        assert_eq!(data[0][0], "hello");
    }

    #[test]
    fn test_corrupt_workbook() {
        let options = ExtractionOptions::default();
        let input = ExtractInput {
            source_id: "budget.xlsx",
            extension: "xlsx",
            bytes: b"PK\x03\x04 truncated",
            encoding: encoding_rs::UTF_8,
            options: &options,
        };
        let err = SpreadsheetExtractor.extract(&input).unwrap_err();
        assert!(matches!(err, Error::Parse { ref source_id, .. } if source_id == "budget.xlsx"));
    }
}
