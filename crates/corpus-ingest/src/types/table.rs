//! The assembled document table and ingestion warnings

use serde::Serialize;
use std::fmt;
use std::io::Write;

use super::document::Value;
use crate::error::{Error, Result};

/// One row of the result table
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Stable document identifier
    pub doc_id: String,
    /// Extracted body text
    pub text: String,
    /// Docvar values aligned with [`ResultTable::docvar_columns`]
    pub values: Vec<Value>,
}

/// Final tabular result: `doc_id`, `text`, and the union of docvar columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    /// Docvar column names in first-appearance order
    pub docvar_columns: Vec<String>,
    /// Rows in discovery order, then within-source order
    pub rows: Vec<Row>,
}

impl ResultTable {
    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All column names, including `doc_id` and `text`
    pub fn columns(&self) -> Vec<&str> {
        let mut columns = vec!["doc_id", "text"];
        columns.extend(self.docvar_columns.iter().map(String::as_str));
        columns
    }

    /// Index of a docvar column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.docvar_columns.iter().position(|c| c == name)
    }

    /// Value of a docvar for a row, `None` if the column does not exist
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.values.get(idx))
    }

    /// Write the table as CSV with a header row; missing values are empty fields
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut out = csv::Writer::from_writer(writer);
        let to_err = |e: csv::Error| Error::Output(e.to_string());

        out.write_record(self.columns()).map_err(to_err)?;
        for row in &self.rows {
            let mut record = vec![row.doc_id.clone(), row.text.clone()];
            record.extend(row.values.iter().map(|v| v.to_string()));
            out.write_record(&record).map_err(to_err)?;
        }
        out.flush()
            .map_err(|e| Error::Output(e.to_string()))?;
        Ok(())
    }

    /// Render the table as a JSON array of row objects; missing values are null
    pub fn to_json(&self) -> serde_json::Value {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut obj = serde_json::Map::new();
                obj.insert("doc_id".to_string(), row.doc_id.clone().into());
                obj.insert("text".to_string(), row.text.clone().into());
                for (name, value) in self.docvar_columns.iter().zip(&row.values) {
                    let value = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
                    obj.insert(name.clone(), value);
                }
                serde_json::Value::Object(obj)
            })
            .collect();
        serde_json::Value::Array(rows)
    }
}

/// Kind of non-fatal issue recorded during ingestion
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WarningKind {
    /// The source failed and was left out (collect mode)
    SourceFailed { message: String },
    /// Filename tokens did not match the docvar names; source skipped
    DocvarMismatch { expected: usize, found: usize },
    /// Inline docvar shadowed by a filename/table docvar of the same name
    DocvarConflict { column: String },
    /// Per-source encoding entry that matched no source
    UnusedEncoding { key: String },
}

/// Non-fatal issue tied to a source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warning {
    /// Offending source identifier
    pub source_id: String,
    /// What happened
    #[serde(flatten)]
    pub kind: WarningKind,
}

impl Warning {
    /// Warning for a source that failed under collect mode
    ///
    /// The error's own source id wins; `source_id` covers errors that carry
    /// only a path.
    pub fn failed(source_id: &str, err: &Error) -> Self {
        Self {
            source_id: err.source_id().unwrap_or(source_id).to_string(),
            kind: WarningKind::SourceFailed {
                message: err.to_string(),
            },
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            WarningKind::SourceFailed { message } => write!(f, "{}", message),
            WarningKind::DocvarMismatch { expected, found } => write!(
                f,
                "skipped '{}': expected {} docvar fields, found {}",
                self.source_id, expected, found
            ),
            WarningKind::DocvarConflict { column } => write!(
                f,
                "'{}': docvar '{}' from the file's contents was overridden",
                self.source_id, column
            ),
            WarningKind::UnusedEncoding { key } => {
                write!(f, "encoding entry '{}' matched no source", key)
            }
        }
    }
}

/// Table plus the warnings collected while building it
#[derive(Debug, Clone, Default)]
pub struct IngestOutcome {
    /// The assembled table
    pub table: ResultTable,
    /// Non-fatal issues raised while ingesting
    pub warnings: Vec<Warning>,
}
