//! Docvar synthesis from file names or an external metadata table
//!
//! Synthesized docvars are computed per source before extraction; they only
//! need the source identifier and its discovery position. When an extractor
//! produces an inline docvar with the same name, the synthesized value wins
//! (see [`merge`]).

use regex::Regex;
use std::collections::HashSet;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::source::file_name_of;
use crate::types::{Source, Value, Warning, WarningKind};

/// Splits file names (and optionally directory names) into named docvars
#[derive(Debug, Clone)]
pub struct FilenameDocvarSpec {
    separator: Regex,
    names: Vec<String>,
    include_dirs: bool,
}

impl FilenameDocvarSpec {
    /// Build a spec; rejects an empty or duplicated name list and a bad separator
    pub fn new(separator: &str, names: Vec<String>, include_dirs: bool) -> Result<Self> {
        if names.is_empty() {
            return Err(Error::config("docvarnames must not be empty"));
        }
        let mut seen = HashSet::new();
        for name in &names {
            if name.is_empty() {
                return Err(Error::config("docvarnames must not contain empty names"));
            }
            if matches!(name.as_str(), "doc_id" | "text") {
                return Err(Error::config(format!("docvar name '{}' is reserved", name)));
            }
            if !seen.insert(name.as_str()) {
                return Err(Error::config(format!("duplicate docvar name '{}'", name)));
            }
        }
        if separator.is_empty() {
            return Err(Error::config("dvsep must not be empty"));
        }
        let separator = Regex::new(separator)
            .map_err(|e| Error::config(format!("invalid dvsep '{}': {}", separator, e)))?;

        Ok(Self {
            separator,
            names,
            include_dirs,
        })
    }

    /// Configured docvar names
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Raw tokens for a source, directory components first when enabled
    pub fn tokens(&self, source: &Source) -> Vec<String> {
        let mut tokens = Vec::new();

        if self.include_dirs {
            let id = source.id.split(['?', '#']).next().unwrap_or(&source.id);
            let id = match id.split_once("://") {
                Some((_, rest)) => rest.find('/').map_or("", |i| &rest[i..]),
                None => id,
            };
            let file_name = file_name_of(id);
            let dirs = &id[..id.len() - file_name.len()];
            for component in Path::new(dirs).components() {
                if let std::path::Component::Normal(part) = component {
                    let part = part.to_string_lossy();
                    tokens.extend(self.separator.split(&part).map(str::to_string));
                }
            }
        }

        tokens.extend(self.separator.split(source.stem()).map(str::to_string));
        tokens
    }

    /// Docvars for one source; token count must equal the name count
    pub fn derive(&self, source: &Source) -> Result<Vec<(String, Value)>> {
        let tokens = self.tokens(source);
        if tokens.len() != self.names.len() {
            return Err(Error::DocvarMismatch {
                source_id: source.id.clone(),
                expected: self.names.len(),
                found: tokens.len(),
            });
        }
        Ok(self
            .names
            .iter()
            .zip(tokens)
            .map(|(name, token)| (name.clone(), Value::infer(&token)))
            .collect())
    }
}

/// How table rows are matched to sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableKey {
    /// Row whose value in this column equals the source id or its file name
    Column(String),
    /// Row `i` belongs to the `i`-th discovered source
    Position,
}

/// Caller-supplied metadata table
#[derive(Debug, Clone)]
pub struct DocvarTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    key: TableKey,
}

impl DocvarTable {
    /// Build a table; every row must be as wide as the header
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>, key: TableKey) -> Result<Self> {
        if let TableKey::Column(name) = &key {
            if !columns.iter().any(|c| c == name) {
                return Err(Error::config(format!(
                    "docvars_key '{}' is not a column of the docvars table",
                    name
                )));
            }
        }
        if let Some(i) = rows.iter().position(|r| r.len() != columns.len()) {
            return Err(Error::config(format!(
                "docvars table row {} has {} values, expected {}",
                i + 1,
                rows[i].len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows, key })
    }

    /// Load a table from a CSV file with a header row
    pub fn from_csv_path(path: impl AsRef<Path>, key: TableKey) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| Error::io(path, e))?;
        Self::from_csv_reader(file, key).map_err(|e| match e {
            Error::Configuration(message) => {
                Error::config(format!("docvars table '{}': {}", path.display(), message))
            }
            other => other,
        })
    }

    /// Load a table from CSV data with a header row
    pub fn from_csv_reader<R: std::io::Read>(reader: R, key: TableKey) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let columns = reader
            .headers()
            .map_err(|e| Error::config(e.to_string()))?
            .iter()
            .map(str::to_string)
            .collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| Error::config(e.to_string()))?;
            rows.push(record.iter().map(Value::infer).collect());
        }
        Self::new(columns, rows, key)
    }

    /// Columns emitted as docvars (the key column is left out)
    pub fn docvar_columns(&self) -> impl Iterator<Item = &str> {
        let key_idx = self.key_index();
        self.columns
            .iter()
            .enumerate()
            .filter(move |(i, _)| Some(*i) != key_idx)
            .map(|(_, c)| c.as_str())
    }

    fn key_index(&self) -> Option<usize> {
        match &self.key {
            TableKey::Column(name) => self.columns.iter().position(|c| c == name),
            TableKey::Position => None,
        }
    }

    fn find_row(&self, position: usize, source: &Source) -> Option<&[Value]> {
        match self.key_index() {
            Some(k) => self
                .rows
                .iter()
                .find(|row| {
                    let key = row[k].to_string();
                    !key.is_empty() && (key == source.id || key == source.file_name())
                })
                .map(Vec::as_slice),
            None => self.rows.get(position).map(Vec::as_slice),
        }
    }

    /// Docvars for a source; unmatched sources get `Missing` everywhere
    pub fn lookup(&self, position: usize, source: &Source) -> Vec<(String, Value)> {
        let key_idx = self.key_index();
        let row = self.find_row(position, source);
        if row.is_none() {
            tracing::debug!("No docvars table row for '{}'", source.id);
        }

        self.columns
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != key_idx)
            .map(|(i, name)| {
                let value = row.map(|r| r[i].clone()).unwrap_or(Value::Missing);
                (name.clone(), value)
            })
            .collect()
    }
}

/// Docvar synthesis policy for a run
#[derive(Debug, Clone, Default)]
pub enum DocvarPolicy {
    /// No synthesized docvars
    #[default]
    None,
    /// Split file names (or paths)
    Filenames(FilenameDocvarSpec),
    /// Join an external table
    Table(DocvarTable),
}

impl DocvarPolicy {
    /// Synthesized docvars for the source at `position` in discovery order
    pub fn synthesize(&self, position: usize, source: &Source) -> Result<Vec<(String, Value)>> {
        match self {
            Self::None => Ok(Vec::new()),
            Self::Filenames(spec) => spec.derive(source),
            Self::Table(table) => Ok(table.lookup(position, source)),
        }
    }
}

/// Combine synthesized and inline docvars for one record
///
/// Synthesized columns come first. An inline docvar sharing a name with a
/// synthesized one is dropped, and a `DocvarConflict` warning is recorded the
/// first time a column conflicts for this source (`reported` tracks that).
pub fn merge(
    source_id: &str,
    synthesized: &[(String, Value)],
    inline: Vec<(String, Value)>,
    reported: &mut HashSet<String>,
    warnings: &mut Vec<Warning>,
) -> Vec<(String, Value)> {
    let mut merged = synthesized.to_vec();
    for (name, value) in inline {
        if synthesized.iter().any(|(n, _)| *n == name) {
            if reported.insert(name.clone()) {
                tracing::debug!("'{}': inline docvar '{}' overridden", source_id, name);
                warnings.push(Warning {
                    source_id: source_id.to_string(),
                    kind: WarningKind::DocvarConflict { column: name },
                });
            }
            continue;
        }
        merged.push((name, value));
    }
    merged
}
