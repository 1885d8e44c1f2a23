//! Configuration for an ingestion run
//!
//! The config record is the only place defaults are chosen. Everything
//! downstream receives explicit values; in particular the encoding default
//! (UTF-8) is set here and nowhere else.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::encoding::EncodingSpec;
use crate::error::{Error, Result};

/// Column/key selector for tabular and JSON sources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldSelector {
    /// 1-based column position
    Index(usize),
    /// Column header or JSON key
    Name(String),
}

impl std::fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Index(i) => write!(f, "#{}", i),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for FieldSelector {
    /// Numeric strings select by position, anything else by name
    fn from(raw: &str) -> Self {
        match raw.parse::<usize>() {
            Ok(i) => Self::Index(i),
            Err(_) => Self::Name(raw.to_string()),
        }
    }
}

/// Where synthesized docvars come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocvarsFrom {
    /// No synthesized docvars
    #[default]
    None,
    /// Split the file name
    Filenames,
    /// Split the directory components and the file name
    Filepaths,
    /// Join a caller-supplied metadata table
    Table,
}

/// What a per-source failure does to the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// First failure aborts the run and discards partial results
    #[default]
    FailFast,
    /// Failures become warnings; other sources still produce rows
    Collect,
}

/// What a filename docvar mismatch does to the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MismatchPolicy {
    /// Abort the whole run
    #[default]
    Abort,
    /// Drop the source with a warning
    Skip,
}

/// Ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestConfig {
    /// Column/key holding the body text (tabular, JSON, spreadsheet; element name for XML)
    pub text_field: Option<FieldSelector>,
    /// Column/key holding an explicit document id
    pub docid_field: Option<FieldSelector>,
    /// Docvar synthesis policy
    pub docvarsfrom: DocvarsFrom,
    /// Docvar names for the filename/filepath policies
    pub docvarnames: Vec<String>,
    /// Separator regex for filename splitting (default: `_`)
    pub dvsep: String,
    /// Encoding: one label, one per source, or keyed by source
    pub encoding: EncodingSpec,
    /// Descend into subdirectories
    pub recursive: bool,
    /// Field delimiter override for tabular sources (single ASCII character)
    pub delimiter: Option<String>,
    /// Whether tabular sources start with a header row
    pub has_header: bool,
    /// CSV file holding docvars for the `table` policy
    pub docvars_table: Option<PathBuf>,
    /// Column of `docvars_table` holding the source file name (position match if unset)
    pub docvars_key: Option<String>,
    /// Failure propagation policy
    pub on_error: ErrorPolicy,
    /// Filename docvar mismatch policy
    pub docvar_mismatch: MismatchPolicy,
    /// Accept locators that match no sources
    pub allow_empty: bool,
    /// Timeout for URL fetches in seconds
    pub fetch_timeout_secs: u64,
    /// Timeout for a single external conversion in seconds
    pub converter_timeout_secs: u64,
    /// Maximum sources extracted concurrently (default: CPU count)
    pub parallelism: Option<usize>,
}

fn default_dvsep() -> String { "_".to_string() }
fn default_fetch_timeout() -> u64 { 60 }
fn default_converter_timeout() -> u64 { 120 }

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            text_field: None,
            docid_field: None,
            docvarsfrom: DocvarsFrom::None,
            docvarnames: Vec::new(),
            dvsep: default_dvsep(),
            encoding: EncodingSpec::default(),
            recursive: false,
            delimiter: None,
            has_header: true,
            docvars_table: None,
            docvars_key: None,
            on_error: ErrorPolicy::FailFast,
            docvar_mismatch: MismatchPolicy::Abort,
            allow_empty: false,
            fetch_timeout_secs: default_fetch_timeout(),
            converter_timeout_secs: default_converter_timeout(),
            parallelism: None,
        }
    }
}

impl IngestConfig {
    /// Parse a TOML document; unknown keys are rejected
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::config(format!("Invalid config: {}", e.message())))
    }

    /// Load a TOML config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml_str(&raw)
    }

    /// Delimiter as a single byte, if overridden
    pub fn delimiter_byte(&self) -> Result<Option<u8>> {
        let Some(raw) = self.delimiter.as_deref() else {
            return Ok(None);
        };
        let unescaped = if raw == "\\t" { "\t" } else { raw };
        match unescaped.as_bytes() {
            [b] if b.is_ascii() => Ok(Some(*b)),
            _ => Err(Error::config(format!(
                "delimiter must be a single ASCII character, got '{}'",
                raw
            ))),
        }
    }

    /// Effective worker count
    pub fn worker_count(&self) -> usize {
        self.parallelism.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Check option combinations that do not depend on any source
    pub fn validate(&self) -> Result<()> {
        self.delimiter_byte()?;

        if self.parallelism == Some(0) {
            return Err(Error::config("parallelism must be at least 1"));
        }

        for (name, selector) in [("text_field", &self.text_field), ("docid_field", &self.docid_field)] {
            match selector {
                Some(FieldSelector::Index(0)) => {
                    return Err(Error::config(format!("{} positions are 1-based", name)));
                }
                Some(FieldSelector::Name(n)) if n.is_empty() => {
                    return Err(Error::config(format!("{} must not be empty", name)));
                }
                _ => {}
            }
        }

        let by_name = matches!(self.docvarsfrom, DocvarsFrom::Filenames | DocvarsFrom::Filepaths);
        if by_name && self.docvarnames.is_empty() {
            return Err(Error::config(
                "docvarnames is required when docvarsfrom is 'filenames' or 'filepaths'",
            ));
        }
        if !by_name && !self.docvarnames.is_empty() {
            return Err(Error::config(
                "docvarnames is only used when docvarsfrom is 'filenames' or 'filepaths'",
            ));
        }
        if self.docvarsfrom != DocvarsFrom::Table
            && (self.docvars_table.is_some() || self.docvars_key.is_some())
        {
            return Err(Error::config(
                "docvars_table/docvars_key require docvarsfrom = 'table'",
            ));
        }

        self.encoding.validate()?;
        Ok(())
    }
}
