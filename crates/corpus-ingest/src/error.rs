//! Error types for the ingestion pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ingestion errors
///
/// Every per-source variant carries the identifier of the offending source so
/// that collected failures can be reported without extra bookkeeping.
#[derive(Debug, Error)]
pub enum Error {
    /// Locator matched nothing, archive could not be unpacked, URL failed
    #[error("Cannot resolve '{locator}': {message}")]
    SourceResolution { locator: String, message: String },

    /// No extractor registered for the extension
    #[error("Unsupported format '.{extension}' for source '{source_id}'")]
    UnsupportedFormat { source_id: String, extension: String },

    /// Unknown encoding label or bytes invalid under the declared encoding
    #[error("Encoding error for source '{source_id}' ({label}): {message}")]
    Encoding {
        source_id: String,
        label: String,
        message: String,
    },

    /// Malformed CSV/TSV/JSON/XML/HTML/spreadsheet content
    #[error("Failed to parse {format} source '{source_id}': {message}")]
    Parse {
        source_id: String,
        format: &'static str,
        message: String,
    },

    /// External PDF/DOC/DOCX converter reported a failure
    #[error("Conversion failed for source '{source_id}': {reason}")]
    Converter { source_id: String, reason: String },

    /// Filename tokens do not line up with the configured docvar names
    #[error(
        "Docvar mismatch for source '{source_id}': expected {expected} fields, found {found}"
    )]
    DocvarMismatch {
        source_id: String,
        expected: usize,
        found: usize,
    },

    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Configuration that only turns out invalid for a particular source
    #[error("Configuration error for source '{source_id}': {message}")]
    ConfigurationFor { source_id: String, message: String },

    /// Extraction task panicked or was cancelled
    #[error("Extraction of source '{source_id}' failed: {message}")]
    Task { source_id: String, message: String },

    /// Writing the result table failed
    #[error("Failed to write output: {0}")]
    Output(String),

    /// IO error while reading a source or staging files
    #[error("IO error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Create a source resolution error
    pub fn resolution(locator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceResolution {
            locator: locator.into(),
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse(
        source_id: impl Into<String>,
        format: &'static str,
        message: impl ToString,
    ) -> Self {
        Self::Parse {
            source_id: source_id.into(),
            format,
            message: message.to_string(),
        }
    }

    /// Create an encoding error
    pub fn encoding(
        source_id: impl Into<String>,
        label: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Encoding {
            source_id: source_id.into(),
            label: label.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a configuration error scoped to one source
    pub fn config_for(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigurationFor {
            source_id: source_id.into(),
            message: message.into(),
        }
    }

    /// Create an IO error for a path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Identifier of the source this error is about, if any
    pub fn source_id(&self) -> Option<&str> {
        match self {
            Self::UnsupportedFormat { source_id, .. }
            | Self::Encoding { source_id, .. }
            | Self::Parse { source_id, .. }
            | Self::Converter { source_id, .. }
            | Self::DocvarMismatch { source_id, .. }
            | Self::ConfigurationFor { source_id, .. }
            | Self::Task { source_id, .. } => Some(source_id),
            Self::SourceResolution { locator, .. } => Some(locator),
            Self::Configuration(_) | Self::Output(_) | Self::Io { .. } => None,
        }
    }
}
