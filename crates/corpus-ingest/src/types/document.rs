//! Document records and typed docvar values

use serde::{Serialize, Serializer};
use std::fmt;

/// Typed docvar value
///
/// `Missing` is the explicit marker used when a column exists in the table but
/// a row has no value for it.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// No value for this row
    Missing,
    /// Boolean token (`true`/`false`, any case)
    Bool(bool),
    /// Integer token
    Integer(i64),
    /// Decimal token
    Float(f64),
    /// Anything else, verbatim
    Text(String),
}

impl Value {
    /// Infer a typed value from a raw token.
    ///
    /// A typed value is kept only when it renders back to exactly `raw`, so
    /// `"007"`, `"1.50"`, `"TRUE"` or an identifier too long for `i64` stay
    /// text and every token survives unchanged.
    pub fn infer(raw: &str) -> Self {
        if raw.is_empty() {
            return Self::Missing;
        }

        let typed = if let Ok(b) = raw.parse::<bool>() {
            Some(Self::Bool(b))
        } else if let Ok(i) = raw.parse::<i64>() {
            Some(Self::Integer(i))
        } else if raw.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | '-')) {
            raw.parse::<f64>().ok().map(Self::Float)
        } else {
            None
        };

        match typed {
            Some(value) if value.to_string() == raw => value,
            _ => Self::Text(raw.to_string()),
        }
    }

    /// Convert a JSON value; nested arrays and objects keep their JSON text
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Missing,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => n.as_f64().map(Self::Float).unwrap_or(Self::Missing),
            },
            serde_json::Value::String(s) => Self::Text(s.clone()),
            other => Self::Text(other.to_string()),
        }
    }

    /// Check for the missing marker
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => Ok(()),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Missing => serializer.serialize_none(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::Float(x) => serializer.serialize_f64(*x),
            Self::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// One logical document produced by an extractor
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    /// Extracted body text
    pub text: String,
    /// Inline docvars, in the order the source presents them
    pub docvars: Vec<(String, Value)>,
    /// Explicit document id taken from a `docid_field`
    pub doc_id: Option<String>,
}

impl DocumentRecord {
    /// Record with text only
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            docvars: Vec::new(),
            doc_id: None,
        }
    }
}

/// Format tag handed to the external converter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConvertFormat {
    /// PDF document
    Pdf,
    /// Legacy Word document (.doc)
    Doc,
    /// Word document (.docx)
    Docx,
}

impl ConvertFormat {
    /// Lower-case extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Doc => "doc",
            Self::Docx => "docx",
        }
    }
}

impl fmt::Display for ConvertFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
