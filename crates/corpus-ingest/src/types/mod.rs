//! Core types shared across the pipeline

pub mod document;
pub mod source;
pub mod table;

pub use document::{ConvertFormat, DocumentRecord, Value};
pub use source::{Payload, Source};
pub use table::{IngestOutcome, ResultTable, Row, Warning, WarningKind};
