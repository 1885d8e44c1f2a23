//! corpus-ingest: turn heterogeneous text files into one document table
//!
//! Sources are given as globs, directories, files, archives or URLs. Each
//! source is dispatched by extension to an extractor (plain text, delimited
//! tables, JSON, XML, HTML, spreadsheets, and PDF/DOC/DOCX through a
//! converter), decoded under a declared encoding, enriched with docvars taken
//! from file names or an external table, and assembled into a table with
//! `doc_id`, `text` and one column per docvar.
//!
//! ```no_run
//! use corpus_ingest::{IngestConfig, Ingestor};
//!
//! # async fn run() -> corpus_ingest::Result<()> {
//! let config = IngestConfig::from_toml_str(r#"
//!     docvarsfrom = "filenames"
//!     docvarnames = ["unit", "context", "year", "language", "party"]
//! "#)?;
//! let outcome = Ingestor::new(config)?.ingest("data/*.txt").await?;
//! outcome.table.write_csv(std::io::stdout())?;
//! # Ok(())
//! # }
//! ```

pub mod assembler;
pub mod config;
pub mod docvars;
pub mod encoding;
pub mod error;
pub mod ingestion;
pub mod pipeline;
pub mod processing;
pub mod sources;
pub mod types;

pub use config::{DocvarsFrom, ErrorPolicy, FieldSelector, IngestConfig, MismatchPolicy};
pub use docvars::{DocvarPolicy, DocvarTable, FilenameDocvarSpec, TableKey};
pub use encoding::EncodingSpec;
pub use error::{Error, Result};
pub use ingestion::{ConverterFailure, DocumentConverter, Extractor, ExtractorRegistry};
pub use pipeline::Ingestor;
pub use types::{
    ConvertFormat, DocumentRecord, IngestOutcome, ResultTable, Row, Source, Value, Warning,
    WarningKind,
};
