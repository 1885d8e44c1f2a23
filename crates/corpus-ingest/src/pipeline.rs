//! Ingestion facade
//!
//! [`Ingestor`] wires the stages together for one call:
//! expand locators, resolve encodings, synthesize docvars, extract in
//! parallel, assemble. Staged archive contents live for the duration of the
//! call and are removed on every return path.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::assembler::{assemble, SourceExtraction};
use crate::config::{DocvarsFrom, ErrorPolicy, IngestConfig, MismatchPolicy};
use crate::docvars::{DocvarPolicy, DocvarTable, FilenameDocvarSpec, TableKey};
use crate::encoding::EncodingPlan;
use crate::error::{Error, Result};
use crate::ingestion::{
    BinaryExtractor, DocumentConverter, ExtractionOptions, ExtractorRegistry, LocalConverter,
    LocalConverterConfig,
};
use crate::processing::{ExtractionJob, ExtractionWorker};
use crate::sources::{ExpandOptions, SourceExpander};
use crate::types::{ConvertFormat, IngestOutcome, Value, Warning, WarningKind};

/// Configured ingestion pipeline
///
/// Holds no state between calls; the same `Ingestor` can be used for any
/// number of `ingest` calls, concurrently or not.
#[derive(Clone)]
pub struct Ingestor {
    config: IngestConfig,
    expander: SourceExpander,
    registry: ExtractorRegistry,
    options: ExtractionOptions,
    docvars: DocvarPolicy,
}

impl Ingestor {
    /// Validate `config` and build the pipeline with the default converter
    pub fn new(config: IngestConfig) -> Result<Self> {
        config.validate()?;

        let expander = SourceExpander::new(ExpandOptions {
            recursive: config.recursive,
            allow_empty: config.allow_empty,
            fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
            collect_failures: config.on_error == ErrorPolicy::Collect,
        })?;

        let converter = LocalConverter::new(LocalConverterConfig {
            timeout: Duration::from_secs(config.converter_timeout_secs),
            ..Default::default()
        });
        let registry = ExtractorRegistry::with_defaults(Arc::new(converter));

        let options = ExtractionOptions {
            text_field: config.text_field.clone(),
            docid_field: config.docid_field.clone(),
            delimiter: config.delimiter_byte()?,
            has_header: config.has_header,
        };

        let docvars = match config.docvarsfrom {
            DocvarsFrom::None => DocvarPolicy::None,
            DocvarsFrom::Filenames | DocvarsFrom::Filepaths => {
                DocvarPolicy::Filenames(FilenameDocvarSpec::new(
                    &config.dvsep,
                    config.docvarnames.clone(),
                    config.docvarsfrom == DocvarsFrom::Filepaths,
                )?)
            }
            DocvarsFrom::Table => match &config.docvars_table {
                Some(path) => DocvarPolicy::Table(DocvarTable::from_csv_path(
                    path,
                    Self::table_key(&config),
                )?),
                None => DocvarPolicy::None,
            },
        };

        tracing::debug!(
            "Ingestor configured: docvars from {:?}, {} extensions registered",
            config.docvarsfrom,
            registry.extensions().len()
        );

        Ok(Self {
            config,
            expander,
            registry,
            options,
            docvars,
        })
    }

    fn table_key(config: &IngestConfig) -> TableKey {
        match &config.docvars_key {
            Some(column) => TableKey::Column(column.clone()),
            None => TableKey::Position,
        }
    }

    /// Use another converter for pdf, doc and docx sources
    pub fn with_converter(mut self, converter: Arc<dyn DocumentConverter>) -> Self {
        for format in [ConvertFormat::Pdf, ConvertFormat::Doc, ConvertFormat::Docx] {
            self.registry.register(
                &[format.extension()],
                BinaryExtractor::new(format, converter.clone()),
            );
        }
        self
    }

    /// Attach the metadata table for `docvarsfrom = "table"`
    ///
    /// Replaces a table loaded from `docvars_table`.
    pub fn with_docvar_table(mut self, table: DocvarTable) -> Result<Self> {
        if self.config.docvarsfrom != DocvarsFrom::Table {
            return Err(Error::config(
                "a docvars table requires docvarsfrom = 'table'",
            ));
        }
        self.docvars = DocvarPolicy::Table(table);
        Ok(self)
    }

    /// Replace the extractor registry
    pub fn with_registry(mut self, registry: ExtractorRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Configuration in use
    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Ingest one locator: glob, directory, file, archive or URL
    pub async fn ingest(&self, locator: &str) -> Result<IngestOutcome> {
        self.ingest_many(&[locator]).await
    }

    /// Ingest several locators; their sources are concatenated in order
    pub async fn ingest_many<S: AsRef<str>>(&self, locators: &[S]) -> Result<IngestOutcome> {
        if self.config.docvarsfrom == DocvarsFrom::Table
            && matches!(self.docvars, DocvarPolicy::None)
        {
            return Err(Error::config(
                "docvarsfrom = 'table' requires docvars_table or with_docvar_table",
            ));
        }

        let start = Instant::now();
        let mut expanded = self.expander.expand_all(locators).await?;
        let mut warnings = expanded.take_warnings();
        let sources = expanded.sources();
        tracing::info!("Ingesting {} sources", sources.len());

        let plan = EncodingPlan::resolve(&self.config.encoding, sources)?;

        let mut synthesized: HashMap<usize, Vec<(String, Value)>> = HashMap::new();
        let mut jobs = Vec::with_capacity(sources.len());

        for (position, source) in sources.iter().enumerate() {
            match self.docvars.synthesize(position, source) {
                Ok(docvars) => {
                    synthesized.insert(position, docvars);
                }
                Err(Error::DocvarMismatch {
                    source_id,
                    expected,
                    found,
                }) if self.config.docvar_mismatch == MismatchPolicy::Skip => {
                    tracing::warn!(
                        "Skipping '{}': expected {} docvar fields, found {}",
                        source_id,
                        expected,
                        found
                    );
                    warnings.push(Warning {
                        source_id,
                        kind: WarningKind::DocvarMismatch { expected, found },
                    });
                    continue;
                }
                Err(e) => return Err(e),
            }

            let encoding = plan.get(position).ok_or_else(|| {
                Error::encoding(&source.id, "<none>", "no encoding resolved for this source")
            })?;
            jobs.push(ExtractionJob {
                position,
                source: source.clone(),
                encoding,
            });
        }

        let worker = ExtractionWorker::new(
            self.registry.clone(),
            self.options.clone(),
            self.config.worker_count(),
            self.config.on_error,
        );
        let output = worker.run(jobs).await?;
        warnings.extend(output.warnings);

        let extractions = output
            .extracted
            .into_iter()
            .map(|done| SourceExtraction {
                file_name: done.source.file_name().to_string(),
                docvars: synthesized.remove(&done.position).unwrap_or_default(),
                source_id: done.source.id,
                records: done.records,
            })
            .collect();

        let (table, assembly_warnings) = assemble(extractions);
        warnings.extend(assembly_warnings);
        warnings.extend(plan.into_warnings());
        drop(expanded);

        tracing::info!(
            "Ingested {} documents with {} docvar columns in {:.2}s ({} warnings)",
            table.len(),
            table.docvar_columns.len(),
            start.elapsed().as_secs_f64(),
            warnings.len()
        );

        Ok(IngestOutcome { table, warnings })
    }
}
