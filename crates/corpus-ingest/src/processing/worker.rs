//! Parallel extraction worker
//!
//! Sources are extracted on the blocking pool, at most `parallelism` at a
//! time. Results come back through an ordered buffered stream, so output
//! order equals input order whatever the completion order.

use encoding_rs::Encoding;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;

use crate::config::ErrorPolicy;
use crate::error::{Error, Result};
use crate::ingestion::{ExtractInput, ExtractionOptions, ExtractorRegistry};
use crate::types::{DocumentRecord, Source, Warning};

/// One source scheduled for extraction
#[derive(Debug, Clone)]
pub struct ExtractionJob {
    /// Discovery position, carried through to the result
    pub position: usize,
    /// Source to extract
    pub source: Source,
    /// Declared encoding for the source
    pub encoding: &'static Encoding,
}

/// Records extracted from one source
#[derive(Debug, Clone)]
pub struct ExtractedSource {
    /// Discovery position of the source
    pub position: usize,
    /// The source the records came from
    pub source: Source,
    /// Records in within-source order
    pub records: Vec<DocumentRecord>,
}

/// Output of a worker run
#[derive(Debug, Default)]
pub struct WorkerOutput {
    /// Successful extractions in input order
    pub extracted: Vec<ExtractedSource>,
    /// Failures collected under `ErrorPolicy::Collect`
    pub warnings: Vec<Warning>,
}

/// Runs extraction jobs with bounded parallelism
#[derive(Clone)]
pub struct ExtractionWorker {
    registry: ExtractorRegistry,
    options: Arc<ExtractionOptions>,
    parallelism: usize,
    policy: ErrorPolicy,
}

impl ExtractionWorker {
    /// Create a worker
    pub fn new(
        registry: ExtractorRegistry,
        options: ExtractionOptions,
        parallelism: usize,
        policy: ErrorPolicy,
    ) -> Self {
        let parallelism = parallelism.max(1);
        tracing::debug!("Extraction worker configured: {} parallel sources, {:?}", parallelism, policy);

        Self {
            registry,
            options: Arc::new(options),
            parallelism,
            policy,
        }
    }

    /// Extract every job
    ///
    /// Under `FailFast` the first failure is returned, jobs not yet started are
    /// never run and results of jobs in flight are discarded. Under `Collect`
    /// failures become warnings and the remaining jobs still run.
    pub async fn run(&self, jobs: Vec<ExtractionJob>) -> Result<WorkerOutput> {
        let total = jobs.len();
        tracing::info!("Extracting {} sources ({} in parallel)", total, self.parallelism);

        let tasks = jobs.into_iter().map(|job| {
            let registry = self.registry.clone();
            let options = self.options.clone();
            async move {
                let source_id = job.source.id.clone();
                let result = tokio::task::spawn_blocking(move || extract_one(&registry, &options, job))
                    .await
                    .map_err(|e| Error::Task {
                        source_id: source_id.clone(),
                        message: e.to_string(),
                    })
                    .and_then(|r| r);
                (source_id, result)
            }
        });

        let mut results = stream::iter(tasks).buffered(self.parallelism);
        let mut output = WorkerOutput::default();

        while let Some((source_id, result)) = results.next().await {
            match result {
                Ok(extracted) => output.extracted.push(extracted),
                Err(e) if self.policy == ErrorPolicy::Collect => {
                    tracing::warn!("Skipping '{}': {}", source_id, e);
                    output.warnings.push(Warning::failed(&source_id, &e));
                }
                Err(e) => {
                    tracing::error!("Failed to extract '{}': {}", source_id, e);
                    return Err(e);
                }
            }
        }

        tracing::info!(
            "Extracted {} of {} sources ({} failed)",
            output.extracted.len(),
            total,
            output.warnings.len()
        );
        Ok(output)
    }
}

fn extract_one(
    registry: &ExtractorRegistry,
    options: &ExtractionOptions,
    job: ExtractionJob,
) -> Result<ExtractedSource> {
    let start = Instant::now();
    let extractor = registry.dispatch(&job.source)?;
    let bytes = job.source.read()?;

    let input = ExtractInput {
        source_id: &job.source.id,
        extension: &job.source.extension,
        bytes: &bytes,
        encoding: job.encoding,
        options,
    };
    let records = extractor.extract(&input)?;

    let elapsed = start.elapsed();
    if elapsed.as_secs() > 60 {
        tracing::warn!(
            "Slow extraction for '{}': took {:.1}s",
            job.source.id,
            elapsed.as_secs_f64()
        );
    }
    tracing::debug!(
        "[{}] {} extractor: {} records ({} bytes, {:.1}ms)",
        job.source.id,
        extractor.name(),
        records.len(),
        bytes.len(),
        elapsed.as_secs_f64() * 1000.0
    );

    Ok(ExtractedSource {
        position: job.position,
        source: job.source,
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::Extractor;
    use crate::types::source::extension_of;
    use bytes::Bytes;
    use std::time::Duration;

    /// Sleeps longer for earlier sources so completion order is reversed
    struct SlowText;

    impl Extractor for SlowText {
        fn name(&self) -> &'static str {
            "slow"
        }

        fn extract(&self, input: &ExtractInput<'_>) -> Result<Vec<DocumentRecord>> {
            let text = input.decode()?;
            let delay: u64 = text.trim().parse().unwrap_or(0);
            std::thread::sleep(Duration::from_millis(delay));
            if text.contains("boom") {
                return Err(Error::parse(input.source_id, "slow", "boom"));
            }
            Ok(vec![DocumentRecord::text(text)])
        }
    }

    fn worker(policy: ErrorPolicy) -> ExtractionWorker {
        let mut registry = ExtractorRegistry::new();
        registry.register(&["txt"], SlowText);
        ExtractionWorker::new(registry, ExtractionOptions::default(), 4, policy)
    }

    fn job(position: usize, id: &str, body: &'static str) -> ExtractionJob {
        ExtractionJob {
            position,
            source: Source::from_bytes(id, extension_of(id), Bytes::from_static(body.as_bytes())),
            encoding: encoding_rs::UTF_8,
        }
    }

    #[tokio::test]
    async fn test_output_keeps_input_order() {
        let jobs = vec![job(0, "a.txt", "60"), job(1, "b.txt", "30"), job(2, "c.txt", "0")];
        let output = worker(ErrorPolicy::FailFast).run(jobs).await.unwrap();

        let ids: Vec<&str> = output.extracted.iter().map(|e| e.source.id.as_str()).collect();
        assert_eq!(ids, vec!["a.txt", "b.txt", "c.txt"]);
        assert!(output.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_fail_fast_returns_first_error() {
        let jobs = vec![job(0, "a.txt", "0"), job(1, "bad.txt", "boom"), job(2, "c.txt", "0")];
        let err = worker(ErrorPolicy::FailFast).run(jobs).await.unwrap_err();
        assert_eq!(err.source_id(), Some("bad.txt"));
    }

    #[tokio::test]
    async fn test_collect_keeps_good_sources() {
        let jobs = vec![
            job(0, "a.txt", "0"),
            job(1, "bad.txt", "boom"),
            job(2, "image.bmp", "0"),
            job(3, "c.txt", "0"),
        ];
        let output = worker(ErrorPolicy::Collect).run(jobs).await.unwrap();

        let positions: Vec<usize> = output.extracted.iter().map(|e| e.position).collect();
        assert_eq!(positions, vec![0, 3]);
        let failed: Vec<&str> = output.warnings.iter().map(|w| w.source_id.as_str()).collect();
        assert_eq!(failed, vec!["bad.txt", "image.bmp"]);
    }
}
