//! Bounded-parallel extraction

mod worker;

pub use worker::{ExtractedSource, ExtractionJob, ExtractionWorker, WorkerOutput};
