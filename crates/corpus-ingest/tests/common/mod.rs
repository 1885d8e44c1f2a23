//! Shared fixtures for integration tests

#![allow(dead_code)]

use corpus_ingest::{IngestConfig, IngestOutcome, Ingestor};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Write a file below `dir`, creating parent directories
pub fn write(dir: &Path, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

/// Locator string for a path
pub fn locator(path: &Path) -> String {
    path.display().to_string()
}

/// Run an ingestion with `config`
pub async fn ingest(config: IngestConfig, locator: &str) -> corpus_ingest::Result<IngestOutcome> {
    Ingestor::new(config)?.ingest(locator).await
}

/// `(doc_id, text)` pairs of a table
pub fn rows(outcome: &IngestOutcome) -> Vec<(String, String)> {
    outcome
        .table
        .rows
        .iter()
        .map(|r| (r.doc_id.clone(), r.text.clone()))
        .collect()
}

/// Small corpus: two top-level texts and one in a subdirectory
pub const CORPUS: &[(&str, &str)] = &[
    ("a.txt", "Fellow citizens of the Senate"),
    ("b.txt", "Among the vicissitudes incident to life"),
    ("sub/c.txt", "When it was first perceived"),
];

pub fn corpus_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, text) in CORPUS {
        write(dir.path(), name, text);
    }
    dir
}

/// Zip the corpus into `path`
pub fn corpus_zip(path: &Path) {
    let file = File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    for (name, text) in CORPUS {
        zip.start_file(*name, options).unwrap();
        zip.write_all(text.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

/// Write the corpus as a tar stream into `writer` and hand the writer back
fn corpus_tar_into<W: Write>(writer: W) -> W {
    let staging = corpus_dir();
    let mut builder = tar::Builder::new(writer);
    for (name, _) in CORPUS {
        builder
            .append_path_with_name(staging.path().join(name), name)
            .unwrap();
    }
    builder.into_inner().unwrap()
}

/// Plain tarball of the corpus at `path`
pub fn corpus_tar(path: &Path) {
    corpus_tar_into(File::create(path).unwrap());
}

/// Gzipped tarball of the corpus at `path`
pub fn corpus_tar_gz(path: &Path) {
    let encoder = flate2::write::GzEncoder::new(File::create(path).unwrap(), flate2::Compression::default());
    corpus_tar_into(encoder).finish().unwrap();
}

/// Bzip2-compressed tarball of the corpus at `path`
pub fn corpus_tar_bz2(path: &Path) {
    let encoder = bzip2::write::BzEncoder::new(File::create(path).unwrap(), bzip2::Compression::default());
    corpus_tar_into(encoder).finish().unwrap();
}
