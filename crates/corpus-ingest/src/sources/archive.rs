//! Archive staging
//!
//! Archives are unpacked into a fresh temporary directory. The returned
//! [`TempDir`] removes everything when dropped, so callers keep it alive for
//! as long as the staged sources are in use.

use flate2::read::GzDecoder;
use bzip2::read::BzDecoder;
use std::fs::File;
use std::path::Path;
use tempfile::TempDir;

use crate::error::{Error, Result};

/// Create an empty staging directory
pub(crate) fn staging_dir() -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix("corpus-ingest-")
        .tempdir()
        .map_err(|e| Error::io(std::env::temp_dir(), e))
}

/// Unpack `archive` (zip, tar, tar.gz/tgz, tar.bz2/tbz2) into a staging directory
pub fn unpack(archive: &Path, extension: &str) -> Result<TempDir> {
    let dir = staging_dir()?;
    let file = File::open(archive).map_err(|e| Error::io(archive, e))?;
    let corrupt = |e: &dyn std::fmt::Display| {
        Error::resolution(
            archive.display().to_string(),
            format!("cannot unpack archive: {}", e),
        )
    };

    match extension {
        "zip" => {
            let mut zip = zip::ZipArchive::new(file).map_err(|e| corrupt(&e))?;
            zip.extract(dir.path()).map_err(|e| corrupt(&e))?;
        }
        "tar" => tar::Archive::new(file)
            .unpack(dir.path())
            .map_err(|e| corrupt(&e))?,
        "tar.gz" | "tgz" => tar::Archive::new(GzDecoder::new(file))
            .unpack(dir.path())
            .map_err(|e| corrupt(&e))?,
        "tar.bz2" | "tbz2" => tar::Archive::new(BzDecoder::new(file))
            .unpack(dir.path())
            .map_err(|e| corrupt(&e))?,
        other => return Err(corrupt(&format!("'.{}' is not an archive format", other))),
    }

    tracing::debug!("Unpacked {} into {}", archive.display(), dir.path().display());
    Ok(dir)
}
