//! Locator expansion: globs, directories, files, archives and URLs
//!
//! Locators are tested in order: http(s) URL, glob pattern, directory, file.
//! Discovery order is deterministic: glob matches are alphabetical and
//! directory walks are sorted by file name, depth first.

use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use walkdir::WalkDir;

use super::archive::{self, staging_dir};
use super::remote::RemoteFetcher;
use crate::error::{Error, Result};
use crate::types::source::{extension_of, is_archive_extension, relative_id};
use crate::types::{Source, Warning, WarningKind};

/// macOS resource-fork directories found in many zip files
const IGNORED_DIRS: &[&str] = &["__MACOSX"];

/// Expansion options
#[derive(Debug, Clone, Copy)]
pub struct ExpandOptions {
    /// Descend into subdirectories of directory and glob matches
    pub recursive: bool,
    /// Accept locators that yield no sources
    pub allow_empty: bool,
    /// Upper bound for one URL fetch
    pub fetch_timeout: Duration,
    /// Record archives that fail to unpack during a walk or glob as warnings
    /// instead of failing the expansion
    pub collect_failures: bool,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            allow_empty: false,
            fetch_timeout: Duration::from_secs(60),
            collect_failures: false,
        }
    }
}

/// Sources discovered for one or more locators
///
/// Owns every staging directory created while expanding. Staged files stay
/// readable while this value lives and are removed when it is dropped.
#[derive(Debug, Default)]
pub struct ExpandedSources {
    sources: Vec<Source>,
    staging: Vec<TempDir>,
    warnings: Vec<Warning>,
}

impl ExpandedSources {
    /// Sources in discovery order
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Number of sources
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether no source was discovered
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Archives skipped under `collect_failures`
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Take the collected warnings, leaving none behind
    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }

    /// Number of live staging directories
    pub fn staging_count(&self) -> usize {
        self.staging.len()
    }

    /// Append another expansion, keeping its staging directories alive
    pub fn append(&mut self, mut other: ExpandedSources) {
        self.sources.append(&mut other.sources);
        self.staging.append(&mut other.staging);
        self.warnings.append(&mut other.warnings);
    }

    /// Drop the sources for which `keep` returns false
    pub fn retain(&mut self, keep: impl FnMut(&Source) -> bool) {
        self.sources.retain(keep);
    }
}

/// Turns locators into concrete sources
#[derive(Debug, Clone)]
pub struct SourceExpander {
    options: ExpandOptions,
    fetcher: RemoteFetcher,
}

impl SourceExpander {
    /// Create an expander
    pub fn new(options: ExpandOptions) -> Result<Self> {
        Ok(Self {
            options,
            fetcher: RemoteFetcher::new(options.fetch_timeout)?,
        })
    }

    /// Expansion options in use
    pub fn options(&self) -> &ExpandOptions {
        &self.options
    }

    /// Expand one locator
    pub async fn expand(&self, locator: &str) -> Result<ExpandedSources> {
        let expanded = if RemoteFetcher::is_url(locator) {
            self.expand_url(locator).await?
        } else {
            let owned = locator.to_string();
            let options = self.options;
            tokio::task::spawn_blocking(move || expand_local(&owned, &options))
                .await
                .map_err(|e| Error::resolution(locator, format!("expansion task failed: {}", e)))??
        };

        if expanded.is_empty() && !self.options.allow_empty {
            return Err(Error::resolution(locator, "matched no sources"));
        }

        tracing::debug!(
            "Expanded '{}' into {} sources ({} staged archives)",
            locator,
            expanded.len(),
            expanded.staging_count()
        );
        Ok(expanded)
    }

    /// Expand several locators in order and concatenate the results
    pub async fn expand_all<S: AsRef<str>>(&self, locators: &[S]) -> Result<ExpandedSources> {
        let mut all = ExpandedSources::default();
        for locator in locators {
            all.append(self.expand(locator.as_ref()).await?);
        }
        Ok(all)
    }

    async fn expand_url(&self, url: &str) -> Result<ExpandedSources> {
        let fetched = self.fetcher.fetch(url).await?;

        if !is_archive_extension(&fetched.extension) {
            let mut expanded = ExpandedSources::default();
            expanded
                .sources
                .push(Source::from_bytes(url, fetched.extension, fetched.body));
            return Ok(expanded);
        }

        let owned = url.to_string();
        tokio::task::spawn_blocking(move || {
            let download = staging_dir()?;
            let path = download
                .path()
                .join(format!("download.{}", fetched.extension));
            std::fs::write(&path, &fetched.body).map_err(|e| Error::io(&path, e))?;

            let mut collector = Collector::new(true, false);
            collector.staging.push(download);
            collector
                .unpack(&path, &fetched.extension)
                .map_err(|e| match e {
                    Error::SourceResolution { message, .. } => Error::resolution(&owned, message),
                    other => other,
                })?;
            Ok(collector.finish())
        })
        .await
        .map_err(|e| Error::resolution(url, format!("expansion task failed: {}", e)))?
    }
}

fn is_glob(locator: &str) -> bool {
    locator.contains(['*', '?', '['])
}

fn expand_local(locator: &str, options: &ExpandOptions) -> Result<ExpandedSources> {
    let recursive = options.recursive;
    let mut collector = Collector::new(recursive, options.collect_failures);

    if is_glob(locator) {
        let matches = glob::glob(locator)
            .map_err(|e| Error::resolution(locator, format!("invalid glob pattern: {}", e)))?;
        for entry in matches {
            let path = entry.map_err(|e| Error::io(e.path().to_path_buf(), e.into_error()))?;
            if path.is_dir() {
                if recursive {
                    collector.walk(&path, None)?;
                }
                continue;
            }
            collector.entry(&path, path.display().to_string())?;
        }
        return Ok(collector.finish());
    }

    let path = Path::new(locator);
    if path.is_dir() {
        collector.walk(path, None)?;
    } else if path.is_file() {
        collector.file(path, locator.to_string())?;
    } else {
        return Err(Error::resolution(locator, "no such file or directory"));
    }
    Ok(collector.finish())
}

/// Accumulates sources and staging directories during a blocking walk
struct Collector {
    recursive: bool,
    collect_failures: bool,
    sources: Vec<Source>,
    staging: Vec<TempDir>,
    warnings: Vec<Warning>,
}

impl Collector {
    fn new(recursive: bool, collect_failures: bool) -> Self {
        Self {
            recursive,
            collect_failures,
            sources: Vec::new(),
            staging: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn finish(self) -> ExpandedSources {
        ExpandedSources {
            sources: self.sources,
            staging: self.staging,
            warnings: self.warnings,
        }
    }

    /// Walk a directory; ids are relative to `id_root` when given (archive members)
    fn walk(&mut self, root: &Path, id_root: Option<&Path>) -> Result<()> {
        let mut walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(true)
            .sort_by_file_name();
        if id_root.is_none() && !self.recursive {
            walker = walker.max_depth(1);
        }

        let entries = walker.into_iter().filter_entry(|e| {
            !(e.file_type().is_dir()
                && IGNORED_DIRS.iter().any(|d| e.file_name() == *d))
        });

        for entry in entries {
            let entry = entry.map_err(|e| {
                Error::resolution(root.display().to_string(), e.to_string())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let id = match id_root {
                Some(base) => relative_id(base, entry.path()),
                None => entry.path().display().to_string(),
            };
            self.entry(entry.path(), id)?;
        }
        Ok(())
    }

    /// A file found by a walk or glob; failed archives may be skipped
    fn entry(&mut self, path: &Path, id: String) -> Result<()> {
        if !self.collect_failures {
            return self.file(path, id);
        }

        let (sources, staging, warnings) =
            (self.sources.len(), self.staging.len(), self.warnings.len());
        match self.file(path, id.clone()) {
            Ok(()) => Ok(()),
            Err(e) => {
                // drop whatever the failed archive contributed
                self.sources.truncate(sources);
                self.staging.truncate(staging);
                self.warnings.truncate(warnings);
                tracing::warn!("Skipping '{}': {}", id, e);
                self.warnings.push(Warning {
                    source_id: id,
                    kind: WarningKind::SourceFailed {
                        message: e.to_string(),
                    },
                });
                Ok(())
            }
        }
    }

    fn file(&mut self, path: &Path, id: String) -> Result<()> {
        let extension = extension_of(&id);
        if is_archive_extension(&extension) {
            return self.unpack(path, &extension);
        }
        self.sources.push(Source::from_path(id, path));
        Ok(())
    }

    fn unpack(&mut self, path: &Path, extension: &str) -> Result<()> {
        let staged = archive::unpack(path, extension)?;
        let root = staged.path().to_path_buf();
        self.staging.push(staged);
        // archive members are always traversed fully
        self.walk(&root, Some(&root))
    }
}
