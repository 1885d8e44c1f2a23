//! Byte-bearing sources discovered by the expander

use bytes::Bytes;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Archive extensions that are unpacked rather than extracted
pub const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "tar", "tar.gz", "tgz", "tar.bz2", "tbz2"];

/// Where a source's bytes live
#[derive(Debug, Clone)]
pub enum Payload {
    /// Local file, read when the source is extracted
    File(PathBuf),
    /// Bytes already in memory (fetched URL bodies)
    Memory(Bytes),
}

/// One concrete unit to extract from
#[derive(Debug, Clone)]
pub struct Source {
    /// Discovered path, archive-relative path, or URL
    pub id: String,
    /// Where to read the bytes from
    pub payload: Payload,
    /// Lower-cased extension without the leading dot
    pub extension: String,
}

impl Source {
    /// Source backed by a local file
    pub fn from_path(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let id = id.into();
        let extension = extension_of(&id);
        Self {
            id,
            payload: Payload::File(path),
            extension,
        }
    }

    /// Source backed by in-memory bytes
    pub fn from_bytes(id: impl Into<String>, extension: impl Into<String>, data: Bytes) -> Self {
        Self {
            id: id.into(),
            payload: Payload::Memory(data),
            extension: extension.into().to_lowercase(),
        }
    }

    /// Final path segment of the identifier
    pub fn file_name(&self) -> &str {
        file_name_of(&self.id)
    }

    /// File name with the extension removed
    pub fn stem(&self) -> &str {
        strip_extension(self.file_name(), &self.extension)
    }

    /// Read the payload
    pub fn read(&self) -> Result<Bytes> {
        match &self.payload {
            Payload::File(path) => std::fs::read(path)
                .map(Bytes::from)
                .map_err(|e| Error::io(path, e)),
            Payload::Memory(data) => Ok(data.clone()),
        }
    }
}

/// Final segment of a `/`- or `\`-separated identifier, ignoring any URL query
pub fn file_name_of(id: &str) -> &str {
    let id = if id.contains("://") {
        id.split(['?', '#']).next().unwrap_or(id)
    } else {
        id
    };
    id.rsplit(['/', '\\']).next().unwrap_or(id)
}

/// Lower-cased extension of an identifier; compound archive extensions count as one
pub fn extension_of(id: &str) -> String {
    let name = file_name_of(id).to_lowercase();
    for compound in ["tar.gz", "tar.bz2"] {
        if name.len() > compound.len() + 1 && name.ends_with(&format!(".{}", compound)) {
            return compound.to_string();
        }
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_string(),
        _ => String::new(),
    }
}

/// Remove `.{extension}` from the end of a file name
pub fn strip_extension<'a>(name: &'a str, extension: &str) -> &'a str {
    if extension.is_empty() || name.len() <= extension.len() {
        return name;
    }
    let split = name.len() - extension.len() - 1;
    match name.get(split..) {
        Some(tail)
            if tail.starts_with('.') && tail[1..].eq_ignore_ascii_case(extension) =>
        {
            &name[..split]
        }
        _ => name,
    }
}

/// Whether an extension names a supported archive format
pub fn is_archive_extension(extension: &str) -> bool {
    ARCHIVE_EXTENSIONS.contains(&extension)
}

/// Path relative to `root` with `/` separators, for stable identifiers
pub fn relative_id(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
