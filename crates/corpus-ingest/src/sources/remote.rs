//! URL sources

use bytes::Bytes;
use reqwest::Client;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::source::extension_of;

/// Body and inferred extension of a fetched URL
#[derive(Debug, Clone)]
pub struct Fetched {
    /// Response body
    pub body: Bytes,
    /// Extension from the URL path, else from `Content-Type`
    pub extension: String,
}

/// Extension for a `Content-Type` value
///
/// Registered formats are mapped explicitly; anything else goes through
/// `mime_guess`.
pub fn content_type_extension(content_type: &str) -> Option<String> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();

    let known = match essence.as_str() {
        "text/plain" => Some("txt"),
        "text/csv" => Some("csv"),
        "text/tab-separated-values" => Some("tsv"),
        "application/json" | "text/json" => Some("json"),
        "application/x-ndjson" => Some("ndjson"),
        "application/xml" | "text/xml" => Some("xml"),
        "text/html" => Some("html"),
        "application/pdf" => Some("pdf"),
        "application/msword" => Some("doc"),
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => Some("docx"),
        "application/zip" | "application/x-zip-compressed" => Some("zip"),
        "application/x-tar" => Some("tar"),
        "application/gzip" | "application/x-gzip" => Some("tar.gz"),
        "application/x-bzip2" => Some("tar.bz2"),
        _ => None,
    };

    known.map(str::to_string).or_else(|| {
        mime_guess::get_mime_extensions_str(&essence)
            .and_then(|exts| exts.first())
            .map(|ext| ext.to_string())
    })
}

/// HTTP fetcher with a hard timeout
#[derive(Debug, Clone)]
pub struct RemoteFetcher {
    client: Client,
    timeout: Duration,
}

impl RemoteFetcher {
    /// Create a fetcher; every request fails once `timeout` elapses
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("corpus-ingest/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, timeout })
    }

    /// Whether a locator is an http(s) URL
    pub fn is_url(locator: &str) -> bool {
        let lower = locator.to_ascii_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://")
    }

    /// Fetch a URL into memory
    pub async fn fetch(&self, url: &str) -> Result<Fetched> {
        tracing::info!("Fetching {}", url);

        let failed = |e: reqwest::Error| {
            if e.is_timeout() {
                Error::resolution(url, format!("timed out after {}s", self.timeout.as_secs()))
            } else {
                Error::resolution(url, e.to_string())
            }
        };

        let response = self.client.get(url).send().await.map_err(failed)?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::resolution(url, format!("HTTP {}", status)));
        }

        let path_extension = response
            .url()
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(extension_of)
            .unwrap_or_default();
        let header_extension = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(content_type_extension);

        let body = response.bytes().await.map_err(failed)?;

        let extension = if path_extension.is_empty() {
            header_extension.unwrap_or_default()
        } else {
            path_extension
        };

        tracing::debug!("Fetched {} ({} bytes, .{})", url, body.len(), extension);
        Ok(Fetched { body, extension })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_extension() {
        assert_eq!(content_type_extension("text/plain; charset=utf-8").as_deref(), Some("txt"));
        assert_eq!(content_type_extension("Application/JSON").as_deref(), Some("json"));
        assert_eq!(content_type_extension("application/zip").as_deref(), Some("zip"));
        assert_eq!(content_type_extension("application/x-unknown-thing"), None);
    }

    #[test]
    fn test_is_url() {
        assert!(RemoteFetcher::is_url("https://example.org/a.txt"));
        assert!(RemoteFetcher::is_url("HTTP://example.org"));
        assert!(!RemoteFetcher::is_url("data/*.txt"));
    }
}
