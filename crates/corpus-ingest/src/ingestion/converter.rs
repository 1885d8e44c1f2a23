//! External converter collaborator for binary document formats
//!
//! The pipeline only sees [`DocumentConverter`]. [`LocalConverter`] is the
//! bundled implementation:
//! - PDF via `pdf-extract` (run on a helper thread with a timeout)
//! - DOCX via `docx-rs` (paragraph runs; tables are skipped)
//! - DOC via `antiword`, falling back to a headless LibreOffice text export

use std::path::Path;
use std::process::Command;
use std::time::Duration;
use thiserror::Error;

use crate::types::ConvertFormat;

/// Failure reported by a converter, carried into `Error::Converter`
#[derive(Debug, Clone, Error)]
#[error("{reason}")]
pub struct ConverterFailure {
    /// Human-readable reason
    pub reason: String,
}

impl ConverterFailure {
    /// Create a failure
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// `bytes, format -> text | failure`
pub trait DocumentConverter: Send + Sync {
    /// Convert a binary document to text
    fn convert(&self, data: &[u8], format: ConvertFormat) -> Result<String, ConverterFailure>;
}

/// Local converter configuration
#[derive(Debug, Clone)]
pub struct LocalConverterConfig {
    /// Upper bound for a single PDF extraction
    pub timeout: Duration,
    /// Try LibreOffice when antiword is missing or fails on a .doc
    pub use_libreoffice_fallback: bool,
}

impl Default for LocalConverterConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            use_libreoffice_fallback: true,
        }
    }
}

/// Converter backed by Rust parsers and locally installed tools
#[derive(Debug, Clone, Default)]
pub struct LocalConverter {
    config: LocalConverterConfig,
}

impl LocalConverter {
    /// Create a local converter
    pub fn new(config: LocalConverterConfig) -> Self {
        Self { config }
    }

    #[cfg(feature = "pdf")]
    fn convert_pdf(&self, data: &[u8]) -> Result<String, ConverterFailure> {
        use std::sync::mpsc;
        use std::thread;

        let data_vec = data.to_vec();
        let (tx, rx) = mpsc::channel();

        // pdf-extract can spin on broken font tables; it cannot be interrupted,
        // so the helper thread is abandoned on timeout
        thread::spawn(move || {
            let result = pdf_extract::extract_text_from_mem(&data_vec);
            let _ = tx.send(result);
        });

        let text = match rx.recv_timeout(self.config.timeout) {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => return Err(ConverterFailure::new(format!("pdf-extract failed: {}", e))),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::error!("PDF extraction timeout after {:?}", self.config.timeout);
                return Err(ConverterFailure::new(format!(
                    "PDF extraction timed out after {}s",
                    self.config.timeout.as_secs()
                )));
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                return Err(ConverterFailure::new("PDF extraction thread crashed"));
            }
        };

        let text = text
            .replace('\0', "")
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        if text.is_empty() {
            return Err(ConverterFailure::new(
                "no text could be extracted; the PDF may be image-based or encrypted",
            ));
        }
        Ok(text)
    }

    #[cfg(not(feature = "pdf"))]
    fn convert_pdf(&self, _data: &[u8]) -> Result<String, ConverterFailure> {
        Err(ConverterFailure::new("built without the 'pdf' feature"))
    }

    #[cfg(feature = "docx")]
    fn convert_docx(&self, data: &[u8]) -> Result<String, ConverterFailure> {
        let doc = docx_rs::read_docx(data)
            .map_err(|e| ConverterFailure::new(format!("docx-rs failed: {}", e)))?;

        let mut content = String::new();
        for child in doc.document.children {
            if let docx_rs::DocumentChild::Paragraph(p) = child {
                for child in p.children {
                    if let docx_rs::ParagraphChild::Run(run) = child {
                        for child in run.children {
                            if let docx_rs::RunChild::Text(t) = child {
                                content.push_str(&t.text);
                            }
                        }
                    }
                }
                content.push('\n');
            }
        }
        Ok(content)
    }

    #[cfg(not(feature = "docx"))]
    fn convert_docx(&self, _data: &[u8]) -> Result<String, ConverterFailure> {
        Err(ConverterFailure::new("built without the 'docx' feature"))
    }

    fn convert_doc(&self, data: &[u8]) -> Result<String, ConverterFailure> {
        let staged = tempfile::Builder::new()
            .prefix("corpus-ingest-")
            .suffix(".doc")
            .tempfile()
            .map_err(|e| ConverterFailure::new(format!("failed to stage .doc: {}", e)))?;
        std::fs::write(staged.path(), data)
            .map_err(|e| ConverterFailure::new(format!("failed to stage .doc: {}", e)))?;

        match Self::run_antiword(staged.path()) {
            Ok(text) => Ok(text),
            Err(e) if self.config.use_libreoffice_fallback => {
                tracing::debug!("antiword failed ({}), trying LibreOffice", e);
                Self::run_libreoffice(staged.path())
                    .map_err(|lo| ConverterFailure::new(format!("{}; {}", e, lo)))
            }
            Err(e) => Err(e),
        }
    }

    fn run_antiword(path: &Path) -> Result<String, ConverterFailure> {
        let output = Command::new("antiword")
            .arg(path)
            .output()
            .map_err(|e| ConverterFailure::new(format!("antiword unavailable: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ConverterFailure::new(format!("antiword error: {}", stderr.trim())));
        }
        String::from_utf8(output.stdout)
            .map_err(|e| ConverterFailure::new(format!("antiword produced invalid UTF-8: {}", e)))
    }

    fn run_libreoffice(path: &Path) -> Result<String, ConverterFailure> {
        let out_dir = tempfile::tempdir()
            .map_err(|e| ConverterFailure::new(format!("failed to create temp dir: {}", e)))?;

        let output = Command::new("libreoffice")
            .arg("--headless")
            .arg("--convert-to")
            .arg("txt:Text")
            .arg("--outdir")
            .arg(out_dir.path())
            .arg(path)
            .output()
            .map_err(|e| ConverterFailure::new(format!("LibreOffice unavailable: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ConverterFailure::new(format!("LibreOffice error: {}", stderr.trim())));
        }

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let converted = out_dir.path().join(format!("{}.txt", stem));
        let bytes = std::fs::read(&converted)
            .map_err(|e| ConverterFailure::new(format!("failed to read converted file: {}", e)))?;
        crate::encoding::decode(&bytes, encoding_rs::UTF_8, &converted.to_string_lossy())
            .map_err(|e| ConverterFailure::new(e.to_string()))
    }
}

impl DocumentConverter for LocalConverter {
    fn convert(&self, data: &[u8], format: ConvertFormat) -> Result<String, ConverterFailure> {
        match format {
            ConvertFormat::Pdf => self.convert_pdf(data),
            ConvertFormat::Docx => self.convert_docx(data),
            ConvertFormat::Doc => self.convert_doc(data),
        }
    }
}
