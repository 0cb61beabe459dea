//! Upload gate: extension plus content-signature checks.
//!
//! Both checks must pass before a file is allowed anywhere near the
//! extractors — an EXE renamed to `.pdf` fails the signature check. The gate
//! is the only way to obtain a [`Document`], so extraction can never run on
//! an unvetted file.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{info, warn};

use crate::errors::AppError;

/// Accepted upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Maps a filename extension to a kind. Case-insensitive.
    pub fn from_extension(filename: &str) -> Option<Self> {
        let ext = Path::new(filename).extension()?.to_str()?;
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "docx" => Some(DocumentKind::Docx),
            _ => None,
        }
    }

    /// Checks the leading content signature for this kind.
    /// PDF files open with `%PDF-`; DOCX is a ZIP container and opens with
    /// the local-file-header magic `PK\x03\x04`.
    pub fn matches_signature(&self, head: &[u8]) -> bool {
        match self {
            DocumentKind::Pdf => head.starts_with(b"%PDF-"),
            DocumentKind::Docx => head.starts_with(b"PK\x03\x04"),
        }
    }

    /// Only text-bearing formats are eligible for the pattern fallback.
    pub fn supports_text_fallback(&self) -> bool {
        matches!(self, DocumentKind::Pdf)
    }
}

/// A readable document that has passed the upload gate.
#[derive(Debug, Clone)]
pub struct Document {
    path: PathBuf,
    kind: DocumentKind,
    filename: String,
}

impl Document {
    /// Validates the file at `path` against the original upload `filename`.
    ///
    /// Fails with [`AppError::InvalidFormat`] when the extension is not an
    /// accepted format or when the content signature does not match the
    /// extension's format.
    pub fn validate(path: impl Into<PathBuf>, filename: &str) -> Result<Self, AppError> {
        let kind = DocumentKind::from_extension(filename).ok_or_else(|| {
            warn!(filename, "rejected upload: unsupported extension");
            AppError::InvalidFormat(format!(
                "unsupported file extension on '{filename}': only .pdf and .docx are accepted"
            ))
        })?;

        let path = path.into();
        let mut head = [0u8; 8];
        let read = {
            let mut file = std::fs::File::open(&path)
                .with_context(|| format!("failed to open uploaded file at {}", path.display()))?;
            file.read(&mut head)
                .with_context(|| format!("failed to read uploaded file at {}", path.display()))?
        };

        if !kind.matches_signature(&head[..read]) {
            warn!(filename, ?kind, "rejected upload: content signature mismatch");
            return Err(AppError::InvalidFormat(format!(
                "content of '{filename}' does not match its extension"
            )));
        }

        info!(filename, ?kind, "upload passed format gate");
        Ok(Document {
            path,
            kind,
            filename: filename.to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Builds a gate-bypassing document for pipeline tests that use mock
    /// extractors and never touch the path.
    #[cfg(test)]
    pub fn unvalidated_for_tests(kind: DocumentKind) -> Self {
        Document {
            path: PathBuf::from("/nonexistent/test-resume"),
            kind,
            filename: match kind {
                DocumentKind::Pdf => "test-resume.pdf".to_string(),
                DocumentKind::Docx => "test-resume.docx".to_string(),
            },
        }
    }
}
