//! Pattern-based text fallback for PDFs.
//!
//! When the primary extractor leaves required fields unresolved and the
//! document is text-bearing, this extractor pulls the full text and runs two
//! independent first-match detectors (email, phone). `raw_text` is populated
//! on every successful run regardless of detector hits; a detector miss is
//! "field not provided", never an error.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::errors::AppError;
use crate::intake::extractor::{document_text, FieldExtractor};
use crate::intake::fields::{FieldMap, ResumeField};
use crate::intake::validation::Document;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    // local-part@domain, word/dot/dash characters around the @
    Regex::new(r"[\w.\-]+@[\w.\-]+").expect("Failed to compile EMAIL_RE")
});

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    // 9+ digits, optional space/dash separators, optional leading +
    Regex::new(r"\+?\d[\d \-]{8,}\d").expect("Failed to compile PHONE_RE")
});

/// First email-shaped token in document order, if any.
pub fn detect_email(text: &str) -> Option<&str> {
    EMAIL_RE.find(text).map(|m| m.as_str())
}

/// First phone-shaped run of digits in document order, if any.
pub fn detect_phone(text: &str) -> Option<&str> {
    PHONE_RE.find(text).map(|m| m.as_str())
}

/// Runs both detectors over already-extracted text and captures the text
/// itself under `raw_text`.
pub fn fields_from_text(text: &str) -> FieldMap {
    let mut fields = FieldMap::new();
    fields.insert(ResumeField::RawText, Value::String(text.to_string()));
    if let Some(email) = detect_email(text) {
        fields.insert(ResumeField::Email, Value::String(email.to_string()));
    }
    if let Some(phone) = detect_phone(text) {
        fields.insert(ResumeField::Phone, Value::String(phone.to_string()));
    }
    fields
}

/// The fallback backend. Fails only when text extraction itself fails
/// (corrupt or non-text-bearing document).
pub struct TextFallbackExtractor;

#[async_trait]
impl FieldExtractor for TextFallbackExtractor {
    async fn extract(&self, document: &Document) -> Result<FieldMap, AppError> {
        let text = document_text(document).await?;
        let fields = fields_from_text(&text);
        debug!(
            filename = document.filename(),
            detected = fields.len() - 1,
            "text fallback finished"
        );
        Ok(fields)
    }
}
