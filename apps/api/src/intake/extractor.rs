//! Primary structured extraction, behind a swappable trait.
//!
//! The pipeline only sees `Arc<dyn FieldExtractor>`, so the backend can be
//! swapped (or mocked in tests) without touching the controller or handler.
//! Default backend: `HeuristicExtractor`, section heuristics over the
//! document's extracted text.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::errors::AppError;
use crate::intake::fields::{FieldMap, ResumeField};
use crate::intake::validation::{Document, DocumentKind};

/// A capability that attempts structured field extraction from a validated
/// document. May fail or return a partial map; callers decide how to recover.
#[async_trait]
pub trait FieldExtractor: Send + Sync {
    async fn extract(&self, document: &Document) -> Result<FieldMap, AppError>;
}

/// Extracts the document's full text, pages joined by newlines.
/// Runs on the blocking pool since pdf parsing is CPU-bound.
pub(crate) async fn document_text(document: &Document) -> Result<String, AppError> {
    if document.kind() != DocumentKind::Pdf {
        return Err(AppError::Extraction(format!(
            "no text extraction backend for {:?} documents",
            document.kind()
        )));
    }
    let path = document.path().to_owned();
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text(&path))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("text extraction task panicked: {e}")))?
        .map_err(|e| AppError::Extraction(format!("pdf text extraction failed: {e}")))?;
    Ok(text)
}

/// Default primary backend: line/section heuristics over extracted text.
///
/// Resolves `name` from the first header-like line, `skills` from a "Skills"
/// section, and `education`/`experience`/`summary` from their section bodies.
/// PDF only; any other kind is an extraction error the pipeline absorbs.
pub struct HeuristicExtractor;

#[async_trait]
impl FieldExtractor for HeuristicExtractor {
    async fn extract(&self, document: &Document) -> Result<FieldMap, AppError> {
        let text = document_text(document).await?;
        let fields = fields_from_sections(&text);
        debug!(
            filename = document.filename(),
            resolved = fields.len(),
            "primary extraction finished"
        );
        Ok(fields)
    }
}

const SECTION_HEADINGS: &[(&str, ResumeField)] = &[
    ("skills", ResumeField::Skills),
    ("technical skills", ResumeField::Skills),
    ("education", ResumeField::Education),
    ("experience", ResumeField::Experience),
    ("work experience", ResumeField::Experience),
    ("professional experience", ResumeField::Experience),
    ("summary", ResumeField::Summary),
    ("professional summary", ResumeField::Summary),
    ("objective", ResumeField::Summary),
];

/// Applies section heuristics to raw resume text.
pub fn fields_from_sections(text: &str) -> FieldMap {
    let mut fields = FieldMap::new();

    if let Some(name) = detect_name(text) {
        fields.insert(ResumeField::Name, Value::String(name));
    }

    for (field, body) in split_sections(text) {
        if fields.contains_key(&field) {
            continue;
        }
        match field {
            ResumeField::Skills => {
                let skills = split_skill_list(&body);
                if !skills.is_empty() {
                    fields.insert(ResumeField::Skills, json!(skills));
                }
            }
            _ => {
                if !body.trim().is_empty() {
                    fields.insert(field, Value::String(body.trim().to_string()));
                }
            }
        }
    }

    fields
}

/// The candidate's name is usually the first short, digit-free line that is
/// not a section heading or contact detail.
fn detect_name(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(5)
        .find(|line| {
            let words = line.split_whitespace().count();
            (1..=4).contains(&words)
                && line.len() <= 60
                && !line.contains('@')
                && !line.chars().any(|c| c.is_ascii_digit())
                && !is_section_heading(line)
        })
        .map(str::to_string)
}

fn is_section_heading(line: &str) -> bool {
    let normalized = line.trim().trim_end_matches(':').to_lowercase();
    SECTION_HEADINGS
        .iter()
        .any(|(heading, _)| *heading == normalized)
}

/// Splits the text into (field, body) pairs at recognized headings.
/// A section body runs until the next recognized heading.
fn split_sections(text: &str) -> Vec<(ResumeField, String)> {
    let mut sections = Vec::new();
    let mut current: Option<(ResumeField, Vec<&str>)> = None;

    for line in text.lines() {
        let normalized = line.trim().trim_end_matches(':').to_lowercase();
        let heading = SECTION_HEADINGS
            .iter()
            .find(|(name, _)| *name == normalized)
            .map(|(_, field)| *field);

        if let Some(field) = heading {
            if let Some((prev_field, body)) = current.take() {
                sections.push((prev_field, body.join("\n")));
            }
            current = Some((field, Vec::new()));
        } else if let Some((_, body)) = current.as_mut() {
            body.push(line);
        }
    }
    if let Some((field, body)) = current {
        sections.push((field, body.join("\n")));
    }
    sections
}

/// Skills sections list items separated by commas, bullets, or lines.
fn split_skill_list(body: &str) -> Vec<String> {
    body.lines()
        .flat_map(|line| line.split(&[',', '•', ';'][..]))
        .map(|item| item.trim().trim_start_matches('-').trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
