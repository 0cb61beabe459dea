//! Field-name space for resume intake.
//!
//! Every map flowing through the pipeline — extracted, static, merged — is
//! keyed by `ResumeField` rather than free-form strings, so the merge
//! contract is checkable at compile time and a typo'd form field is rejected
//! at the boundary instead of silently never resolving.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The closed set of fields an intake caller can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResumeField {
    Name,
    Email,
    Phone,
    Skills,
    Education,
    Experience,
    Summary,
    /// Full extracted document text. Populated by the text fallback on every
    /// run; callers rarely list it as required but may.
    RawText,
}

impl ResumeField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResumeField::Name => "name",
            ResumeField::Email => "email",
            ResumeField::Phone => "phone",
            ResumeField::Skills => "skills",
            ResumeField::Education => "education",
            ResumeField::Experience => "experience",
            ResumeField::Summary => "summary",
            ResumeField::RawText => "raw_text",
        }
    }

    /// Parses the snake_case wire name. Returns `None` for anything outside
    /// the closed set.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "name" => Some(ResumeField::Name),
            "email" => Some(ResumeField::Email),
            "phone" => Some(ResumeField::Phone),
            "skills" => Some(ResumeField::Skills),
            "education" => Some(ResumeField::Education),
            "experience" => Some(ResumeField::Experience),
            "summary" => Some(ResumeField::Summary),
            "raw_text" => Some(ResumeField::RawText),
            _ => None,
        }
    }
}

impl fmt::Display for ResumeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field → value mapping produced by extractors and consumed by the merger.
pub type FieldMap = BTreeMap<ResumeField, Value>;

/// Ordered, duplicate-free list of fields the caller needs resolved.
/// Order carries no priority; it only fixes the order of the `missing` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequiredFields(Vec<ResumeField>);

impl RequiredFields {
    /// Builds the set, dropping duplicates while keeping first-occurrence
    /// order.
    pub fn new(fields: impl IntoIterator<Item = ResumeField>) -> Self {
        let mut seen = Vec::new();
        for field in fields {
            if !seen.contains(&field) {
                seen.push(field);
            }
        }
        RequiredFields(seen)
    }

    pub fn iter(&self) -> impl Iterator<Item = ResumeField> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[ResumeField] {
        &self.0
    }
}

/// A value counts as provided only when it carries actual content.
/// Null, blank strings, and empty collections mean "not provided" — never an
/// explicit empty answer.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(_) => true,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Final reconciled output of one intake run: resolved fields plus the
/// residual fields the caller still has to collect from the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedResult {
    pub fields: FieldMap,
    pub missing: Vec<ResumeField>,
}
