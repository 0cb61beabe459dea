//! Axum route handlers for the Resume Intake API.

use axum::extract::{Multipart, State};
use axum::Json;
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::intake::fields::{FieldMap, RequiredFields, ResumeField};
use crate::intake::validation::Document;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub upload_id: Uuid,
    pub fields: FieldMap,
    pub missing: Vec<ResumeField>,
}

/// POST /api/v1/resumes/upload
///
/// Multipart body: a `resume` file part, an optional `required_fields` part
/// (JSON array of field names, defaulting to the configured set), and any
/// other text part treated as a static field value. Returns the merged
/// fields plus the fields the frontend still has to prompt for.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let upload_id = Uuid::new_v4();
    let mut resume: Option<(String, Bytes)> = None;
    let mut required: Option<RequiredFields> = None;
    let mut static_fields = FieldMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))?
    {
        let part_name = field.name().unwrap_or_default().to_string();
        match part_name.as_str() {
            "resume" => {
                let filename = field
                    .file_name()
                    .ok_or_else(|| {
                        AppError::Validation("resume part is missing a filename".to_string())
                    })?
                    .to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("failed to read resume part: {e}"))
                })?;
                if bytes.len() > state.config.max_upload_bytes {
                    return Err(AppError::Validation(format!(
                        "resume exceeds the {} byte upload limit",
                        state.config.max_upload_bytes
                    )));
                }
                resume = Some((filename, bytes));
            }
            "required_fields" => {
                let raw = field.text().await.map_err(|e| {
                    AppError::Validation(format!("failed to read required_fields part: {e}"))
                })?;
                let names: Vec<ResumeField> = serde_json::from_str(&raw).map_err(|e| {
                    AppError::Validation(format!("required_fields must be a JSON array: {e}"))
                })?;
                required = Some(RequiredFields::new(names));
            }
            other => {
                let field_name = ResumeField::parse(other).ok_or_else(|| {
                    AppError::Validation(format!("unknown form field '{other}'"))
                })?;
                let value = field.text().await.map_err(|e| {
                    AppError::Validation(format!("failed to read form field '{other}': {e}"))
                })?;
                static_fields.insert(field_name, Value::String(value));
            }
        }
    }

    let (filename, bytes) = resume
        .ok_or_else(|| AppError::Validation("missing 'resume' file part".to_string()))?;
    let required = required.unwrap_or_else(|| state.config.default_required_fields.clone());

    info!(
        %upload_id,
        filename = %filename,
        size = bytes.len(),
        static_fields = static_fields.len(),
        "received resume upload"
    );

    // Spool to a temp file; it is removed on drop once resolution returns.
    let temp = spool_upload(&filename, &bytes).await?;
    let document = Document::validate(temp.path(), &filename)?;
    let result = state
        .pipeline
        .resolve(&document, &required, &static_fields)
        .await?;

    info!(
        %upload_id,
        resolved = result.fields.len(),
        missing = result.missing.len(),
        "resume upload resolved"
    );

    Ok(Json(UploadResponse {
        upload_id,
        fields: result.fields,
        missing: result.missing,
    }))
}

/// Writes the upload to a named temp file, preserving the extension so the
/// path stays recognizable in logs and debuggers.
async fn spool_upload(filename: &str, bytes: &Bytes) -> Result<tempfile::NamedTempFile, AppError> {
    let suffix = std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();

    let temp = tempfile::Builder::new()
        .prefix("resume-upload-")
        .suffix(&suffix)
        .tempfile()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to create temp file: {e}")))?;

    tokio::fs::write(temp.path(), bytes)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to write temp file: {e}")))?;

    Ok(temp)
}
