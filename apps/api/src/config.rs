use anyhow::{bail, Context, Result};

use crate::intake::fields::{RequiredFields, ResumeField};

/// Application configuration loaded from environment variables.
/// Every variable has a default, so the service starts with no env at all.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Hard cap on the resume file part, in bytes.
    pub max_upload_bytes: usize,
    /// Bound on each extractor invocation; a timeout is treated like any
    /// other extractor failure.
    pub extractor_timeout_secs: u64,
    /// Fields resolved when the caller sends no `required_fields` part.
    pub default_required_fields: RequiredFields,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            max_upload_bytes: std::env::var("MAX_UPLOAD_BYTES")
                .unwrap_or_else(|_| (10 * 1024 * 1024).to_string())
                .parse::<usize>()
                .context("MAX_UPLOAD_BYTES must be a byte count")?,
            extractor_timeout_secs: std::env::var("EXTRACTOR_TIMEOUT_SECS")
                .unwrap_or_else(|_| "20".to_string())
                .parse::<u64>()
                .context("EXTRACTOR_TIMEOUT_SECS must be a number of seconds")?,
            default_required_fields: parse_field_list(
                &std::env::var("REQUIRED_FIELDS")
                    .unwrap_or_else(|_| "name,email,phone,skills".to_string()),
            )?,
        })
    }
}

/// Parses the comma-separated REQUIRED_FIELDS list against the closed field
/// set, rejecting unknown names at startup rather than at request time.
fn parse_field_list(raw: &str) -> Result<RequiredFields> {
    let mut fields = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match ResumeField::parse(name) {
            Some(field) => fields.push(field),
            None => bail!("REQUIRED_FIELDS contains unknown field '{name}'"),
        }
    }
    if fields.is_empty() {
        bail!("REQUIRED_FIELDS must name at least one field");
    }
    Ok(RequiredFields::new(fields))
}
