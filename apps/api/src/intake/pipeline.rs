//! Intake pipeline: primary extraction, conditional text fallback, static
//! merge, missing-field residual.
//!
//! Failure policy: primary errors, timeouts, and empty results are soft —
//! the run continues with whatever the other sources supply. The only
//! terminal outcomes are `InvalidFormat` (upstream, at the gate) and
//! `Parsing` when every source together resolved nothing.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::errors::AppError;
use crate::intake::extractor::FieldExtractor;
use crate::intake::fields::{is_truthy, FieldMap, MergedResult, RequiredFields, ResumeField};
use crate::intake::merge::merge;
use crate::intake::validation::Document;

/// Sequences the extraction stages for one validated document.
/// Stateless and reentrant; concurrent resolutions share nothing but the
/// extractor backends, which are `Send + Sync`.
pub struct Pipeline {
    primary: Arc<dyn FieldExtractor>,
    fallback: Arc<dyn FieldExtractor>,
    extractor_timeout: Duration,
}

impl Pipeline {
    pub fn new(
        primary: Arc<dyn FieldExtractor>,
        fallback: Arc<dyn FieldExtractor>,
        extractor_timeout: Duration,
    ) -> Self {
        Pipeline {
            primary,
            fallback,
            extractor_timeout,
        }
    }

    /// Resolves the required fields from the document plus the caller's
    /// static form values.
    ///
    /// Returns a partial result whenever at least one field resolved; fails
    /// with [`AppError::Parsing`] only when extraction and static input
    /// jointly produced nothing.
    pub async fn resolve(
        &self,
        document: &Document,
        required: &RequiredFields,
        static_fields: &FieldMap,
    ) -> Result<MergedResult, AppError> {
        let mut extracted = match self.run_extractor(self.primary.as_ref(), document).await {
            Ok(fields) => fields,
            Err(e) => {
                // Primary is never fatal: fallback and static input are the
                // redundancy for exactly this case.
                warn!(filename = document.filename(), "primary extractor failed: {e}");
                FieldMap::new()
            }
        };

        let essentials_missing: Vec<ResumeField> = required
            .iter()
            .filter(|field| !extracted.get(field).is_some_and(is_truthy))
            .collect();

        if !essentials_missing.is_empty() && document.kind().supports_text_fallback() {
            match self.run_extractor(self.fallback.as_ref(), document).await {
                Ok(fallback_fields) => {
                    for field in &essentials_missing {
                        let Some(value) = fallback_fields.get(field).filter(|v| is_truthy(v))
                        else {
                            continue;
                        };
                        // Fallback only fills gaps; a truthy primary value is
                        // never overwritten. A falsy primary value (empty
                        // string, empty list) counts as not provided and is
                        // replaced.
                        if !extracted.get(field).is_some_and(is_truthy) {
                            extracted.insert(*field, value.clone());
                        }
                    }
                    debug!(
                        filename = document.filename(),
                        "fallback fields merged into extraction result"
                    );
                }
                // Recoverable unless nothing else resolves either, in which
                // case the terminal check below escalates.
                Err(e) => warn!(filename = document.filename(), "text fallback failed: {e}"),
            }
        }

        let result = merge(&extracted, static_fields, required);

        if !required.is_empty() && result.fields.is_empty() {
            error!(
                filename = document.filename(),
                "no required fields could be resolved from any source"
            );
            return Err(AppError::Parsing(format!(
                "no required fields could be resolved from '{}'",
                document.filename()
            )));
        }

        debug!(
            filename = document.filename(),
            resolved = result.fields.len(),
            missing = result.missing.len(),
            "intake pipeline finished"
        );
        Ok(result)
    }

    /// Bounded extractor invocation. A timeout is reported as an extraction
    /// error so callers apply the same recovery policy as for any other
    /// extractor failure.
    async fn run_extractor(
        &self,
        extractor: &dyn FieldExtractor,
        document: &Document,
    ) -> Result<FieldMap, AppError> {
        match tokio::time::timeout(self.extractor_timeout, extractor.extract(document)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Extraction(format!(
                "extractor timed out after {:?}",
                self.extractor_timeout
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::fields::ResumeField;
    use crate::intake::validation::DocumentKind;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Canned extractor: counts invocations, returns a fixed map or error.
    struct MockExtractor {
        result: Result<Vec<(ResumeField, Value)>, String>,
        calls: AtomicUsize,
    }

    impl MockExtractor {
        fn returning(entries: &[(ResumeField, Value)]) -> Arc<Self> {
            Arc::new(MockExtractor {
                result: Ok(entries.to_vec()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(MockExtractor {
                result: Err(message.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FieldExtractor for MockExtractor {
        async fn extract(&self, _document: &Document) -> Result<FieldMap, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Ok(entries) => Ok(entries.iter().cloned().collect()),
                Err(message) => Err(AppError::Extraction(message.clone())),
            }
        }
    }

    fn pipeline(primary: Arc<MockExtractor>, fallback: Arc<MockExtractor>) -> Pipeline {
        Pipeline::new(primary, fallback, Duration::from_secs(5))
    }

    fn required(fields: &[ResumeField]) -> RequiredFields {
        RequiredFields::new(fields.iter().copied())
    }

    fn static_map(entries: &[(ResumeField, Value)]) -> FieldMap {
        entries.iter().cloned().collect()
    }

    #[tokio::test]
    async fn test_static_fills_gaps_when_fallback_detects_nothing() {
        // Primary empty, fallback sees text without contact details, static
        // covers name and email; skills stays missing.
        let primary = MockExtractor::returning(&[]);
        let fallback =
            MockExtractor::returning(&[(ResumeField::RawText, json!("plain resume text"))]);
        let doc = Document::unvalidated_for_tests(DocumentKind::Pdf);
        let statics = static_map(&[
            (ResumeField::Name, json!("A. Smith")),
            (ResumeField::Email, json!("a@x.com")),
        ]);

        let result = pipeline(primary, fallback.clone())
            .resolve(
                &doc,
                &required(&[ResumeField::Name, ResumeField::Email, ResumeField::Skills]),
                &statics,
            )
            .await
            .unwrap();

        assert_eq!(result.fields.get(&ResumeField::Name), Some(&json!("A. Smith")));
        assert_eq!(result.fields.get(&ResumeField::Email), Some(&json!("a@x.com")));
        assert_eq!(result.missing, vec![ResumeField::Skills]);
        assert_eq!(fallback.call_count(), 1);
    }

    #[tokio::test]
    async fn test_fallback_supplies_contact_fields() {
        let primary = MockExtractor::returning(&[]);
        let fallback = MockExtractor::returning(&[
            (ResumeField::Email, json!("j.doe@example.com")),
            (ResumeField::Phone, json!("555-123-4567")),
            (ResumeField::RawText, json!("contact me at j.doe@example.com")),
        ]);
        let doc = Document::unvalidated_for_tests(DocumentKind::Pdf);

        let result = pipeline(primary, fallback)
            .resolve(
                &doc,
                &required(&[ResumeField::Email, ResumeField::Phone]),
                &FieldMap::new(),
            )
            .await
            .unwrap();

        assert_eq!(
            result.fields.get(&ResumeField::Email),
            Some(&json!("j.doe@example.com"))
        );
        assert_eq!(
            result.fields.get(&ResumeField::Phone),
            Some(&json!("555-123-4567"))
        );
        assert!(result.missing.is_empty());
    }

    #[tokio::test]
    async fn test_nothing_resolved_is_a_parsing_failure() {
        // Non-fallback-eligible format, failing primary, empty static map.
        let primary = MockExtractor::failing("backend unavailable");
        let fallback = MockExtractor::returning(&[]);
        let doc = Document::unvalidated_for_tests(DocumentKind::Docx);

        let err = pipeline(primary, fallback.clone())
            .resolve(&doc, &required(&[ResumeField::Name]), &FieldMap::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Parsing(_)));
        assert_eq!(fallback.call_count(), 0);
    }

    #[tokio::test]
    async fn test_fallback_skipped_when_primary_fully_resolves() {
        let primary = MockExtractor::returning(&[
            (ResumeField::Name, json!("A. Smith")),
            (ResumeField::Email, json!("a@x.com")),
        ]);
        let fallback = MockExtractor::returning(&[(ResumeField::Email, json!("other@x.com"))]);
        let doc = Document::unvalidated_for_tests(DocumentKind::Pdf);

        let result = pipeline(primary, fallback.clone())
            .resolve(
                &doc,
                &required(&[ResumeField::Name, ResumeField::Email]),
                &FieldMap::new(),
            )
            .await
            .unwrap();

        assert!(result.missing.is_empty());
        assert_eq!(fallback.call_count(), 0);
    }

    #[tokio::test]
    async fn test_fallback_skipped_for_non_text_bearing_format() {
        let primary = MockExtractor::returning(&[(ResumeField::Name, json!("A. Smith"))]);
        let fallback = MockExtractor::returning(&[(ResumeField::Email, json!("a@x.com"))]);
        let doc = Document::unvalidated_for_tests(DocumentKind::Docx);

        let result = pipeline(primary, fallback.clone())
            .resolve(
                &doc,
                &required(&[ResumeField::Name, ResumeField::Email]),
                &FieldMap::new(),
            )
            .await
            .unwrap();

        assert_eq!(result.missing, vec![ResumeField::Email]);
        assert_eq!(fallback.call_count(), 0);
    }

    #[tokio::test]
    async fn test_fallback_never_overwrites_primary_value() {
        // Email comes from primary; phone is the gap fallback fills.
        let primary = MockExtractor::returning(&[(ResumeField::Email, json!("primary@x.com"))]);
        let fallback = MockExtractor::returning(&[
            (ResumeField::Email, json!("fallback@x.com")),
            (ResumeField::Phone, json!("555-123-4567")),
        ]);
        let doc = Document::unvalidated_for_tests(DocumentKind::Pdf);

        let result = pipeline(primary, fallback)
            .resolve(
                &doc,
                &required(&[ResumeField::Email, ResumeField::Phone]),
                &FieldMap::new(),
            )
            .await
            .unwrap();

        assert_eq!(
            result.fields.get(&ResumeField::Email),
            Some(&json!("primary@x.com"))
        );
        assert_eq!(
            result.fields.get(&ResumeField::Phone),
            Some(&json!("555-123-4567"))
        );
    }

    #[tokio::test]
    async fn test_falsy_primary_value_filled_by_fallback() {
        // An empty string from primary means "not provided"; the fallback
        // detection must fill it rather than being blocked by the stale
        // entry.
        let primary = MockExtractor::returning(&[(ResumeField::Email, json!(""))]);
        let fallback = MockExtractor::returning(&[(ResumeField::Email, json!("a@x.com"))]);
        let doc = Document::unvalidated_for_tests(DocumentKind::Pdf);

        let result = pipeline(primary, fallback)
            .resolve(&doc, &required(&[ResumeField::Email]), &FieldMap::new())
            .await
            .unwrap();

        assert_eq!(result.fields.get(&ResumeField::Email), Some(&json!("a@x.com")));
        assert!(result.missing.is_empty());
    }

    #[tokio::test]
    async fn test_primary_failure_recovered_by_fallback() {
        let primary = MockExtractor::failing("backend unavailable");
        let fallback = MockExtractor::returning(&[(ResumeField::Email, json!("a@x.com"))]);
        let doc = Document::unvalidated_for_tests(DocumentKind::Pdf);

        let result = pipeline(primary, fallback)
            .resolve(&doc, &required(&[ResumeField::Email]), &FieldMap::new())
            .await
            .unwrap();

        assert_eq!(result.fields.get(&ResumeField::Email), Some(&json!("a@x.com")));
    }

    #[tokio::test]
    async fn test_fallback_failure_recovered_when_static_resolves() {
        let primary = MockExtractor::returning(&[]);
        let fallback = MockExtractor::failing("corrupt pdf");
        let doc = Document::unvalidated_for_tests(DocumentKind::Pdf);
        let statics = static_map(&[(ResumeField::Name, json!("A. Smith"))]);

        let result = pipeline(primary, fallback)
            .resolve(&doc, &required(&[ResumeField::Name]), &statics)
            .await
            .unwrap();

        assert_eq!(result.fields.get(&ResumeField::Name), Some(&json!("A. Smith")));
    }

    #[tokio::test]
    async fn test_fallback_failure_escalates_when_sole_source() {
        let primary = MockExtractor::returning(&[]);
        let fallback = MockExtractor::failing("corrupt pdf");
        let doc = Document::unvalidated_for_tests(DocumentKind::Pdf);

        let err = pipeline(primary, fallback)
            .resolve(&doc, &required(&[ResumeField::Email]), &FieldMap::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Parsing(_)));
    }

    #[tokio::test]
    async fn test_slow_extractor_is_a_soft_failure() {
        struct SlowExtractor;

        #[async_trait]
        impl FieldExtractor for SlowExtractor {
            async fn extract(&self, _document: &Document) -> Result<FieldMap, AppError> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(FieldMap::new())
            }
        }

        let fallback = MockExtractor::returning(&[(ResumeField::Email, json!("a@x.com"))]);
        let pipeline = Pipeline::new(
            Arc::new(SlowExtractor),
            fallback,
            Duration::from_millis(20),
        );
        let doc = Document::unvalidated_for_tests(DocumentKind::Pdf);

        let result = pipeline
            .resolve(&doc, &required(&[ResumeField::Email]), &FieldMap::new())
            .await
            .unwrap();

        assert_eq!(result.fields.get(&ResumeField::Email), Some(&json!("a@x.com")));
    }
}
