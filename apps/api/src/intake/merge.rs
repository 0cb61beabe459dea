//! Field-priority merge: extracted values win over static form values, and
//! everything still unresolved becomes the `missing` residual.
//!
//! Pure function. Per required field the outcome is exactly one of: resolved
//! from extraction, resolved from static input, or missing. Fields outside
//! the required set are dropped from the result no matter which source
//! supplied them.

use crate::intake::fields::{is_truthy, FieldMap, MergedResult, RequiredFields};

/// Reconciles extracted and static field values against the required set.
///
/// Priority per field: truthy extracted value, else truthy static value,
/// else the field is appended to `missing` in required-field order. The
/// output upholds `fields.keys() ∪ missing == required` with the two sides
/// disjoint.
pub fn merge(
    extracted: &FieldMap,
    static_fields: &FieldMap,
    required: &RequiredFields,
) -> MergedResult {
    let mut result = MergedResult::default();
    for field in required.iter() {
        if let Some(value) = extracted.get(&field).filter(|v| is_truthy(v)) {
            result.fields.insert(field, value.clone());
        } else if let Some(value) = static_fields.get(&field).filter(|v| is_truthy(v)) {
            result.fields.insert(field, value.clone());
        } else {
            result.missing.push(field);
        }
    }
    result
}
