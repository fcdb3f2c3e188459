//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! parsing and normalization so the engine enforces consistent invariants.

use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Parse a UUID from storage or caller input, returning a labeled error.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::Validation(format!("invalid {label} id")))
}

/// Normalized lookup key for a category name: NFKC, lowercase, single
/// spaces.
pub(crate) fn normalize_category_key(name: &str) -> String {
    name.nfkc()
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reject empty or whitespace-only names; trims the survivors.
pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

/// Trim optional free text, mapping whitespace-only input to `None`.
pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_key_folds_case_and_whitespace() {
        assert_eq!(normalize_category_key("  Groceries  "), "groceries");
        assert_eq!(normalize_category_key("Eating   Out"), "eating out");
    }

    #[test]
    fn required_name_rejects_blank() {
        assert!(normalize_required_name("   ", "bill").is_err());
        assert_eq!(normalize_required_name(" Rent ", "bill").unwrap(), "Rent");
    }
}
