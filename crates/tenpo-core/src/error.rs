//! # Error Types
//!
//! Domain-specific error types for tenpo-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tenpo-core errors (this file)                                         │
//! │  ├── CoreError        - Batch / period-key failures                    │
//! │  └── ValidationError  - A raw record failed normalization              │
//! │                                                                         │
//! │  tenpo-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ReportError → data-entry UI       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## What Is NOT an Error
//! - An empty period: the KPI calculator returns an all-zero snapshot
//! - A missing target: the resolver returns `None`
//! - Division by zero: every ratio resolves to `0.0`

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core engine errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A record inside a batch failed validation.
    ///
    /// ## When This Occurs
    /// - `normalize_all` hits a malformed payload; `index` is its position
    ///   in the input so the caller can point the user at the right row
    #[error("Record #{index} rejected: {source}")]
    RecordRejected {
        index: usize,
        #[source]
        source: ValidationError,
    },

    /// A period key could not be parsed.
    #[error("Invalid period key '{key}': expected {expected}")]
    InvalidPeriodKey { key: String, expected: &'static str },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors raised by the record normalizer.
///
/// Every variant names the offending field so the data-entry UI can
/// highlight it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Amount or count is below zero.
    ///
    /// Negative values are rejected, never clamped.
    #[error("{field} must not be negative (got {value})")]
    Negative { field: String, value: i64 },

    /// Value exceeds the accepted maximum.
    #[error("{field} must not exceed {max} (got {value})")]
    TooLarge { field: String, value: i64, max: i64 },

    /// Invalid format (e.g., invalid date, invalid month key).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?} (got '{value}')")]
    NotAllowed {
        field: String,
        value: String,
        allowed: Vec<String>,
    },
}

impl ValidationError {
    /// Returns the name of the field that failed validation.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::Negative { field, .. }
            | ValidationError::TooLarge { field, .. }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Negative {
            field: "purchase".to_string(),
            value: -500,
        };
        assert_eq!(err.to_string(), "purchase must not be negative (got -500)");
        assert_eq!(err.field(), "purchase");

        let err = ValidationError::Required {
            field: "store_id".to_string(),
        };
        assert_eq!(err.to_string(), "store_id is required");

        let err = ValidationError::TooLarge {
            field: "sales".to_string(),
            value: 20,
            max: 10,
        };
        assert_eq!(err.to_string(), "sales must not exceed 10 (got 20)");
        assert_eq!(err.field(), "sales");
    }

    #[test]
    fn test_record_rejected_message_includes_index() {
        let err = CoreError::RecordRejected {
            index: 3,
            source: ValidationError::Required {
                field: "date".to_string(),
            },
        };
        assert_eq!(err.to_string(), "Record #3 rejected: date is required");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
