//! # Error Types
//!
//! Domain-specific error types for tunai-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                 │
//! │                                                                     │
//! │  tunai-core errors (this file)                                      │
//! │  ├── CoreError        - Aggregate/domain rule violations            │
//! │  └── ValidationError  - Input validation failures                   │
//! │                                                                     │
//! │  tunai-db errors (separate crate)                                   │
//! │  └── DbError          - Storage failures, wraps CoreError           │
//! │                                                                     │
//! │  tunai-service errors (separate crate)                              │
//! │  └── ServiceError     - What callers see (code + message)           │
//! │                                                                     │
//! │  Flow: ValidationError → CoreError → DbError → ServiceError         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (session id, rejected value)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message upstream

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Aggregate rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Admit or finalize attempted on a completed session.
    ///
    /// ## When This Occurs
    /// - A scan arrives after the user finished counting
    /// - A finalize request is replayed for an already-frozen session
    ///
    /// Never retried automatically; the caller surfaces it to the user.
    #[error("Session {session_id} is already completed")]
    SessionClosed { session_id: String },

    /// A detection value outside the fixed banknote set reached the
    /// aggregate - including the value-0 "not recognized" marker.
    ///
    /// Callers are expected to filter failed detections before admitting,
    /// so hitting this indicates a broken integration upstream. The
    /// aggregate rejects instead of coercing.
    #[error("{value} is not a valid banknote denomination")]
    InvalidDenomination { value: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet requirements.
/// Used for early validation before domain logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
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
    fn test_error_messages() {
        let err = CoreError::SessionClosed {
            session_id: "abc-123".to_string(),
        };
        assert_eq!(err.to_string(), "Session abc-123 is already completed");

        let err = CoreError::InvalidDenomination { value: 0 };
        assert_eq!(err.to_string(), "0 is not a valid banknote denomination");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "note".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
