//! # Service Error Type
//!
//! Unified error type for service operations.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                  Error Flow in Scan Tunai                           │
//! │                                                                     │
//! │  Caller (HTTP layer / tests)                                        │
//! │         │                                                           │
//! │         ▼                                                           │
//! │  ┌───────────────────────────────────────────────────────────────┐  │
//! │  │  ScanService operation                                        │  │
//! │  │  Result<T, ServiceError>                                      │  │
//! │  │         │                                                     │  │
//! │  │         ├── DbError::NotFound ───────────► NOT_FOUND          │  │
//! │  │         ├── CoreError::SessionClosed ────► SESSION_CLOSED     │  │
//! │  │         ├── QuotaDecision::Denied ───────► QUOTA_EXCEEDED     │  │
//! │  │         ├── DetectionFailure ────────────► DETECTION_FAILED   │  │
//! │  │         └── anything else ───────────────► DATABASE/INTERNAL  │  │
//! │  └───────────────────────────────────────────────────────────────┘  │
//! │                                                                     │
//! │  Serialized as { "code": "...", "message": "..." } - the message    │
//! │  is user-facing copy, spoken aloud by the frontend where relevant.  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::error;
use tunai_core::{CoreError, ValidationError};
use tunai_db::DbError;

/// Service error returned from every `ScanService` operation.
///
/// ## Serialization
/// ```json
/// {
///   "code": "SESSION_CLOSED",
///   "message": "Sesi perhitungan sudah selesai."
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable message for display / speech
    pub message: String,
}

/// Error codes for service responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found or not owned by the caller (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Admit/finalize attempted on a completed session (409)
    SessionClosed,

    /// Daily scan allowance exhausted or subscription inactive (429)
    QuotaExceeded,

    /// The detector could not recognize a banknote (400)
    DetectionFailed,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal error (500)
    Internal,
}

impl ServiceError {
    /// Creates a new service error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ServiceError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::new(ErrorCode::NotFound, message)
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::new(ErrorCode::ValidationError, message)
    }

    /// Creates a quota exceeded error.
    pub fn quota_exceeded(message: impl Into<String>) -> Self {
        ServiceError::new(ErrorCode::QuotaExceeded, message)
    }

    /// Creates a detection failed error.
    pub fn detection_failed(message: impl Into<String>) -> Self {
        ServiceError::new(ErrorCode::DetectionFailed, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ServiceError::new(ErrorCode::Internal, message)
    }
}

/// Converts aggregate errors to service errors.
impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::SessionClosed { .. } => ServiceError::new(
                ErrorCode::SessionClosed,
                "Sesi perhitungan sudah selesai.",
            ),
            CoreError::InvalidDenomination { value } => ServiceError::validation(format!(
                "Nilai {} bukan pecahan uang yang valid.",
                value
            )),
            CoreError::Validation(e) => ServiceError::validation(e.to_string()),
        }
    }
}

/// Converts input-validation errors to service errors.
impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::validation(err.to_string())
    }
}

/// Converts database errors to service errors.
impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => {
                ServiceError::not_found(format!("{} not found: {}", entity, id))
            }
            DbError::Domain(core) => core.into(),
            DbError::WriteConflict { entity, id } => {
                error!(%entity, %id, "Concurrent update conflict");
                ServiceError::new(ErrorCode::DatabaseError, "Concurrent update conflict")
            }
            DbError::UniqueViolation { field, value } => ServiceError::validation(format!(
                "{} '{}' already exists",
                field, value
            )),
            DbError::ForeignKeyViolation { message } => {
                error!("Foreign key violation: {}", message);
                ServiceError::validation("Invalid reference")
            }
            DbError::ConnectionFailed(_) => {
                ServiceError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ServiceError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                error!("Database query failed: {}", e);
                ServiceError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::PoolExhausted => {
                ServiceError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                error!("Internal database error: {}", e);
                ServiceError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ServiceError {}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_closed_maps_to_its_own_code() {
        let err: ServiceError = CoreError::SessionClosed {
            session_id: "abc".to_string(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::SessionClosed);
    }

    #[test]
    fn test_domain_error_unwraps_through_db_error() {
        let err: ServiceError = DbError::Domain(CoreError::InvalidDenomination { value: 0 }).into();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_serialization_shape() {
        let err = ServiceError::not_found("Sesi perhitungan tidak ditemukan.");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Sesi perhitungan tidak ditemukan.");
    }
}
