//! # Validation Module
//!
//! Input validation utilities for Scan Tunai.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                              │
//! │                                                                     │
//! │  Layer 1: Frontend                                                  │
//! │  └── basic format checks, immediate user feedback                   │
//! │           │                                                         │
//! │           ▼                                                         │
//! │  Layer 2: Service (Rust)                                            │
//! │  └── THIS MODULE: ids, note length, paging bounds                   │
//! │           │                                                         │
//! │           ▼                                                         │
//! │  Layer 3: Aggregate + Database                                      │
//! │  └── denomination set membership, NOT NULL/UNIQUE constraints       │
//! │                                                                     │
//! │  Defense in depth: multiple layers catch different errors           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::{MAX_HISTORY_PAGE_SIZE, MAX_NOTE_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates an entity id (session, owner, scan) as a UUID string.
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates and normalizes a session note.
///
/// ## Rules
/// - Optional; whitespace-only collapses to `None`
/// - Maximum 500 characters
///
/// ## Returns
/// The trimmed note, or `None` when absent/empty.
pub fn validate_note(note: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(raw) = note else {
        return Ok(None);
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    if trimmed.chars().count() > MAX_NOTE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "note".to_string(),
            max: MAX_NOTE_LENGTH,
        });
    }

    Ok(Some(trimmed.to_string()))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a detector confidence percentage.
pub fn validate_confidence(confidence: f64) -> ValidationResult<()> {
    if !(0.0..=100.0).contains(&confidence) {
        return Err(ValidationError::OutOfRange {
            field: "confidence".to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(())
}

/// Validates a 1-based history page number.
pub fn validate_page(page: i64) -> ValidationResult<()> {
    if page < 1 {
        return Err(ValidationError::OutOfRange {
            field: "page".to_string(),
            min: 1,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a history page size.
pub fn validate_limit(limit: i64) -> ValidationResult<()> {
    if limit < 1 || limit > MAX_HISTORY_PAGE_SIZE {
        return Err(ValidationError::OutOfRange {
            field: "limit".to_string(),
            min: 1,
            max: MAX_HISTORY_PAGE_SIZE,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
