//! # Detection Types
//!
//! Types crossing the detector boundary, plus the per-event history record.
//!
//! ## Who Produces What
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  External AI detector ──► DetectionEvent { value, confidence, text} │
//! │                                 │                                   │
//! │                                 ▼                                   │
//! │  CalculationSession::admit ──► validates value against the fixed    │
//! │                                 denomination set                    │
//! │                                 │                                   │
//! │                                 ▼                                   │
//! │  ScanRecord ──► one durable history row per recorded event          │
//! │                                                                     │
//! │  The aggregate NEVER constructs a DetectionEvent itself.            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::denomination::Denomination;
use crate::error::{CoreError, CoreResult};

// =============================================================================
// Detection Event
// =============================================================================

/// The result of one detector invocation.
///
/// `value` is kept as a raw integer on purpose: the external detector may
/// return `0` for "not recognized" or, on a misbehaving integration, a
/// value outside the banknote set. [`DetectionEvent::denomination`] is the
/// single place where that raw value is checked against the fixed set.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DetectionEvent {
    /// Detected face value in rupiah; 0 means the detector failed.
    pub value: i64,

    /// Detector confidence in percent (0-100).
    pub confidence: f64,

    /// Spoken-form text reported by the detector, e.g. "lima puluh ribu rupiah".
    pub recognized_text: String,
}

impl DetectionEvent {
    /// Creates an event from detector output.
    pub fn new(value: i64, confidence: f64, recognized_text: impl Into<String>) -> Self {
        DetectionEvent {
            value,
            confidence: confidence.clamp(0.0, 100.0),
            recognized_text: recognized_text.into(),
        }
    }

    /// True when the detector reported the "not recognized" marker.
    #[inline]
    pub fn is_failure(&self) -> bool {
        self.value == 0
    }

    /// Validates the raw value against the fixed denomination set.
    pub fn denomination(&self) -> CoreResult<Denomination> {
        Denomination::from_value(self.value)
            .ok_or(CoreError::InvalidDenomination { value: self.value })
    }
}

// =============================================================================
// Operation Kind
// =============================================================================

/// Which flow produced a scan record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// A one-off scan outside any session.
    SingleScan,
    /// A scan admitted into a counting session.
    SessionCount,
}

impl Default for OperationKind {
    fn default() -> Self {
        OperationKind::SingleScan
    }
}

// =============================================================================
// Scan Record
// =============================================================================

/// A durable per-event history record.
///
/// Written alongside every recorded detection - independently of the
/// session aggregate - so the "scan history" view can list individual
/// events even after sessions are long finished.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// User the scan belongs to.
    pub owner_id: String,

    /// Face value of the detected banknote.
    pub value: i64,

    /// Detector confidence in percent, if reported.
    pub confidence: Option<f64>,

    /// Session this scan was admitted into, for session-count scans.
    pub session_id: Option<String>,

    /// Which flow produced this record.
    pub operation: OperationKind,

    /// When the scan was recorded.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl ScanRecord {
    /// Returns the denomination, if the stored value is still in the set.
    pub fn denomination(&self) -> Option<Denomination> {
        Denomination::from_value(self.value)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
