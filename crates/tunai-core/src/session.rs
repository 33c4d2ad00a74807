//! # Calculation Session
//!
//! The session aggregate: accumulates scanned banknotes into a running
//! total with a per-denomination breakdown.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     Session State Machine                           │
//! │                                                                     │
//! │   [Open] ──admit──► [Open]          (self-loop, unbounded)          │
//! │   [Open] ──finalize──► [Completed]  (terminal, one-way)             │
//! │                                                                     │
//! │   Completed sessions accept nothing: admit and finalize both        │
//! │   fail with SessionClosed. Totals are frozen forever.               │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants (hold after every operation)
//! - `total == sum(value × count over tallies)`
//! - `banknote_count == sum(count over tallies)`
//! - tallies strictly descending by face value, at most one per value

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::denomination::Denomination;
use crate::detection::DetectionEvent;
use crate::error::{CoreError, CoreResult};
use crate::money::Rupiah;

// =============================================================================
// Denomination Tally
// =============================================================================

/// Aggregated count of admitted banknotes sharing one denomination.
///
/// Derived state: always reconstructible from the admitted events. This is
/// also the breakdown's persisted JSON shape: `{"value": 50000, "count": 2}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DenominationTally {
    /// The shared face value.
    #[ts(type = "number")]
    pub value: Denomination,

    /// How many notes of this value were admitted; never zero.
    pub count: u32,
}

impl DenominationTally {
    /// The combined worth of this tally (`value × count`).
    pub fn subtotal(&self) -> Rupiah {
        self.value.rupiah() * i64::from(self.count)
    }
}

// =============================================================================
// Calculation Session
// =============================================================================

/// The aggregate tracking one user's note-counting activity.
///
/// Fields are private: every mutation goes through [`admit`](Self::admit)
/// and [`finalize`](Self::finalize) so the invariants above cannot be
/// bypassed. Storage rehydrates via [`from_parts`](Self::from_parts).
#[derive(Debug, Clone)]
pub struct CalculationSession {
    id: String,
    owner_id: String,
    total: Rupiah,
    banknote_count: u32,
    /// Sorted descending by face value; at most one entry per value.
    tallies: Vec<DenominationTally>,
    completed: bool,
    note: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl CalculationSession {
    /// Creates a new open session with zeroed totals.
    pub fn new(owner_id: impl Into<String>) -> Self {
        CalculationSession {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            total: Rupiah::zero(),
            banknote_count: 0,
            tallies: Vec::new(),
            completed: false,
            note: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Rehydrates a session from stored state.
    ///
    /// Tallies are re-sorted on the way in so the descending-by-value
    /// invariant holds regardless of how storage ordered them.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: impl Into<String>,
        owner_id: impl Into<String>,
        total: Rupiah,
        banknote_count: u32,
        mut tallies: Vec<DenominationTally>,
        completed: bool,
        note: Option<String>,
        created_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Self {
        tallies.sort_by(|a, b| b.value.cmp(&a.value));
        CalculationSession {
            id: id.into(),
            owner_id: owner_id.into(),
            total,
            banknote_count,
            tallies,
            completed,
            note,
            created_at,
            completed_at,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn total(&self) -> Rupiah {
        self.total
    }

    pub fn banknote_count(&self) -> u32 {
        self.banknote_count
    }

    /// The breakdown, sorted descending by face value.
    pub fn tallies(&self) -> &[DenominationTally] {
        &self.tallies
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    // -------------------------------------------------------------------------
    // Operations
    // -------------------------------------------------------------------------

    /// Admits one detected banknote into the running totals.
    ///
    /// All-or-nothing: the event is validated before any field changes, so
    /// a rejected event leaves the session untouched.
    ///
    /// ## Errors
    /// - `SessionClosed` when the session was already finalized
    /// - `InvalidDenomination` when the event carries a value outside the
    ///   fixed set (including the detector's value-0 failure marker) -
    ///   callers filter failed detections first, but the aggregate defends
    ///   the invariant regardless
    ///
    /// ## Returns
    /// The admitted denomination, for immediate "what was just scanned"
    /// feedback distinct from the cumulative total.
    pub fn admit(&mut self, event: &DetectionEvent) -> CoreResult<Denomination> {
        if self.completed {
            return Err(CoreError::SessionClosed {
                session_id: self.id.clone(),
            });
        }

        let denomination = event.denomination()?;

        self.total += denomination.rupiah();
        self.banknote_count += 1;

        match self.tallies.iter_mut().find(|t| t.value == denomination) {
            Some(tally) => tally.count += 1,
            None => {
                self.tallies.push(DenominationTally {
                    value: denomination,
                    count: 1,
                });
                // Values are unique keys, so this is a stable total order.
                self.tallies.sort_by(|a, b| b.value.cmp(&a.value));
            }
        }

        Ok(denomination)
    }

    /// Freezes the session: one-way transition to Completed.
    ///
    /// Totals and tallies are untouched - they are already consistent from
    /// the admits. `completed_at` is stamped and the optional note stored.
    ///
    /// ## Errors
    /// `SessionClosed` when the session is already completed. Re-finalizing
    /// does not re-stamp `completed_at` or overwrite the note.
    pub fn finalize(&mut self, note: Option<String>) -> CoreResult<()> {
        if self.completed {
            return Err(CoreError::SessionClosed {
                session_id: self.id.clone(),
            });
        }

        self.completed = true;
        self.completed_at = Some(Utc::now());
        self.note = note;
        Ok(())
    }

    /// Pure read-side projection with the formatted and spoken renderings.
    ///
    /// Calling this twice with no intervening admit/finalize returns
    /// identical results.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id.clone(),
            total_amount: self.total.value(),
            total_formatted: self.total.to_string(),
            total_words: self.total.to_words(),
            banknote_count: self.banknote_count,
            currency: "IDR".to_string(),
            tallies: self.tallies.iter().map(TallySummary::from).collect(),
            is_completed: self.completed,
            note: self.note.clone(),
            created_at: self.created_at,
            completed_at: self.completed_at,
        }
    }
}

// =============================================================================
// Summary Projection
// =============================================================================

/// Read-only view of a session, the sole contract surface given to callers.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub total_amount: i64,
    /// `Rp`-formatted total, e.g. "Rp 120.000".
    pub total_formatted: String,
    /// Spoken-form total, e.g. "seratus dua puluh ribu rupiah".
    pub total_words: String,
    pub banknote_count: u32,
    pub currency: String,
    pub tallies: Vec<TallySummary>,
    pub is_completed: bool,
    pub note: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// One breakdown line in a summary.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TallySummary {
    pub value: i64,
    pub value_formatted: String,
    pub count: u32,
    pub subtotal: i64,
    pub subtotal_formatted: String,
}

impl From<&DenominationTally> for TallySummary {
    fn from(tally: &DenominationTally) -> Self {
        let subtotal = tally.subtotal();
        TallySummary {
            value: tally.value.value(),
            value_formatted: tally.value.to_string(),
            count: tally.count,
            subtotal: subtotal.value(),
            subtotal_formatted: subtotal.to_string(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn event(value: i64) -> DetectionEvent {
        DetectionEvent::new(value, 90.0, "test")
    }

    fn admit_all(session: &mut CalculationSession, values: &[i64]) {
        for v in values {
            session.admit(&event(*v)).unwrap();
        }
    }

    #[test]
    fn test_new_session_is_empty_and_open() {
        let session = CalculationSession::new("user-1");
        assert_eq!(session.total(), Rupiah::zero());
        assert_eq!(session.banknote_count(), 0);
        assert!(session.tallies().is_empty());
        assert!(!session.is_completed());
        assert!(session.completed_at().is_none());
    }

    /// Scenario A: 50k + 20k + 50k => total 120k, 3 notes, tallies
    /// [{50000,2},{20000,1}].
    #[test]
    fn test_admit_accumulates_and_groups() {
        let mut session = CalculationSession::new("user-1");
        admit_all(&mut session, &[50_000, 20_000, 50_000]);

        assert_eq!(session.total().value(), 120_000);
        assert_eq!(session.banknote_count(), 3);
        assert_eq!(session.tallies().len(), 2);
        assert_eq!(session.tallies()[0].value, Denomination::Rp50000);
        assert_eq!(session.tallies()[0].count, 2);
        assert_eq!(session.tallies()[1].value, Denomination::Rp20000);
        assert_eq!(session.tallies()[1].count, 1);
    }

    /// Scenario B: finalize an empty session with a note.
    #[test]
    fn test_finalize_empty_session() {
        let mut session = CalculationSession::new("user-1");
        session.finalize(Some("test".to_string())).unwrap();

        let summary = session.summary();
        assert!(summary.is_completed);
        assert_eq!(summary.note.as_deref(), Some("test"));
        assert_eq!(summary.total_amount, 0);
        assert_eq!(summary.banknote_count, 0);
        assert_eq!(summary.total_words, "nol rupiah");
        assert!(summary.completed_at.is_some());
    }

    /// Scenario C: admit after finalize fails and changes nothing.
    #[test]
    fn test_terminal_lock() {
        let mut session = CalculationSession::new("user-1");
        session.admit(&event(10_000)).unwrap();
        session.finalize(None).unwrap();

        let err = session.admit(&event(5_000)).unwrap_err();
        assert!(matches!(err, CoreError::SessionClosed { .. }));

        let summary = session.summary();
        assert_eq!(summary.total_amount, 10_000);
        assert_eq!(summary.banknote_count, 1);
        assert_eq!(summary.tallies.len(), 1);
    }

    /// Scenario D: a failed detection (value 0) is rejected before any
    /// state mutation.
    #[test]
    fn test_failed_detection_rejected_without_mutation() {
        let mut session = CalculationSession::new("user-1");
        session.admit(&event(20_000)).unwrap();

        let err = session.admit(&event(0)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidDenomination { value: 0 }));

        assert_eq!(session.total().value(), 20_000);
        assert_eq!(session.banknote_count(), 1);

        // Out-of-set values are rejected the same way
        let err = session.admit(&event(3_000)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidDenomination { value: 3_000 }));
        assert_eq!(session.banknote_count(), 1);
    }

    #[test]
    fn test_double_finalize_is_an_error() {
        let mut session = CalculationSession::new("user-1");
        session.finalize(Some("first".to_string())).unwrap();
        let first_stamp = session.completed_at();

        let err = session.finalize(Some("second".to_string())).unwrap_err();
        assert!(matches!(err, CoreError::SessionClosed { .. }));

        // Neither the note nor the completion stamp moved
        assert_eq!(session.note(), Some("first"));
        assert_eq!(session.completed_at(), first_stamp);
    }

    #[test]
    fn test_additive_and_conservation_invariants() {
        let values = [100_000, 1_000, 50_000, 1_000, 20_000, 100_000, 5_000, 2_000];
        let mut session = CalculationSession::new("user-1");
        admit_all(&mut session, &values);

        let expected_total: i64 = values.iter().sum();
        assert_eq!(session.total().value(), expected_total);
        assert_eq!(session.banknote_count() as usize, values.len());

        let tally_count: u32 = session.tallies().iter().map(|t| t.count).sum();
        assert_eq!(tally_count, session.banknote_count());

        let tally_total: i64 = session.tallies().iter().map(|t| t.subtotal().value()).sum();
        assert_eq!(tally_total, session.total().value());
    }

    #[test]
    fn test_sort_invariant_after_every_admit() {
        let values = [1_000, 100_000, 5_000, 2_000, 50_000, 10_000, 20_000];
        let mut session = CalculationSession::new("user-1");

        for v in values {
            session.admit(&event(v)).unwrap();
            let tallies = session.tallies();
            assert!(
                tallies.windows(2).all(|w| w[0].value > w[1].value),
                "tallies not strictly descending after admitting {}",
                v
            );
        }
    }

    #[test]
    fn test_summary_is_idempotent() {
        let mut session = CalculationSession::new("user-1");
        admit_all(&mut session, &[50_000, 50_000, 20_000]);

        let a = session.summary();
        let b = session.summary();
        assert_eq!(serde_json::to_value(&a).unwrap(), serde_json::to_value(&b).unwrap());
    }

    #[test]
    fn test_summary_formatting() {
        let mut session = CalculationSession::new("user-1");
        admit_all(&mut session, &[50_000, 50_000, 20_000]);

        let summary = session.summary();
        assert_eq!(summary.total_formatted, "Rp 120.000");
        assert_eq!(summary.total_words, "seratus dua puluh ribu rupiah");
        assert_eq!(summary.currency, "IDR");

        let top = &summary.tallies[0];
        assert_eq!(top.value, 50_000);
        assert_eq!(top.value_formatted, "Rp 50.000");
        assert_eq!(top.count, 2);
        assert_eq!(top.subtotal, 100_000);
        assert_eq!(top.subtotal_formatted, "Rp 100.000");
    }

    #[test]
    fn test_from_parts_restores_sort_order() {
        let tallies = vec![
            DenominationTally {
                value: Denomination::Rp2000,
                count: 1,
            },
            DenominationTally {
                value: Denomination::Rp100000,
                count: 3,
            },
            DenominationTally {
                value: Denomination::Rp10000,
                count: 2,
            },
        ];
        let session = CalculationSession::from_parts(
            "sess-1",
            "user-1",
            Rupiah::new(322_000),
            6,
            tallies,
            false,
            None,
            Utc::now(),
            None,
        );

        let values: Vec<i64> = session.tallies().iter().map(|t| t.value.value()).collect();
        assert_eq!(values, vec![100_000, 10_000, 2_000]);
    }

    #[test]
    fn test_breakdown_json_shape() {
        let mut session = CalculationSession::new("user-1");
        admit_all(&mut session, &[50_000, 50_000]);

        let json = serde_json::to_string(session.tallies()).unwrap();
        assert_eq!(json, r#"[{"value":50000,"count":2}]"#);
    }
}
