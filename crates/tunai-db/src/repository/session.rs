//! # Session Repository
//!
//! Database operations for calculation sessions.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     Session Lifecycle                               │
//! │                                                                     │
//! │  1. CREATE                                                          │
//! │     └── create_session() → open session, zeroed totals              │
//! │                                                                     │
//! │  2. ADMIT (repeatable)                                              │
//! │     └── admit_event() → ONE transaction:                            │
//! │         load row → aggregate admit → guarded write-back             │
//! │         → append scan_events history row                            │
//! │                                                                     │
//! │  3. FINALIZE                                                        │
//! │     └── finalize() → is_completed=1, completed_at stamped, note     │
//! │                                                                     │
//! │  Completed sessions are read-only; there is no delete.              │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! Two concurrent admits to one session must never both read the same
//! snapshot and write back stale totals. The write-back is guarded by
//! `banknote_count = <count seen at load>`; a raced transaction matches
//! zero rows, rolls back, and surfaces `WriteConflict`.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tunai_core::{
    CalculationSession, CoreError, Denomination, DenominationTally, DetectionEvent, OperationKind,
    Rupiah,
};

/// Shared SELECT list so every loader decodes the same shape.
const SESSION_COLUMNS: &str = "id, owner_id, total_amount, banknote_count, breakdown, \
     is_completed, note, created_at, completed_at";

/// Raw calculation_sessions row.
#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    id: String,
    owner_id: String,
    total_amount: i64,
    banknote_count: i64,
    breakdown: String,
    is_completed: bool,
    note: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl SessionRow {
    /// Rehydrates the aggregate; an undecodable breakdown column is
    /// corrupted state, not a caller error.
    fn into_session(self) -> DbResult<CalculationSession> {
        let tallies: Vec<DenominationTally> = serde_json::from_str(&self.breakdown)
            .map_err(|e| {
                DbError::Internal(format!(
                    "undecodable breakdown for session {}: {}",
                    self.id, e
                ))
            })?;

        Ok(CalculationSession::from_parts(
            self.id,
            self.owner_id,
            Rupiah::new(self.total_amount),
            self.banknote_count as u32,
            tallies,
            self.is_completed,
            self.note,
            self.created_at,
            self.completed_at,
        ))
    }
}

/// Repository for calculation-session database operations.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    /// Creates a new SessionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    /// Creates a new open session for `owner_id`.
    pub async fn create_session(&self, owner_id: &str) -> DbResult<CalculationSession> {
        let session = CalculationSession::new(owner_id);

        debug!(id = %session.id(), owner = %owner_id, "Creating calculation session");

        sqlx::query(
            "INSERT INTO calculation_sessions \
             (id, owner_id, total_amount, banknote_count, currency, breakdown, \
              is_completed, note, created_at, completed_at) \
             VALUES (?1, ?2, ?3, ?4, 'IDR', ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(session.id())
        .bind(session.owner_id())
        .bind(session.total().value())
        .bind(session.banknote_count() as i64)
        .bind(serde_json::to_string(session.tallies()).unwrap_or_else(|_| "[]".to_string()))
        .bind(session.is_completed())
        .bind(session.note())
        .bind(session.created_at())
        .bind(session.completed_at())
        .execute(&self.pool)
        .await?;

        Ok(session)
    }

    /// Gets a session by id, scoped to its owner.
    ///
    /// A session owned by someone else is indistinguishable from a
    /// missing one.
    pub async fn get_by_id(
        &self,
        session_id: &str,
        owner_id: &str,
    ) -> DbResult<Option<CalculationSession>> {
        let row: Option<SessionRow> = sqlx::query_as(&format!(
            "SELECT {SESSION_COLUMNS} FROM calculation_sessions \
             WHERE id = ?1 AND owner_id = ?2"
        ))
        .bind(session_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(SessionRow::into_session).transpose()
    }

    /// Admits one detected banknote into a session.
    ///
    /// ## Atomicity
    /// One transaction covers: loading the session row, applying the
    /// aggregate's admit, the guarded write-back of totals/breakdown,
    /// and the scan_events history append. Any rejection - closed
    /// session, invalid denomination, stale snapshot - rolls the whole
    /// transaction back and leaves storage untouched.
    ///
    /// ## Returns
    /// The updated session plus the admitted denomination for immediate
    /// user feedback.
    pub async fn admit_event(
        &self,
        session_id: &str,
        owner_id: &str,
        event: &DetectionEvent,
    ) -> DbResult<(CalculationSession, Denomination)> {
        debug!(session_id = %session_id, value = event.value, "Admitting scan into session");

        let mut tx = self.pool.begin().await?;

        let row: Option<SessionRow> = sqlx::query_as(&format!(
            "SELECT {SESSION_COLUMNS} FROM calculation_sessions \
             WHERE id = ?1 AND owner_id = ?2"
        ))
        .bind(session_id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?;

        let row = row.ok_or_else(|| DbError::not_found("Session", session_id))?;
        let count_at_load = row.banknote_count;

        let mut session = row.into_session()?;
        let denomination = session.admit(event).map_err(DbError::Domain)?;

        let breakdown = serde_json::to_string(session.tallies())
            .map_err(|e| DbError::Internal(format!("breakdown serialization failed: {}", e)))?;

        let result = sqlx::query(
            "UPDATE calculation_sessions SET \
                 total_amount = ?3, \
                 banknote_count = ?4, \
                 breakdown = ?5 \
             WHERE id = ?1 AND owner_id = ?2 \
               AND is_completed = 0 AND banknote_count = ?6",
        )
        .bind(session_id)
        .bind(owner_id)
        .bind(session.total().value())
        .bind(session.banknote_count() as i64)
        .bind(breakdown)
        .bind(count_at_load)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::conflict("Session", session_id));
        }

        // Parallel per-event history record, tagged with the session id
        sqlx::query(
            "INSERT INTO scan_events \
             (id, owner_id, value, confidence, session_id, operation, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(owner_id)
        .bind(denomination.value())
        .bind(event.confidence)
        .bind(session_id)
        .bind(OperationKind::SessionCount)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((session, denomination))
    }

    /// Finalizes a session: one-way transition to completed.
    ///
    /// ## Errors
    /// - `NotFound` when the session doesn't exist for this owner
    /// - `Domain(SessionClosed)` when it was already finalized - the
    ///   note and completion stamp are never overwritten
    pub async fn finalize(
        &self,
        session_id: &str,
        owner_id: &str,
        note: Option<String>,
    ) -> DbResult<CalculationSession> {
        debug!(session_id = %session_id, "Finalizing calculation session");

        let mut tx = self.pool.begin().await?;

        let row: Option<SessionRow> = sqlx::query_as(&format!(
            "SELECT {SESSION_COLUMNS} FROM calculation_sessions \
             WHERE id = ?1 AND owner_id = ?2"
        ))
        .bind(session_id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?;

        let row = row.ok_or_else(|| DbError::not_found("Session", session_id))?;
        if row.is_completed {
            return Err(DbError::Domain(CoreError::SessionClosed {
                session_id: session_id.to_string(),
            }));
        }

        let completed_at = Utc::now();
        let result = sqlx::query(
            "UPDATE calculation_sessions SET \
                 is_completed = 1, \
                 completed_at = ?3, \
                 note = ?4 \
             WHERE id = ?1 AND owner_id = ?2 AND is_completed = 0",
        )
        .bind(session_id)
        .bind(owner_id)
        .bind(completed_at)
        .bind(&note)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::conflict("Session", session_id));
        }

        tx.commit().await?;

        let frozen = CalculationSession::from_parts(
            row.id,
            row.owner_id,
            Rupiah::new(row.total_amount),
            row.banknote_count as u32,
            serde_json::from_str(&row.breakdown)
                .map_err(|e| DbError::Internal(format!("undecodable breakdown: {}", e)))?,
            true,
            note,
            row.created_at,
            Some(completed_at),
        );

        Ok(frozen)
    }

    /// Lists completed sessions for an owner, newest first.
    ///
    /// ## Returns
    /// The page of sessions plus the total completed count for paging.
    pub async fn list_completed(
        &self,
        owner_id: &str,
        limit: i64,
        offset: i64,
    ) -> DbResult<(Vec<CalculationSession>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM calculation_sessions \
             WHERE owner_id = ?1 AND is_completed = 1",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        let rows: Vec<SessionRow> = sqlx::query_as(&format!(
            "SELECT {SESSION_COLUMNS} FROM calculation_sessions \
             WHERE owner_id = ?1 AND is_completed = 1 \
             ORDER BY completed_at DESC, created_at DESC \
             LIMIT ?2 OFFSET ?3"
        ))
        .bind(owner_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let sessions = rows
            .into_iter()
            .map(SessionRow::into_session)
            .collect::<DbResult<Vec<_>>>()?;

        Ok((sessions, total))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn event(value: i64) -> DetectionEvent {
        DetectionEvent::new(value, 91.0, "test")
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = test_db().await;
        let repo = db.sessions();

        let created = repo.create_session("user-1").await.unwrap();
        let loaded = repo
            .get_by_id(created.id(), "user-1")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(loaded.id(), created.id());
        assert_eq!(loaded.total(), Rupiah::zero());
        assert!(!loaded.is_completed());
    }

    #[tokio::test]
    async fn test_ownership_scoping() {
        let db = test_db().await;
        let repo = db.sessions();

        let created = repo.create_session("user-1").await.unwrap();
        assert!(repo
            .get_by_id(created.id(), "someone-else")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_admit_accumulates_and_appends_history() {
        let db = test_db().await;
        let repo = db.sessions();

        let session = repo.create_session("user-1").await.unwrap();
        repo.admit_event(session.id(), "user-1", &event(50_000))
            .await
            .unwrap();
        repo.admit_event(session.id(), "user-1", &event(20_000))
            .await
            .unwrap();
        let (updated, denomination) = repo
            .admit_event(session.id(), "user-1", &event(50_000))
            .await
            .unwrap();

        assert_eq!(denomination, Denomination::Rp50000);
        assert_eq!(updated.total().value(), 120_000);
        assert_eq!(updated.banknote_count(), 3);
        assert_eq!(updated.tallies().len(), 2);
        assert_eq!(updated.tallies()[0].value, Denomination::Rp50000);
        assert_eq!(updated.tallies()[0].count, 2);

        // Each admit also wrote an independent history row
        let (records, total) = db
            .scans()
            .list(
                "user-1",
                OperationKind::SessionCount,
                10,
                0,
            )
            .await
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(records.len(), 3);
        assert!(records
            .iter()
            .all(|r| r.session_id.as_deref() == Some(session.id())));
    }

    #[tokio::test]
    async fn test_admit_survives_reload() {
        let db = test_db().await;
        let repo = db.sessions();

        let session = repo.create_session("user-1").await.unwrap();
        repo.admit_event(session.id(), "user-1", &event(100_000))
            .await
            .unwrap();

        let loaded = repo
            .get_by_id(session.id(), "user-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.total().value(), 100_000);
        assert_eq!(loaded.tallies()[0].value, Denomination::Rp100000);
    }

    #[tokio::test]
    async fn test_admit_rejects_failure_marker_without_writes() {
        let db = test_db().await;
        let repo = db.sessions();

        let session = repo.create_session("user-1").await.unwrap();
        let err = repo
            .admit_event(session.id(), "user-1", &event(0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidDenomination { value: 0 })
        ));

        let loaded = repo
            .get_by_id(session.id(), "user-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.banknote_count(), 0);

        let (_, total) = db
            .scans()
            .list("user-1", OperationKind::SessionCount, 10, 0)
            .await
            .unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_terminal_lock_at_storage_layer() {
        let db = test_db().await;
        let repo = db.sessions();

        let session = repo.create_session("user-1").await.unwrap();
        repo.admit_event(session.id(), "user-1", &event(10_000))
            .await
            .unwrap();
        repo.finalize(session.id(), "user-1", None).await.unwrap();

        let err = repo
            .admit_event(session.id(), "user-1", &event(5_000))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::SessionClosed { .. })
        ));

        let loaded = repo
            .get_by_id(session.id(), "user-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.total().value(), 10_000);
        assert_eq!(loaded.banknote_count(), 1);
    }

    #[tokio::test]
    async fn test_finalize_stamps_and_stores_note() {
        let db = test_db().await;
        let repo = db.sessions();

        let session = repo.create_session("user-1").await.unwrap();
        let frozen = repo
            .finalize(session.id(), "user-1", Some("uang kas".to_string()))
            .await
            .unwrap();

        assert!(frozen.is_completed());
        assert_eq!(frozen.note(), Some("uang kas"));
        assert!(frozen.completed_at().is_some());
        assert_eq!(frozen.total(), Rupiah::zero());
    }

    #[tokio::test]
    async fn test_double_finalize_is_rejected() {
        let db = test_db().await;
        let repo = db.sessions();

        let session = repo.create_session("user-1").await.unwrap();
        repo.finalize(session.id(), "user-1", Some("first".to_string()))
            .await
            .unwrap();

        let err = repo
            .finalize(session.id(), "user-1", Some("second".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::SessionClosed { .. })
        ));

        let loaded = repo
            .get_by_id(session.id(), "user-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.note(), Some("first"));
    }

    #[tokio::test]
    async fn test_finalize_missing_session_is_not_found() {
        let db = test_db().await;
        let repo = db.sessions();

        let err = repo
            .finalize("00000000-0000-0000-0000-000000000000", "user-1", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_completed_pages_newest_first() {
        let db = test_db().await;
        let repo = db.sessions();

        for i in 0..3 {
            let session = repo.create_session("user-1").await.unwrap();
            repo.admit_event(session.id(), "user-1", &event(1_000))
                .await
                .unwrap();
            repo.finalize(session.id(), "user-1", Some(format!("sesi {}", i)))
                .await
                .unwrap();
        }
        // Still-open session must not appear
        repo.create_session("user-1").await.unwrap();

        let (page, total) = repo.list_completed("user-1", 2, 0).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].note(), Some("sesi 2"));

        let (rest, _) = repo.list_completed("user-1", 2, 2).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].note(), Some("sesi 0"));
    }
}
