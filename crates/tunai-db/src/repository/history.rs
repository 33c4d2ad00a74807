//! # Scan History Repository
//!
//! Per-event history records, independent of the session aggregate.
//!
//! Single scans are appended here directly; session scans are appended by
//! the admit transaction in the session repository. Either way the rows
//! land in the same table so "scan history" views can page over them.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use tunai_core::{DetectionEvent, OperationKind, ScanRecord};

/// Raw scan_events row.
#[derive(Debug, sqlx::FromRow)]
struct ScanRow {
    id: String,
    owner_id: String,
    value: i64,
    confidence: Option<f64>,
    session_id: Option<String>,
    operation: OperationKind,
    created_at: DateTime<Utc>,
}

impl From<ScanRow> for ScanRecord {
    fn from(row: ScanRow) -> Self {
        ScanRecord {
            id: row.id,
            owner_id: row.owner_id,
            value: row.value,
            confidence: row.confidence,
            session_id: row.session_id,
            operation: row.operation,
            created_at: row.created_at,
        }
    }
}

/// Repository for scan-history database operations.
#[derive(Debug, Clone)]
pub struct ScanHistoryRepository {
    pool: SqlitePool,
}

impl ScanHistoryRepository {
    /// Creates a new ScanHistoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ScanHistoryRepository { pool }
    }

    /// Appends a single-scan history record and returns it.
    pub async fn append_single_scan(
        &self,
        owner_id: &str,
        event: &DetectionEvent,
    ) -> DbResult<ScanRecord> {
        let record = ScanRecord {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            value: event.value,
            confidence: Some(event.confidence),
            session_id: None,
            operation: OperationKind::SingleScan,
            created_at: Utc::now(),
        };

        debug!(id = %record.id, owner = %owner_id, value = record.value, "Appending scan record");

        sqlx::query(
            "INSERT INTO scan_events \
             (id, owner_id, value, confidence, session_id, operation, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&record.id)
        .bind(&record.owner_id)
        .bind(record.value)
        .bind(record.confidence)
        .bind(&record.session_id)
        .bind(record.operation)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    /// Lists an owner's scan records of one operation kind, newest first.
    ///
    /// ## Returns
    /// The page of records plus the total matching count for paging.
    pub async fn list(
        &self,
        owner_id: &str,
        operation: OperationKind,
        limit: i64,
        offset: i64,
    ) -> DbResult<(Vec<ScanRecord>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM scan_events \
             WHERE owner_id = ?1 AND operation = ?2",
        )
        .bind(owner_id)
        .bind(operation)
        .fetch_one(&self.pool)
        .await?;

        let rows: Vec<ScanRow> = sqlx::query_as(
            "SELECT id, owner_id, value, confidence, session_id, operation, created_at \
             FROM scan_events \
             WHERE owner_id = ?1 AND operation = ?2 \
             ORDER BY created_at DESC \
             LIMIT ?3 OFFSET ?4",
        )
        .bind(owner_id)
        .bind(operation)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.into_iter().map(ScanRecord::from).collect(), total))
    }

    /// Lists every record admitted into one session, oldest first.
    ///
    /// The ordered event list a session's tallies are reconstructible from.
    pub async fn list_for_session(
        &self,
        session_id: &str,
        owner_id: &str,
    ) -> DbResult<Vec<ScanRecord>> {
        let rows: Vec<ScanRow> = sqlx::query_as(
            "SELECT id, owner_id, value, confidence, session_id, operation, created_at \
             FROM scan_events \
             WHERE session_id = ?1 AND owner_id = ?2 \
             ORDER BY created_at",
        )
        .bind(session_id)
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ScanRecord::from).collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
