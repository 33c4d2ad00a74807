//! # Scan Service
//!
//! Orchestrates the full scan flows: quota guard → detector → aggregate →
//! formatted response.
//!
//! ## Operation Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     ScanService Operations                          │
//! │                                                                     │
//! │  scan_single        quota ─► detect ─► history append ─► response   │
//! │                                                                     │
//! │  start_session      create open session, zeroed totals              │
//! │  add_to_session     ownership check ─► quota ─► detect ─► ONE       │
//! │                     atomic admit (totals + history) ─► response     │
//! │  finish_session     validated note ─► one-way freeze                │
//! │  session_info       read-only summary projection                    │
//! │                                                                     │
//! │  scan_history       paged single scans (page 1 via cache)           │
//! │  session_history    paged completed sessions                        │
//! │                                                                     │
//! │  Every response carries the formatted ("Rp 120.000") and spoken     │
//! │  ("seratus dua puluh ribu rupiah") renderings the frontend reads    │
//! │  aloud - presentation work that never leaks into the aggregate.     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::ScanCache;
use crate::detector::{BanknoteDetector, DetectionFailure, ImagePayload};
use crate::error::{ServiceError, ServiceResult};
use tunai_core::validation::{validate_id, validate_limit, validate_note, validate_page};
use tunai_core::{
    CoreError, DeniedReason, DetectionEvent, OperationKind, QuotaDecision, Rupiah, SessionSummary,
};
use tunai_db::{Database, DbError};

/// Default page size for the single-scan history view.
pub const DEFAULT_HISTORY_PAGE_LIMIT: i64 = 20;

/// Default page size for the completed-session history view.
pub const DEFAULT_SESSION_PAGE_LIMIT: i64 = 10;

// User-facing copy; the frontend speaks these aloud.
const MSG_SCAN_OK: &str = "Scan berhasil!";
const MSG_ADDED: &str = "Uang berhasil ditambahkan!";
const MSG_SESSION_STARTED: &str =
    "Sesi perhitungan dimulai. Silakan mulai scan uang satu per satu.";
const MSG_SESSION_FINISHED: &str = "Sesi perhitungan selesai!";
const MSG_SESSION_NOT_FOUND: &str = "Sesi perhitungan tidak ditemukan.";
const MSG_DETECTION_FAILED: &str =
    "Tidak dapat mendeteksi uang. Pastikan gambar jelas dan uang terlihat dengan baik.";
const MSG_DETECTOR_ERROR: &str = "Terjadi kesalahan saat memproses gambar.";
const MSG_DAILY_LIMIT: &str =
    "Batas scan harian tercapai. Upgrade ke paket berbayar untuk scan tanpa batas.";
const MSG_SUBSCRIPTION_INACTIVE: &str = "Langganan tidak aktif.";

// =============================================================================
// Response DTOs
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleScanResponse {
    pub scan_id: String,
    pub value: i64,
    pub value_formatted: String,
    /// Spoken form, e.g. "lima puluh ribu rupiah".
    pub speech_text: String,
    pub currency: String,
    pub confidence: f64,
    /// Calls left today; `None` for unmetered plans.
    pub remaining_scans: Option<i64>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStartedResponse {
    pub summary: SessionSummary,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionScanResponse {
    /// The note that was just admitted - distinct from the running total.
    pub scanned_value: i64,
    pub scanned_formatted: String,
    pub scanned_text: String,
    pub confidence: f64,
    pub remaining_scans: Option<i64>,
    /// Cumulative session state after the admit.
    pub summary: SessionSummary,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFinishedResponse {
    pub summary: SessionSummary,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanHistoryEntry {
    pub id: String,
    pub value: i64,
    pub value_formatted: String,
    pub speech_text: String,
    pub currency: String,
    pub confidence: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanHistoryResponse {
    pub scans: Vec<ScanHistoryEntry>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionHistoryResponse {
    pub sessions: Vec<SessionSummary>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl Pagination {
    fn new(total: i64, page: i64, limit: i64) -> Self {
        Pagination {
            total,
            page,
            limit,
            total_pages: (total + limit - 1) / limit.max(1),
        }
    }
}

// =============================================================================
// Scan Service
// =============================================================================

/// The orchestration layer handed to callers.
///
/// Generic over the detector so production wires in the AI client while
/// tests use a scripted stub. Database and cache handles are passed in
/// explicitly - the service owns no global state.
#[derive(Debug, Clone)]
pub struct ScanService<D> {
    db: Database,
    detector: D,
    cache: ScanCache,
}

impl<D: BanknoteDetector> ScanService<D> {
    /// Creates the service from its three collaborators.
    pub fn new(db: Database, detector: D, cache: ScanCache) -> Self {
        ScanService {
            db,
            detector,
            cache,
        }
    }

    /// Access to the underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    // -------------------------------------------------------------------------
    // Single scan
    // -------------------------------------------------------------------------

    /// One-off scan outside any session.
    ///
    /// Quota is reserved before the detector is even attempted; a failed
    /// detection therefore still consumes a slot, but never writes.
    pub async fn scan_single(
        &self,
        owner_id: &str,
        image: &ImagePayload,
    ) -> ServiceResult<SingleScanResponse> {
        debug!(owner = %owner_id, "scan_single");

        let remaining = self.reserve_quota(owner_id).await?;
        let event = self.run_detector(image).await?;
        let denomination = event.denomination()?;

        let record = self.db.scans().append_single_scan(owner_id, &event).await?;
        self.cache.invalidate(owner_id).await;

        info!(owner = %owner_id, value = denomination.value(), "Single scan recorded");

        Ok(SingleScanResponse {
            scan_id: record.id,
            value: denomination.value(),
            value_formatted: denomination.to_string(),
            speech_text: denomination.speech_text().to_string(),
            currency: "IDR".to_string(),
            confidence: event.confidence,
            remaining_scans: remaining,
            message: MSG_SCAN_OK.to_string(),
        })
    }

    // -------------------------------------------------------------------------
    // Counting sessions
    // -------------------------------------------------------------------------

    /// Starts a counting session.
    pub async fn start_session(&self, owner_id: &str) -> ServiceResult<SessionStartedResponse> {
        let session = self.db.sessions().create_session(owner_id).await?;

        info!(owner = %owner_id, session_id = %session.id(), "Calculation session started");

        Ok(SessionStartedResponse {
            summary: session.summary(),
            message: MSG_SESSION_STARTED.to_string(),
        })
    }

    /// Scans one banknote into an open session.
    ///
    /// The ownership/open check runs before quota and detection, so a
    /// request against a dead session costs the user nothing.
    pub async fn add_to_session(
        &self,
        owner_id: &str,
        session_id: &str,
        image: &ImagePayload,
    ) -> ServiceResult<SessionScanResponse> {
        validate_id("session_id", session_id)?;
        debug!(owner = %owner_id, session_id = %session_id, "add_to_session");

        let session = self
            .db
            .sessions()
            .get_by_id(session_id, owner_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(MSG_SESSION_NOT_FOUND))?;
        if session.is_completed() {
            return Err(CoreError::SessionClosed {
                session_id: session_id.to_string(),
            }
            .into());
        }

        let remaining = self.reserve_quota(owner_id).await?;
        let event = self.run_detector(image).await?;

        let (updated, denomination) = self
            .db
            .sessions()
            .admit_event(session_id, owner_id, &event)
            .await
            .map_err(map_session_not_found)?;

        info!(
            owner = %owner_id,
            session_id = %session_id,
            value = denomination.value(),
            total = updated.total().value(),
            "Banknote admitted"
        );

        Ok(SessionScanResponse {
            scanned_value: denomination.value(),
            scanned_formatted: denomination.to_string(),
            scanned_text: denomination.speech_text().to_string(),
            confidence: event.confidence,
            remaining_scans: remaining,
            summary: updated.summary(),
            message: MSG_ADDED.to_string(),
        })
    }

    /// Finalizes a session with an optional note. One-way; a second
    /// finalize fails with `SESSION_CLOSED`.
    pub async fn finish_session(
        &self,
        owner_id: &str,
        session_id: &str,
        note: Option<&str>,
    ) -> ServiceResult<SessionFinishedResponse> {
        validate_id("session_id", session_id)?;
        let note = validate_note(note)?;

        let frozen = self
            .db
            .sessions()
            .finalize(session_id, owner_id, note)
            .await
            .map_err(map_session_not_found)?;

        info!(
            owner = %owner_id,
            session_id = %session_id,
            total = frozen.total().value(),
            banknotes = frozen.banknote_count(),
            "Calculation session finished"
        );

        Ok(SessionFinishedResponse {
            summary: frozen.summary(),
            message: MSG_SESSION_FINISHED.to_string(),
        })
    }

    /// Read-only summary of a session, open or completed.
    pub async fn session_info(
        &self,
        owner_id: &str,
        session_id: &str,
    ) -> ServiceResult<SessionSummary> {
        validate_id("session_id", session_id)?;

        let session = self
            .db
            .sessions()
            .get_by_id(session_id, owner_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(MSG_SESSION_NOT_FOUND))?;

        Ok(session.summary())
    }

    // -------------------------------------------------------------------------
    // History views
    // -------------------------------------------------------------------------

    /// Paged single-scan history, newest first.
    ///
    /// The default first page is served through the cache handle when one
    /// is enabled; everything else always hits the database.
    pub async fn scan_history(
        &self,
        owner_id: &str,
        page: i64,
        limit: i64,
    ) -> ServiceResult<ScanHistoryResponse> {
        validate_page(page)?;
        validate_limit(limit)?;

        let cacheable = page == 1 && limit == DEFAULT_HISTORY_PAGE_LIMIT;
        if cacheable {
            if let Some(cached) = self.cache.get_first_page(owner_id).await {
                match serde_json::from_str::<ScanHistoryResponse>(&cached) {
                    Ok(response) => {
                        debug!(owner = %owner_id, "Scan history served from cache");
                        return Ok(response);
                    }
                    Err(e) => warn!(owner = %owner_id, "Discarding undecodable cache entry: {}", e),
                }
            }
        }

        let offset = (page - 1) * limit;
        let (records, total) = self
            .db
            .scans()
            .list(owner_id, OperationKind::SingleScan, limit, offset)
            .await?;

        let response = ScanHistoryResponse {
            scans: records
                .into_iter()
                .map(|record| {
                    let speech_text = match record.denomination() {
                        Some(denomination) => denomination.speech_text().to_string(),
                        None => format!("{} rupiah", record.value),
                    };
                    ScanHistoryEntry {
                        id: record.id,
                        value: record.value,
                        value_formatted: Rupiah::new(record.value).to_string(),
                        speech_text,
                        currency: "IDR".to_string(),
                        confidence: record.confidence,
                        timestamp: record.created_at,
                    }
                })
                .collect(),
            pagination: Pagination::new(total, page, limit),
        };

        if cacheable {
            if let Ok(payload) = serde_json::to_string(&response) {
                self.cache.put_first_page(owner_id, &payload).await;
            }
        }

        Ok(response)
    }

    /// Paged completed-session history, newest first.
    pub async fn session_history(
        &self,
        owner_id: &str,
        page: i64,
        limit: i64,
    ) -> ServiceResult<SessionHistoryResponse> {
        validate_page(page)?;
        validate_limit(limit)?;

        let offset = (page - 1) * limit;
        let (sessions, total) = self
            .db
            .sessions()
            .list_completed(owner_id, limit, offset)
            .await?;

        Ok(SessionHistoryResponse {
            sessions: sessions.iter().map(|s| s.summary()).collect(),
            pagination: Pagination::new(total, page, limit),
        })
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// Reserves one quota slot, mapping denials to caller errors.
    async fn reserve_quota(&self, owner_id: &str) -> ServiceResult<Option<i64>> {
        let decision = self
            .db
            .subscriptions()
            .check_and_reserve(owner_id, Utc::now())
            .await?;

        match decision {
            QuotaDecision::Allowed { remaining } => Ok(remaining),
            QuotaDecision::Denied { reason } => {
                debug!(owner = %owner_id, ?reason, "Scan refused by quota guard");
                Err(match reason {
                    DeniedReason::DailyLimitReached => {
                        ServiceError::quota_exceeded(MSG_DAILY_LIMIT)
                    }
                    DeniedReason::SubscriptionInactive => {
                        ServiceError::quota_exceeded(MSG_SUBSCRIPTION_INACTIVE)
                    }
                })
            }
        }
    }

    /// Runs the detector and normalizes every failure mode.
    ///
    /// A zero-value event is treated exactly like an explicit
    /// `Unrecognized` - the aggregate would reject it anyway, but nothing
    /// downstream should ever see it.
    async fn run_detector(&self, image: &ImagePayload) -> ServiceResult<DetectionEvent> {
        let event = match self.detector.detect(image).await {
            Ok(event) => event,
            Err(DetectionFailure::Unrecognized { description }) => {
                debug!(%description, "Detector recognized nothing");
                return Err(ServiceError::detection_failed(MSG_DETECTION_FAILED));
            }
            Err(DetectionFailure::Unavailable(reason)) => {
                warn!(%reason, "Detector unavailable");
                return Err(ServiceError::internal(MSG_DETECTOR_ERROR));
            }
        };

        if event.is_failure() {
            return Err(ServiceError::detection_failed(MSG_DETECTION_FAILED));
        }

        Ok(event)
    }
}

/// Rewrites a storage-level miss into the session-specific user copy.
fn map_session_not_found(err: DbError) -> ServiceError {
    match err {
        DbError::NotFound { .. } => ServiceError::not_found(MSG_SESSION_NOT_FOUND),
        other => other.into(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tunai_core::DEFAULT_DAILY_SCAN_LIMIT;
    use tunai_db::DbConfig;

    /// Detector stub replaying a fixed script; exhausted scripts report
    /// Unavailable so a test can tell "detector consulted" apart from
    /// "refused earlier".
    struct ScriptedDetector {
        script: Mutex<VecDeque<Result<DetectionEvent, DetectionFailure>>>,
    }

    impl ScriptedDetector {
        fn with_values(values: &[i64]) -> Self {
            ScriptedDetector {
                script: Mutex::new(
                    values
                        .iter()
                        .map(|&v| Ok(DetectionEvent::new(v, 90.0, "scripted")))
                        .collect(),
                ),
            }
        }

        fn unrecognized() -> Self {
            ScriptedDetector {
                script: Mutex::new(VecDeque::from([Err(DetectionFailure::Unrecognized {
                    description: "blurry".to_string(),
                })])),
            }
        }
    }

    impl BanknoteDetector for ScriptedDetector {
        async fn detect(
            &self,
            _image: &ImagePayload,
        ) -> Result<DetectionEvent, DetectionFailure> {
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(DetectionFailure::Unavailable("script exhausted".into())))
        }
    }

    async fn service(detector: ScriptedDetector) -> ScanService<ScriptedDetector> {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let db = tunai_db::Database::new(DbConfig::in_memory()).await.unwrap();
        ScanService::new(db, detector, ScanCache::disabled())
    }

    fn image() -> ImagePayload {
        ImagePayload::from_upload(vec![0xFF, 0xD8, 0xFF], "uang.jpg")
    }

    #[tokio::test]
    async fn test_single_scan_happy_path() {
        let svc = service(ScriptedDetector::with_values(&[50_000])).await;

        let response = svc.scan_single("user-1", &image()).await.unwrap();
        assert_eq!(response.value, 50_000);
        assert_eq!(response.value_formatted, "Rp 50.000");
        assert_eq!(response.speech_text, "lima puluh ribu rupiah");
        assert_eq!(response.currency, "IDR");
        assert_eq!(response.remaining_scans, Some(DEFAULT_DAILY_SCAN_LIMIT - 1));

        let history = svc.scan_history("user-1", 1, 20).await.unwrap();
        assert_eq!(history.pagination.total, 1);
        assert_eq!(history.scans[0].value, 50_000);
        assert_eq!(history.scans[0].speech_text, "lima puluh ribu rupiah");
    }

    #[tokio::test]
    async fn test_unrecognized_detection_persists_nothing() {
        let svc = service(ScriptedDetector::unrecognized()).await;

        let err = svc.scan_single("user-1", &image()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DetectionFailed);

        let history = svc.scan_history("user-1", 1, 20).await.unwrap();
        assert_eq!(history.pagination.total, 0);

        // The quota slot was reserved before detection was attempted
        let remaining = svc
            .database()
            .subscriptions()
            .remaining_scans("user-1", Utc::now())
            .await
            .unwrap();
        assert_eq!(remaining, Some(DEFAULT_DAILY_SCAN_LIMIT - 1));
    }

    #[tokio::test]
    async fn test_zero_value_event_is_defended_against() {
        // A misbehaving detector returning the raw failure marker instead
        // of an Unrecognized error
        let svc = service(ScriptedDetector::with_values(&[0])).await;

        let err = svc.scan_single("user-1", &image()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DetectionFailed);

        let history = svc.scan_history("user-1", 1, 20).await.unwrap();
        assert_eq!(history.pagination.total, 0);
    }

    #[tokio::test]
    async fn test_session_counting_flow() {
        let svc = service(ScriptedDetector::with_values(&[50_000, 20_000, 50_000])).await;

        let started = svc.start_session("user-1").await.unwrap();
        let session_id = started.summary.session_id.clone();
        assert_eq!(started.summary.total_amount, 0);
        assert!(!started.summary.is_completed);

        svc.add_to_session("user-1", &session_id, &image())
            .await
            .unwrap();
        svc.add_to_session("user-1", &session_id, &image())
            .await
            .unwrap();
        let third = svc
            .add_to_session("user-1", &session_id, &image())
            .await
            .unwrap();

        // Echo of what was just scanned, distinct from the running total
        assert_eq!(third.scanned_value, 50_000);
        assert_eq!(third.scanned_text, "lima puluh ribu rupiah");
        assert_eq!(third.summary.total_amount, 120_000);
        assert_eq!(third.summary.total_words, "seratus dua puluh ribu rupiah");
        assert_eq!(third.summary.banknote_count, 3);
        assert_eq!(third.summary.tallies.len(), 2);
        assert_eq!(third.summary.tallies[0].value, 50_000);
        assert_eq!(third.summary.tallies[0].count, 2);

        let finished = svc
            .finish_session("user-1", &session_id, Some("kas warung"))
            .await
            .unwrap();
        assert!(finished.summary.is_completed);
        assert_eq!(finished.summary.note.as_deref(), Some("kas warung"));
        assert_eq!(finished.summary.total_amount, 120_000);

        let info = svc.session_info("user-1", &session_id).await.unwrap();
        assert!(info.is_completed);
        assert_eq!(info.total_amount, 120_000);

        let sessions = svc.session_history("user-1", 1, 10).await.unwrap();
        assert_eq!(sessions.pagination.total, 1);
        assert_eq!(sessions.sessions[0].session_id, session_id);
    }

    #[tokio::test]
    async fn test_add_to_missing_session_is_not_found() {
        let svc = service(ScriptedDetector::with_values(&[50_000])).await;

        let err = svc
            .add_to_session("user-1", "00000000-0000-0000-0000-000000000000", &image())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, MSG_SESSION_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_add_to_finished_session_is_session_closed() {
        let svc = service(ScriptedDetector::with_values(&[10_000, 5_000])).await;

        let started = svc.start_session("user-1").await.unwrap();
        let session_id = started.summary.session_id.clone();
        svc.add_to_session("user-1", &session_id, &image())
            .await
            .unwrap();
        svc.finish_session("user-1", &session_id, None).await.unwrap();

        let err = svc
            .add_to_session("user-1", &session_id, &image())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::SessionClosed);

        // Frozen totals unchanged
        let info = svc.session_info("user-1", &session_id).await.unwrap();
        assert_eq!(info.total_amount, 10_000);
        assert_eq!(info.banknote_count, 1);
    }

    #[tokio::test]
    async fn test_double_finish_is_session_closed() {
        let svc = service(ScriptedDetector::with_values(&[])).await;

        let started = svc.start_session("user-1").await.unwrap();
        let session_id = started.summary.session_id.clone();
        svc.finish_session("user-1", &session_id, Some("pertama"))
            .await
            .unwrap();

        let err = svc
            .finish_session("user-1", &session_id, Some("kedua"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::SessionClosed);

        let info = svc.session_info("user-1", &session_id).await.unwrap();
        assert_eq!(info.note.as_deref(), Some("pertama"));
    }

    #[tokio::test]
    async fn test_quota_refuses_before_detector_is_consulted() {
        let values: Vec<i64> = std::iter::repeat(1_000)
            .take(DEFAULT_DAILY_SCAN_LIMIT as usize)
            .collect();
        let svc = service(ScriptedDetector::with_values(&values)).await;

        for _ in 0..DEFAULT_DAILY_SCAN_LIMIT {
            svc.scan_single("user-1", &image()).await.unwrap();
        }

        // Script is exhausted: if the detector were consulted this would
        // surface INTERNAL, not QUOTA_EXCEEDED
        let err = svc.scan_single("user-1", &image()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::QuotaExceeded);
    }

    #[tokio::test]
    async fn test_scan_history_pages() {
        let values: Vec<i64> = vec![1_000, 2_000, 5_000];
        let svc = service(ScriptedDetector::with_values(&values)).await;
        for _ in 0..3 {
            svc.scan_single("user-1", &image()).await.unwrap();
        }

        let page = svc.scan_history("user-1", 1, 2).await.unwrap();
        assert_eq!(page.pagination.total, 3);
        assert_eq!(page.pagination.total_pages, 2);
        assert_eq!(page.scans.len(), 2);
        // Newest first
        assert_eq!(page.scans[0].value, 5_000);

        let last = svc.scan_history("user-1", 2, 2).await.unwrap();
        assert_eq!(last.scans.len(), 1);
        assert_eq!(last.scans[0].value, 1_000);
    }

    #[tokio::test]
    async fn test_invalid_session_id_is_rejected_early() {
        let svc = service(ScriptedDetector::with_values(&[50_000])).await;

        let err = svc
            .add_to_session("user-1", "not-a-uuid", &image())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
