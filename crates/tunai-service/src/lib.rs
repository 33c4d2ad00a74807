//! # tunai-service: Scan Orchestration for Scan Tunai
//!
//! The service surface handed to callers. It wires the quota guard, the
//! external banknote detector, the session aggregate, and the history
//! cache into the flows the product exposes.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Scan Tunai Data Flow                           │
//! │                                                                     │
//! │  HTTP layer / cloud function (external)                             │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  ┌───────────────────────────────────────────────────────────────┐  │
//! │  │                 tunai-service (THIS CRATE)                    │  │
//! │  │                                                               │  │
//! │  │  ┌────────────┐  ┌────────────┐  ┌────────────┐               │  │
//! │  │  │ScanService │  │ detector   │  │   cache    │               │  │
//! │  │  │ (scan.rs)  │  │ (trait)    │  │ (explicit  │               │  │
//! │  │  │            │──│ AI client  │  │  handle)   │               │  │
//! │  │  └─────┬──────┘  │  plugs in  │  └────────────┘               │  │
//! │  │        │         └────────────┘                               │  │
//! │  └────────┼──────────────────────────────────────────────────────┘  │
//! │           ▼                                                         │
//! │  tunai-db repositories → SQLite                                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tunai_db::{Database, DbConfig};
//! use tunai_service::{ScanCache, ScanService};
//!
//! let db = Database::new(DbConfig::new("tunai.db")).await?;
//! let cache = ScanCache::disabled(); // or ScanCache::connect(url, ttl).await?
//! let service = ScanService::new(db, my_detector, cache);
//!
//! let started = service.start_session(&user_id).await?;
//! let added = service
//!     .add_to_session(&user_id, &started.summary.session_id, &image)
//!     .await?;
//! println!("{}", added.summary.total_formatted); // "Rp 50.000"
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cache;
pub mod detector;
pub mod error;
pub mod scan;

// =============================================================================
// Re-exports
// =============================================================================

pub use cache::{ScanCache, DEFAULT_HISTORY_TTL_SECONDS};
pub use detector::{BanknoteDetector, DetectionFailure, ImagePayload};
pub use error::{ErrorCode, ServiceError, ServiceResult};
pub use scan::{
    Pagination, ScanHistoryEntry, ScanHistoryResponse, ScanService, SessionFinishedResponse,
    SessionHistoryResponse, SessionScanResponse, SessionStartedResponse, SingleScanResponse,
    DEFAULT_HISTORY_PAGE_LIMIT, DEFAULT_SESSION_PAGE_LIMIT,
};
