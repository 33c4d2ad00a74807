//! # tunai-core: Pure Business Logic for Scan Tunai
//!
//! This crate is the **heart** of Scan Tunai. It contains all business
//! logic as pure functions and types with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Scan Tunai Architecture                        │
//! │                                                                     │
//! │  ┌───────────────────────────────────────────────────────────────┐  │
//! │  │                  Frontend (React SPA)                         │  │
//! │  │    Camera capture ──► Scan UI ──► Totals ──► Text-to-speech   │  │
//! │  └───────────────────────────────┬───────────────────────────────┘  │
//! │                                  │                                  │
//! │  ┌───────────────────────────────▼───────────────────────────────┐  │
//! │  │                tunai-service (orchestration)                  │  │
//! │  │    quota guard ─► AI detector ─► admit ─► formatted response  │  │
//! │  └───────────────────────────────┬───────────────────────────────┘  │
//! │                                  │                                  │
//! │  ┌───────────────────────────────▼───────────────────────────────┐  │
//! │  │               ★ tunai-core (THIS CRATE) ★                     │  │
//! │  │                                                               │  │
//! │  │  ┌──────────┐ ┌────────────┐ ┌─────────┐ ┌───────┐           │  │
//! │  │  │  money   │ │denomination│ │ session │ │ quota │           │  │
//! │  │  │  Rupiah  │ │ fixed set  │ │aggregate│ │ plans │           │  │
//! │  │  └──────────┘ └────────────┘ └─────────┘ └───────┘           │  │
//! │  │                                                               │  │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS          │  │
//! │  └───────────────────────────────┬───────────────────────────────┘  │
//! │                                  │                                  │
//! │  ┌───────────────────────────────▼───────────────────────────────┐  │
//! │  │                 tunai-db (persistence layer)                  │  │
//! │  │        SQLite queries, migrations, repositories               │  │
//! │  └───────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - The `Rupiah` amount type with Indonesian renderings
//! - [`denomination`] - The fixed banknote set
//! - [`detection`] - Detector boundary types and history records
//! - [`session`] - The calculation-session aggregate
//! - [`quota`] - Subscription plans and scan-quota policy
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: every function is deterministic over its inputs
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: all amounts are whole rupiah (i64), never floats
//! 4. **Explicit Errors**: all errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use tunai_core::detection::DetectionEvent;
//! use tunai_core::session::CalculationSession;
//!
//! let mut session = CalculationSession::new("user-1");
//! session.admit(&DetectionEvent::new(50_000, 93.0, "lima puluh ribu rupiah"))?;
//! session.admit(&DetectionEvent::new(20_000, 88.5, "dua puluh ribu rupiah"))?;
//!
//! let summary = session.summary();
//! assert_eq!(summary.total_amount, 70_000);
//! assert_eq!(summary.total_formatted, "Rp 70.000");
//! # Ok::<(), tunai_core::CoreError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod denomination;
pub mod detection;
pub mod error;
pub mod money;
pub mod quota;
pub mod session;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use tunai_core::Rupiah` instead of
// `use tunai_core::money::Rupiah`

pub use denomination::Denomination;
pub use detection::{DetectionEvent, OperationKind, ScanRecord};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Rupiah;
pub use quota::{DeniedReason, Plan, QuotaDecision, Subscription};
pub use session::{CalculationSession, DenominationTally, SessionSummary, TallySummary};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Daily detector-call allowance on the free plan.
///
/// Paid plans are unmetered while active; lapsed paid plans fall back to
/// this limit.
pub const DEFAULT_DAILY_SCAN_LIMIT: i64 = 10;

/// Maximum length of a session note, in characters.
pub const MAX_NOTE_LENGTH: usize = 500;

/// Upper bound for a history page size.
pub const MAX_HISTORY_PAGE_SIZE: i64 = 100;
