//! # tunai-db: Database Layer for Scan Tunai
//!
//! This crate provides database access for the Scan Tunai system.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Scan Tunai Data Flow                           │
//! │                                                                     │
//! │  ScanService operation (add_to_session)                             │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  ┌───────────────────────────────────────────────────────────────┐  │
//! │  │                    tunai-db (THIS CRATE)                      │  │
//! │  │                                                               │  │
//! │  │  ┌─────────────┐   ┌────────────────┐   ┌──────────────┐     │  │
//! │  │  │  Database   │   │  Repositories  │   │  Migrations  │     │  │
//! │  │  │  (pool.rs)  │   │ session.rs     │   │  (embedded)  │     │  │
//! │  │  │             │◄──│ history.rs     │   │ 001_init.sql │     │  │
//! │  │  │ SqlitePool  │   │ subscription.rs│   │              │     │  │
//! │  │  └─────────────┘   └────────────────┘   └──────────────┘     │  │
//! │  └───────────────────────────────────────────────────────────────┘  │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  SQLite database file (WAL mode)                                    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tunai_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/tunai.db")).await?;
//!
//! let session = db.sessions().create_session("user-1").await?;
//! let (updated, denomination) =
//!     db.sessions().admit_event(session.id(), "user-1", &event).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::history::ScanHistoryRepository;
pub use repository::session::SessionRepository;
pub use repository::subscription::SubscriptionRepository;
