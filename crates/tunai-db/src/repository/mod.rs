//! # Repository Module
//!
//! Database repository implementations for Scan Tunai.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                     │
//! │                                                                     │
//! │  The Repository pattern abstracts database access behind a clean    │
//! │  API. Service operations never see SQL:                             │
//! │                                                                     │
//! │  ScanService                                                        │
//! │       │  db.sessions().admit_event(id, owner, &event)               │
//! │       ▼                                                             │
//! │  SessionRepository                                                  │
//! │  ├── create_session(&self, owner)                                   │
//! │  ├── get_by_id(&self, id, owner)                                    │
//! │  ├── admit_event(&self, id, owner, event)                           │
//! │  └── finalize(&self, id, owner, note)                               │
//! │       │  SQL                                                        │
//! │       ▼                                                             │
//! │  SQLite Database                                                    │
//! │                                                                     │
//! │  Benefits:                                                          │
//! │  • SQL is isolated in one place                                     │
//! │  • Easy to test against an in-memory database                       │
//! │  • Transaction boundaries are explicit                              │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`session::SessionRepository`] - session lifecycle + the atomic admit
//! - [`history::ScanHistoryRepository`] - per-event history records
//! - [`subscription::SubscriptionRepository`] - plans + daily quota

pub mod history;
pub mod session;
pub mod subscription;
