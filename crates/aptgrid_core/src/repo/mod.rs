//! Repository layer for session-scoped persistence.
//!
//! # Responsibility
//! - Define the key/value contract UI state persists through.
//! - Isolate SQLite details from tab and board orchestration.
//!
//! # Invariants
//! - Nothing stored here outlives the host session it was written in.

pub mod session_repo;
