//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store, projections, tabs and selection into session-level
//!   APIs.
//! - Keep FFI/CLI layers decoupled from component wiring.

pub mod board_service;
