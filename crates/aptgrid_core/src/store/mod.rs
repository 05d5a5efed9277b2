//! Occupancy data loading and lookup.
//!
//! # Responsibility
//! - Retrieve the session dataset from its source.
//! - Hold the read-only occupancy mapping all projections derive from.
//!
//! # Invariants
//! - The dataset is fetched once per session and never mutated afterwards.
//! - Unavailable data degrades to "all units free" instead of failing.

pub mod occupancy;
pub mod source;
