//! Building domain model shared by every projection.
//!
//! # Responsibility
//! - Define canonical unit coordinates and occupancy records.
//! - Keep one unit shape for grid/cards/list/heatmap projections.
//!
//! # Invariants
//! - Every unit is identified by a validated `(floor, number)` pair.
//! - Occupancy is represented by the presence of a record, never a flag alone.

pub mod tab;
pub mod unit;
