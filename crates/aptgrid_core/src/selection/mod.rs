//! Unit selection, confirmation and action emission.
//!
//! # Responsibility
//! - Track the single selected unit and its confirmation state.
//! - Encode the selection into the outbound action message.
//! - Drive host prompts through the [`host::HostChannel`] seam.
//!
//! # Invariants
//! - Never more than one live selection.
//! - Action payloads are a deterministic function of the selection.

pub mod action;
pub mod controller;
pub mod host;
pub mod prompt;

use crate::model::unit::{Area, Unit, UnitRef};

/// Snapshot of the selected unit taken at click time.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub unit: UnitRef,
    pub occupied: bool,
    pub owner: Option<String>,
    /// Dataset text, echoed unchanged in outbound actions.
    pub area: Option<Area>,
    pub block: Option<String>,
    pub client_id: Option<String>,
}

impl From<Unit> for Selection {
    fn from(unit: Unit) -> Self {
        let occupied = unit.is_occupied();
        match unit.occupancy {
            Some(record) => Self {
                unit: unit.at,
                occupied,
                owner: Some(record.owner),
                area: record.area,
                block: record.block,
                client_id: record.client_id,
            },
            None => Self {
                unit: unit.at,
                occupied,
                owner: None,
                area: None,
                block: None,
                client_id: None,
            },
        }
    }
}
