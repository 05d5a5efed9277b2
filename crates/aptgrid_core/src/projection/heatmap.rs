//! Heatmap projection with hover summaries.

use crate::model::unit::{Floor, Unit, UnitRef};
use crate::store::occupancy::OccupancyStore;

const FREE_TOOLTIP: &str = "free";

#[derive(Debug, Clone, PartialEq)]
pub struct HeatCell {
    pub unit: UnitRef,
    pub display_number: String,
    pub occupied: bool,
    pub tooltip: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HeatmapView {
    pub cells: Vec<HeatCell>,
}

impl HeatmapView {
    /// Cells of one floor, in unit order.
    pub fn floor_cells(&self, floor: Floor) -> impl Iterator<Item = &HeatCell> {
        self.cells.iter().filter(move |cell| cell.unit.floor() == floor)
    }

    /// Share of occupied units on one floor, `0.0..=1.0`.
    pub fn floor_density(&self, floor: Floor) -> f64 {
        let (occupied, total) = self
            .floor_cells(floor)
            .fold((0usize, 0usize), |(occupied, total), cell| {
                (occupied + usize::from(cell.occupied), total + 1)
            });
        if total == 0 {
            0.0
        } else {
            occupied as f64 / total as f64
        }
    }
}

/// Occupant and area, or `free`.
pub fn tooltip(unit: &Unit) -> String {
    let Some(record) = unit.occupancy.as_ref() else {
        return FREE_TOOLTIP.to_string();
    };
    let owner = if record.owner.trim().is_empty() {
        "occupied"
    } else {
        record.owner.as_str()
    };
    match &record.area {
        Some(area) => format!("{owner}, {area} m²"),
        None => owner.to_string(),
    }
}

pub fn project_heatmap(store: &OccupancyStore) -> HeatmapView {
    let cells = store
        .units()
        .map(|unit| HeatCell {
            unit: unit.at,
            display_number: unit.at.display_number(),
            occupied: unit.is_occupied(),
            tooltip: tooltip(&unit),
        })
        .collect();

    HeatmapView { cells }
}
