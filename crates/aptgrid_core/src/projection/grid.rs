//! Floor-by-floor table projection.

use crate::model::unit::{Floor, Unit, UnitRef};
use crate::store::occupancy::OccupancyStore;

/// One cell of the classic table.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    pub unit: UnitRef,
    pub display_number: String,
    pub occupied: bool,
    pub owner: Option<String>,
}

impl From<&Unit> for GridCell {
    fn from(unit: &Unit) -> Self {
        Self {
            unit: unit.at,
            display_number: unit.at.display_number(),
            occupied: unit.is_occupied(),
            owner: unit
                .owner()
                .filter(|owner| !owner.is_empty())
                .map(str::to_string),
        }
    }
}

/// One table row per floor.
#[derive(Debug, Clone, PartialEq)]
pub struct GridRow {
    pub floor: Floor,
    pub cells: Vec<GridCell>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridView {
    pub rows: Vec<GridRow>,
}

impl GridView {
    /// All cells in grid order.
    pub fn cells(&self) -> impl Iterator<Item = &GridCell> {
        self.rows.iter().flat_map(|row| row.cells.iter())
    }

    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(|row| row.cells.len()).sum()
    }
}

/// Ground floor first, then ascending floors; units ascending. No filtering.
pub fn project_grid(store: &OccupancyStore) -> GridView {
    let mut rows: Vec<GridRow> = Floor::all()
        .map(|floor| GridRow {
            floor,
            cells: Vec::new(),
        })
        .collect();

    for unit in store.units() {
        // `units()` walks floors in the same order as `Floor::all()`.
        if let Some(row) = rows.iter_mut().find(|row| row.floor == unit.at.floor()) {
            row.cells.push(GridCell::from(&unit));
        }
    }

    GridView { rows }
}
