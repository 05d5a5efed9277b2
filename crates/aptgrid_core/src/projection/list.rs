//! Grouped, collapsible list projection.
//!
//! # Responsibility
//! - Group units by floor in grid order with per-floor occupancy counts.
//! - Apply [`FilterState`] to item visibility.
//! - Track per-group collapse state.
//!
//! # Invariants
//! - Collapse state is presentation only; it never changes visibility or
//!   counts.
//! - Re-filtering is idempotent: the same filter always yields the same
//!   visibility, and the reset filter yields the unfiltered baseline.

use crate::model::unit::{Floor, Unit, UnitRef, UNITS_PER_FLOOR};
use crate::projection::filter::{FilterState, SearchKey};
use crate::store::occupancy::OccupancyStore;

#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub unit: UnitRef,
    pub display_number: String,
    pub occupied: bool,
    pub owner: Option<String>,
    pub visible: bool,
    search_key: SearchKey,
}

impl ListItem {
    fn from_unit(unit: &Unit) -> Self {
        let display_number = unit.at.display_number();
        Self {
            unit: unit.at,
            search_key: SearchKey::new(&display_number, unit.owner()),
            display_number,
            occupied: unit.is_occupied(),
            owner: unit.owner().map(str::to_string),
            visible: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListGroup {
    pub floor: Floor,
    pub occupied_count: usize,
    pub total_count: usize,
    pub collapsed: bool,
    pub items: Vec<ListItem>,
}

impl ListGroup {
    pub fn visible_count(&self) -> usize {
        self.items.iter().filter(|item| item.visible).count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListView {
    groups: Vec<ListGroup>,
    filter: FilterState,
}

impl ListView {
    pub fn groups(&self) -> &[ListGroup] {
        &self.groups
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn visible_count(&self) -> usize {
        self.groups.iter().map(ListGroup::visible_count).sum()
    }

    /// Visibility flags in grid order, one per unit.
    pub fn visibility(&self) -> Vec<bool> {
        self.groups
            .iter()
            .flat_map(|group| group.items.iter().map(|item| item.visible))
            .collect()
    }

    /// Replaces the active filter and recomputes visibility.
    pub fn apply_filter(&mut self, filter: FilterState) {
        for group in &mut self.groups {
            for item in &mut group.items {
                item.visible = filter.matches(&item.search_key, item.occupied);
            }
        }
        self.filter = filter;
    }

    /// Returns `false` when no group exists for `floor`.
    pub fn set_collapsed(&mut self, floor: Floor, collapsed: bool) -> bool {
        match self.groups.iter_mut().find(|group| group.floor == floor) {
            Some(group) => {
                group.collapsed = collapsed;
                true
            }
            None => false,
        }
    }
}

pub fn project_list(store: &OccupancyStore) -> ListView {
    let groups = Floor::all()
        .map(|floor| {
            let items = (1..=u32::from(UNITS_PER_FLOOR))
                .filter_map(|number| UnitRef::new(floor, number).ok())
                .map(|at| ListItem::from_unit(&store.unit_at(at)))
                .collect::<Vec<_>>();
            ListGroup {
                floor,
                occupied_count: store.occupied_on(floor),
                total_count: items.len(),
                collapsed: false,
                items,
            }
        })
        .collect();

    ListView {
        groups,
        filter: FilterState::default(),
    }
}
