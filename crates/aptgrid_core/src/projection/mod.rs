//! Derived, read-only views over the occupancy store.
//!
//! # Responsibility
//! - Build the grid, cards, list and heatmap view models on demand.
//! - Cache each built projection and keep its filter state.
//!
//! # Invariants
//! - Every projection is a pure function of the store (+ filter state).
//! - A cached projection is never rebuilt; filter changes only re-evaluate
//!   visibility on the cached view.
//! - Filter changes made before a projection exists are applied when it is
//!   built.

pub mod cards;
pub mod filter;
pub mod grid;
pub mod heatmap;
pub mod list;

use crate::model::tab::{Tab, TAB_COUNT};
use crate::model::unit::Floor;
use crate::store::occupancy::OccupancyStore;
use crate::tabs::session::TabMaterializer;
use cards::{project_cards, CardsView};
use filter::{FilterState, StatusFilter};
use grid::{project_grid, GridView};
use heatmap::{project_heatmap, HeatmapView};
use list::{project_list, ListView};
use log::debug;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

pub struct ViewProjector {
    store: Arc<OccupancyStore>,
    grid: Option<GridView>,
    cards: Option<CardsView>,
    list: Option<ListView>,
    heatmap: Option<HeatmapView>,
    cards_query: String,
    list_filter: FilterState,
    collapsed_floors: BTreeSet<Floor>,
    materializations: [u32; TAB_COUNT],
}

impl ViewProjector {
    pub fn new(store: Arc<OccupancyStore>) -> Self {
        Self {
            store,
            grid: None,
            cards: None,
            list: None,
            heatmap: None,
            cards_query: String::new(),
            list_filter: FilterState::default(),
            collapsed_floors: BTreeSet::new(),
            materializations: [0; TAB_COUNT],
        }
    }

    pub fn store(&self) -> &OccupancyStore {
        &self.store
    }

    /// Drops every cached projection and filter; build counters are kept.
    pub fn reset(&mut self) {
        self.grid = None;
        self.cards = None;
        self.list = None;
        self.heatmap = None;
        self.cards_query.clear();
        self.list_filter = FilterState::default();
        self.collapsed_floors.clear();
    }

    /// Builds the projection for `tab` unless it is already cached.
    ///
    /// Returns `true` when this call built it.
    pub fn ensure(&mut self, tab: Tab) -> bool {
        if self.is_materialized(tab) {
            return false;
        }

        let started_at = Instant::now();
        match tab {
            Tab::Grid => self.grid = Some(project_grid(&self.store)),
            Tab::Cards => {
                let mut view = project_cards(&self.store);
                view.set_search(&self.cards_query);
                self.cards = Some(view);
            }
            Tab::List => {
                let mut view = project_list(&self.store);
                view.apply_filter(self.list_filter.clone());
                for floor in &self.collapsed_floors {
                    view.set_collapsed(*floor, true);
                }
                self.list = Some(view);
            }
            Tab::Heatmap => self.heatmap = Some(project_heatmap(&self.store)),
        }
        self.materializations[tab.index()] += 1;
        debug!(
            "event=projection_build module=projection status=ok tab={tab} duration_us={}",
            started_at.elapsed().as_micros()
        );
        true
    }

    pub fn is_materialized(&self, tab: Tab) -> bool {
        match tab {
            Tab::Grid => self.grid.is_some(),
            Tab::Cards => self.cards.is_some(),
            Tab::List => self.list.is_some(),
            Tab::Heatmap => self.heatmap.is_some(),
        }
    }

    /// How many times `tab` has been built by this projector.
    pub fn materialization_count(&self, tab: Tab) -> u32 {
        self.materializations[tab.index()]
    }

    pub fn grid(&self) -> Option<&GridView> {
        self.grid.as_ref()
    }

    pub fn cards(&self) -> Option<&CardsView> {
        self.cards.as_ref()
    }

    pub fn list(&self) -> Option<&ListView> {
        self.list.as_ref()
    }

    pub fn heatmap(&self) -> Option<&HeatmapView> {
        self.heatmap.as_ref()
    }

    /// Search text for the cards projection.
    pub fn set_cards_search(&mut self, raw: &str) {
        self.cards_query = raw.to_string();
        if let Some(cards) = self.cards.as_mut() {
            cards.set_search(raw);
        }
    }

    /// Search text for the list projection; keeps its status filter.
    pub fn set_list_search(&mut self, raw: &str) {
        self.list_filter = self.list_filter.clone().with_query(raw);
        self.refilter_list();
    }

    pub fn set_list_status(&mut self, status: StatusFilter) {
        self.list_filter = self.list_filter.clone().with_status(status);
        self.refilter_list();
    }

    pub fn list_filter(&self) -> &FilterState {
        &self.list_filter
    }

    /// Flips a list group's collapse flag; returns the new state.
    pub fn toggle_group(&mut self, floor: Floor) -> bool {
        let collapsed = !self.collapsed_floors.contains(&floor);
        if collapsed {
            self.collapsed_floors.insert(floor);
        } else {
            self.collapsed_floors.remove(&floor);
        }
        if let Some(list) = self.list.as_mut() {
            list.set_collapsed(floor, collapsed);
        }
        collapsed
    }

    fn refilter_list(&mut self) {
        if let Some(list) = self.list.as_mut() {
            list.apply_filter(self.list_filter.clone());
        }
    }
}

impl TabMaterializer for ViewProjector {
    fn materialize(&mut self, tab: Tab) {
        self.ensure(tab);
    }
}

#[cfg(test)]
mod tests {
    use super::ViewProjector;
    use crate::model::tab::Tab;
    use crate::model::unit::Floor;
    use crate::projection::filter::StatusFilter;
    use crate::store::occupancy::OccupancyStore;
    use std::sync::Arc;

    fn projector() -> ViewProjector {
        let (store, _) =
            OccupancyStore::parse(r#"{"2": {"3": {"owner": "Sidorova", "area": 48}}}"#)
                .expect("test dataset should parse");
        ViewProjector::new(Arc::new(store))
    }

    #[test]
    fn ensure_builds_each_tab_once() {
        let mut projector = projector();
        assert!(projector.ensure(Tab::Heatmap));
        assert!(!projector.ensure(Tab::Heatmap));
        assert_eq!(projector.materialization_count(Tab::Heatmap), 1);
        assert_eq!(projector.materialization_count(Tab::Grid), 0);
        assert!(projector.grid().is_none());
    }

    #[test]
    fn filters_set_before_build_are_applied_on_build() {
        let mut projector = projector();
        projector.set_list_status(StatusFilter::Occupied);
        projector.set_cards_search("sidorova");
        projector.toggle_group(Floor::GROUND);

        projector.ensure(Tab::List);
        projector.ensure(Tab::Cards);

        let list = projector.list().expect("list should be built");
        assert_eq!(list.visible_count(), 1);
        assert!(list.groups()[0].collapsed);
        let cards = projector.cards().expect("cards should be built");
        assert_eq!(cards.visible_count(), 1);
    }

    #[test]
    fn refilter_does_not_rebuild() {
        let mut projector = projector();
        projector.ensure(Tab::List);
        projector.set_list_search("2-3");
        projector.set_list_status(StatusFilter::Free);
        projector.set_list_status(StatusFilter::All);

        assert_eq!(projector.materialization_count(Tab::List), 1);
        let list = projector.list().expect("list should be built");
        assert_eq!(list.visible_count(), 1);
    }

    #[test]
    fn reset_drops_caches_and_filters() {
        let mut projector = projector();
        projector.set_list_status(StatusFilter::Occupied);
        projector.toggle_group(Floor::GROUND);
        projector.ensure(Tab::List);

        projector.reset();
        assert!(!projector.is_materialized(Tab::List));
        assert!(projector.list_filter().is_reset());

        assert!(projector.ensure(Tab::List));
        assert_eq!(projector.materialization_count(Tab::List), 2);
        let list = projector.list().expect("list should be rebuilt");
        assert_eq!(list.visible_count(), 140);
        assert!(!list.groups()[0].collapsed);
    }
}
