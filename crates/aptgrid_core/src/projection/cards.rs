//! Card projection: occupied units first, searchable.
//!
//! # Invariants
//! - Ordering is a stable partition of grid order: occupied before free,
//!   floor/number order preserved inside each group.
//! - Search only flips `visible`; card order never changes after build.

use crate::model::unit::{Area, Unit, UnitRef};
use crate::projection::filter::{normalize_query, SearchKey};
use crate::store::occupancy::OccupancyStore;

#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub unit: UnitRef,
    pub display_number: String,
    pub occupied: bool,
    pub owner: Option<String>,
    pub area: Option<Area>,
    pub block: Option<String>,
    pub visible: bool,
    search_key: SearchKey,
}

impl Card {
    fn from_unit(unit: &Unit) -> Self {
        let display_number = unit.at.display_number();
        let record = unit.occupancy.as_ref();
        Self {
            unit: unit.at,
            search_key: SearchKey::new(&display_number, unit.owner()),
            display_number,
            occupied: unit.is_occupied(),
            owner: record.map(|record| record.owner.clone()),
            area: record.and_then(|record| record.area.clone()),
            block: record.and_then(|record| record.block.clone()),
            visible: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardsView {
    cards: Vec<Card>,
    query: String,
}

impl CardsView {
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn visible(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter().filter(|card| card.visible)
    }

    pub fn visible_count(&self) -> usize {
        self.visible().count()
    }

    /// Normalized query currently applied.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Re-evaluates visibility for new search text.
    pub fn set_search(&mut self, raw: &str) {
        self.query = normalize_query(raw);
        for card in &mut self.cards {
            card.visible = card.search_key.matches(&self.query);
        }
    }
}

pub fn project_cards(store: &OccupancyStore) -> CardsView {
    let mut cards = store
        .units()
        .map(|unit| Card::from_unit(&unit))
        .collect::<Vec<_>>();
    // `sort_by_key` is stable, which keeps grid order inside each group.
    cards.sort_by_key(|card| !card.occupied);

    CardsView {
        cards,
        query: String::new(),
    }
}
