//! Status filter and text search shared by the cards and list projections.
//!
//! # Invariants
//! - Filtering only decides visibility; it never touches the store.
//! - Status filter and search text apply conjunctively.
//! - An empty normalized query matches every unit.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Occupancy status filter for the list projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Occupied,
    Free,
}

impl StatusFilter {
    pub fn matches(self, occupied: bool) -> bool {
        match self {
            Self::All => true,
            Self::Occupied => occupied,
            Self::Free => !occupied,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Occupied => "occupied",
            Self::Free => "free",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "occupied" => Some(Self::Occupied),
            "free" => Some(Self::Free),
            _ => None,
        }
    }
}

/// Combined visibility filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub status: StatusFilter,
    query: String,
}

impl FilterState {
    pub fn new(status: StatusFilter, query: &str) -> Self {
        Self {
            status,
            query: normalize_query(query),
        }
    }

    /// Replaces the search text, keeping the status filter.
    pub fn with_query(mut self, query: &str) -> Self {
        self.query = normalize_query(query);
        self
    }

    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    /// Normalized search text.
    pub fn query(&self) -> &str {
        self.query.as_str()
    }

    pub fn is_reset(&self) -> bool {
        self.status == StatusFilter::All && self.query.is_empty()
    }

    pub fn matches(&self, key: &SearchKey, occupied: bool) -> bool {
        self.status.matches(occupied) && key.matches(&self.query)
    }
}

/// Precomputed lowercase haystack for one unit.
///
/// Built once at materialization so re-filtering never goes back to the
/// store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchKey {
    display_number: String,
    owner: Option<String>,
}

impl SearchKey {
    pub fn new(display_number: &str, owner: Option<&str>) -> Self {
        Self {
            display_number: display_number.to_lowercase(),
            owner: owner
                .map(str::to_lowercase)
                .filter(|value| !value.trim().is_empty()),
        }
    }

    /// `normalized_query` must come from [`normalize_query`].
    pub fn matches(&self, normalized_query: &str) -> bool {
        if normalized_query.is_empty() {
            return true;
        }
        self.display_number.contains(normalized_query)
            || self
                .owner
                .as_deref()
                .is_some_and(|owner| owner.contains(normalized_query))
    }
}

/// Trims, lowercases and collapses inner whitespace.
pub fn normalize_query(raw: &str) -> String {
    WHITESPACE_RE
        .replace_all(raw.trim(), " ")
        .to_lowercase()
}
