//! Presentation tabs.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const TAB_COUNT: usize = 4;

/// One of the four projections a user can switch between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    #[default]
    Grid,
    Cards,
    List,
    Heatmap,
}

impl Tab {
    pub const ALL: [Tab; TAB_COUNT] = [Tab::Grid, Tab::Cards, Tab::List, Tab::Heatmap];

    /// Stable label used for session persistence and the host API.
    pub fn label(self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::Cards => "cards",
            Self::List => "list",
            Self::Heatmap => "heatmap",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value.trim() {
            "grid" => Some(Self::Grid),
            "cards" => Some(Self::Cards),
            "list" => Some(Self::List),
            "heatmap" => Some(Self::Heatmap),
            _ => None,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Grid => 0,
            Self::Cards => 1,
            Self::List => 2,
            Self::Heatmap => 3,
        }
    }
}

impl Display for Tab {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
