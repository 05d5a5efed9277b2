//! Core domain logic for the apartment occupancy board.
//! Hosts (FFI, CLI) stay thin; every board rule lives here.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod projection;
pub mod repo;
pub mod selection;
pub mod service;
pub mod store;
pub mod tabs;

pub use config::BoardConfig;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::tab::Tab;
pub use model::unit::{Area, Floor, OccupancyRecord, Unit, UnitRef, UnitRefError, UNITS_PER_FLOOR};
pub use projection::filter::{FilterState, StatusFilter};
pub use projection::ViewProjector;
pub use repo::session_repo::{
    MemorySessionStorage, SessionStorage, SqliteSessionStorage, StorageError, StorageResult,
};
pub use selection::action::{ActionKind, ActionMessage, EmittedSelection, OutboundAction};
pub use selection::controller::{ConfirmationState, SelectionController, SelectionError};
pub use selection::host::{EffectQueue, HapticStyle, HostChannel, HostEffect};
pub use selection::Selection;
pub use service::board_service::{BoardError, BoardService, BoardStats, SELECTED_APARTMENT_KEY};
pub use store::occupancy::{DatasetError, LoadOutcome, OccupancyStore};
pub use store::source::{DatasetLocation, DatasetSource, FileSource, HttpSource, InlineSource};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
