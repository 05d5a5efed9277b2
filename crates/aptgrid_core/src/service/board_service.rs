//! Board use-case service: one object per host session.
//!
//! # Responsibility
//! - Wire the occupancy store, projections, tab session and selection
//!   controller together behind use-case level calls.
//! - Translate user interactions into host effects.
//!
//! # Invariants
//! - Constructed only after the host trust gate passed.
//! - The store is fully loaded before any projection is built.
//! - All state is owned by this object and dropped with it.

use crate::model::tab::Tab;
use crate::model::unit::{Floor, UnitRef, UnitRefError};
use crate::projection::cards::CardsView;
use crate::projection::filter::StatusFilter;
use crate::projection::grid::GridView;
use crate::projection::heatmap::HeatmapView;
use crate::projection::list::ListView;
use crate::projection::ViewProjector;
use crate::repo::session_repo::SessionStorage;
use crate::selection::action::{ActionMessage, EmittedSelection, OutboundAction};
use crate::selection::controller::{SelectionController, SelectionError};
use crate::selection::host::{HapticStyle, HostChannel};
use crate::selection::prompt::{prompt_for, NO_SELECTION_ALERT};
use crate::selection::Selection;
use crate::store::occupancy::{LoadOutcome, OccupancyStore};
use crate::store::source::DatasetSource;
use crate::tabs::session::{TabActivation, TabSession};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Session storage key holding the last emitted selection as JSON.
pub const SELECTED_APARTMENT_KEY: &str = "selectedApartment";

#[derive(Debug)]
pub enum BoardError {
    /// Host trust gate did not pass.
    Unauthorized,
    InvalidUnit(UnitRefError),
    Selection(SelectionError),
}

impl Display for BoardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized => write!(f, "host session is not authorized"),
            Self::InvalidUnit(err) => write!(f, "{err}"),
            Self::Selection(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BoardError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unauthorized => None,
            Self::InvalidUnit(err) => Some(err),
            Self::Selection(err) => Some(err),
        }
    }
}

impl From<UnitRefError> for BoardError {
    fn from(value: UnitRefError) -> Self {
        Self::InvalidUnit(value)
    }
}

impl From<SelectionError> for BoardError {
    fn from(value: SelectionError) -> Self {
        Self::Selection(value)
    }
}

/// Building-wide counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardStats {
    pub total: usize,
    pub occupied: usize,
    pub free: usize,
}

pub struct BoardService<S: SessionStorage> {
    store: Arc<OccupancyStore>,
    load_outcome: LoadOutcome,
    projector: ViewProjector,
    selection: SelectionController,
    tabs: TabSession<S>,
    bot_username: Option<String>,
}

impl<S: SessionStorage> BoardService<S> {
    /// Starts a session: trust gate, dataset load, tab restore.
    ///
    /// # Errors
    /// - Returns [`BoardError::Unauthorized`] when `authorized` is false.
    ///   Dataset failures are not errors; they yield an all-free board.
    pub fn start(
        authorized: bool,
        source: &dyn DatasetSource,
        storage: S,
        bot_username: Option<String>,
    ) -> Result<Self, BoardError> {
        if !authorized {
            warn!("event=board_start module=service status=rejected reason=unauthorized");
            return Err(BoardError::Unauthorized);
        }

        let (store, outcome) = OccupancyStore::load_with_outcome(source);
        let board = Self::with_store(store, outcome, storage, bot_username);
        info!(
            "event=board_start module=service status=ok tab={} degraded={}",
            board.active_tab(),
            board.load_outcome.is_degraded()
        );
        Ok(board)
    }

    /// Builds a session over an already loaded store.
    pub fn with_store(
        store: OccupancyStore,
        load_outcome: LoadOutcome,
        storage: S,
        bot_username: Option<String>,
    ) -> Self {
        let store = Arc::new(store);
        let mut board = Self {
            projector: ViewProjector::new(Arc::clone(&store)),
            selection: SelectionController::new(Arc::clone(&store)),
            tabs: TabSession::new(storage),
            store,
            load_outcome,
            bot_username,
        };
        let restored = board.tabs.restore();
        board.tabs.activate(restored, &mut board.projector);
        board
    }

    pub fn stats(&self) -> BoardStats {
        BoardStats {
            total: self.store.total_units(),
            occupied: self.store.occupied_count(),
            free: self.store.free_count(),
        }
    }

    pub fn store(&self) -> &OccupancyStore {
        &self.store
    }

    pub fn load_outcome(&self) -> &LoadOutcome {
        &self.load_outcome
    }

    pub fn active_tab(&self) -> Tab {
        self.tabs.active()
    }

    pub fn activate_tab(&mut self, tab: Tab) -> TabActivation {
        self.tabs.activate(tab, &mut self.projector)
    }

    pub fn tab_storage(&self) -> &S {
        self.tabs.storage()
    }

    pub fn projector(&self) -> &ViewProjector {
        &self.projector
    }

    /// `None` until the grid tab was first activated.
    pub fn grid(&self) -> Option<&GridView> {
        self.projector.grid()
    }

    pub fn cards(&self) -> Option<&CardsView> {
        self.projector.cards()
    }

    pub fn list(&self) -> Option<&ListView> {
        self.projector.list()
    }

    pub fn heatmap(&self) -> Option<&HeatmapView> {
        self.projector.heatmap()
    }

    pub fn set_cards_search(&mut self, query: &str) {
        self.projector.set_cards_search(query);
    }

    pub fn set_list_search(&mut self, query: &str) {
        self.projector.set_list_search(query);
    }

    pub fn set_status_filter(&mut self, status: StatusFilter) {
        self.projector.set_list_status(status);
    }

    pub fn toggle_group(&mut self, floor: Floor) -> bool {
        self.projector.toggle_group(floor)
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    /// Handles a click on a unit cell in any projection.
    ///
    /// # Side effects
    /// - Shows the unit popup, offers the matching main-button action and
    ///   triggers a medium haptic impact.
    pub fn click_unit(
        &mut self,
        floor_label: &str,
        number: u32,
        host: &mut dyn HostChannel,
    ) -> Result<Selection, BoardError> {
        let at = UnitRef::parse(floor_label, number)?;
        let selection = self.selection.select(at);
        let prompt = prompt_for(&selection);
        host.show_popup(&prompt);
        host.set_main_button(Some(&prompt.button_label));
        host.haptic_impact(HapticStyle::Medium);
        Ok(selection)
    }

    pub fn build_action_payload(&self) -> Result<ActionMessage, BoardError> {
        Ok(self.selection.build_action_payload()?)
    }

    /// First half of a confirm-then-emit flow.
    pub fn confirm(&mut self, host: &mut dyn HostChannel) -> Result<ActionMessage, BoardError> {
        self.selection.confirm().map_err(|err| {
            if err == SelectionError::NoSelection {
                host.show_alert(NO_SELECTION_ALERT);
            }
            BoardError::from(err)
        })
    }

    /// Second half: sends the confirmed action and records it in session
    /// storage under [`SELECTED_APARTMENT_KEY`].
    pub fn emit(&mut self, host: &mut dyn HostChannel) -> Result<OutboundAction, BoardError> {
        let outbound = self.selection.emit(host, self.bot_username.as_deref())?;
        self.remember_emitted(&outbound.emitted);
        Ok(outbound)
    }

    /// Last action emitted in this session, if any.
    pub fn last_emitted(&self) -> Option<EmittedSelection> {
        let raw = match self.tabs.storage().get(SELECTED_APARTMENT_KEY) {
            Ok(raw) => raw?,
            Err(err) => {
                warn!("event=emitted_read module=service status=error error={err}");
                return None;
            }
        };
        match EmittedSelection::from_json(&raw) {
            Ok(emitted) => Some(emitted),
            Err(err) => {
                warn!("event=emitted_read module=service status=invalid error={err}");
                None
            }
        }
    }

    fn remember_emitted(&mut self, emitted: &EmittedSelection) {
        let json = match emitted.to_json() {
            Ok(json) => json,
            Err(err) => {
                warn!("event=emitted_persist module=service status=error error={err}");
                return;
            }
        };
        if let Err(err) = self.tabs.storage_mut().set(SELECTED_APARTMENT_KEY, &json) {
            warn!("event=emitted_persist module=service status=error error={err}");
        }
    }

    /// Main-button press: confirm and emit in one step.
    pub fn press_main_button(
        &mut self,
        host: &mut dyn HostChannel,
    ) -> Result<OutboundAction, BoardError> {
        self.confirm(host)?;
        self.emit(host)
    }

    /// Abandons the pending selection and hides the main button.
    pub fn cancel(&mut self, host: &mut dyn HostChannel) {
        self.selection.cancel();
        host.set_main_button(None);
    }

    /// Session teardown: drops the selection, cached projections and
    /// session-scoped storage.
    pub fn end(&mut self) {
        if let Some(selection) = self.selection.current_selection() {
            info!(
                "event=board_end module=service status=ok pending_unit={}",
                selection.unit
            );
        } else {
            info!("event=board_end module=service status=ok");
        }
        self.selection.clear_selection();
        self.projector.reset();
        self.tabs.end();
    }
}
