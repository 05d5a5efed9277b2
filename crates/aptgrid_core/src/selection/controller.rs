//! Single-selection state machine.
//!
//! # Responsibility
//! - Own the one "currently selected unit" slot for a session.
//! - Gate the action flow `Idle -> Selected -> Confirmed -> Idle`.
//! - Build the outbound action and hand it to the host.
//!
//! # Invariants
//! - At most one selection is live; a new `Select` discards the previous
//!   one together with any pending confirmation.
//! - Every state change goes through [`SelectionController::apply`].
//! - A rejected event leaves the state untouched.

use crate::model::unit::UnitRef;
use crate::selection::action::{ActionKind, ActionMessage, OutboundAction};
use crate::selection::host::HostChannel;
use crate::selection::Selection;
use crate::store::occupancy::OccupancyStore;
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionError {
    /// An action was requested before any unit was selected.
    NoSelection,
    /// `Emit` arrived before the user confirmed the action.
    NotConfirmed,
}

impl Display for SelectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSelection => write!(f, "no unit is selected"),
            Self::NotConfirmed => write!(f, "action has not been confirmed"),
        }
    }
}

impl Error for SelectionError {}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConfirmationState {
    #[default]
    Idle,
    Selected(Selection),
    Confirmed(Selection),
}

impl ConfirmationState {
    pub fn selection(&self) -> Option<&Selection> {
        match self {
            Self::Idle => None,
            Self::Selected(selection) | Self::Confirmed(selection) => Some(selection),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Selected(_) => "selected",
            Self::Confirmed(_) => "confirmed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionEvent {
    Select(Selection),
    Confirm,
    Emit,
    Cancel,
    Clear,
}

/// What an accepted event did.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Selected(Selection),
    Confirmed(Selection),
    /// Left `Confirmed` for `Idle`; carries the emitted selection.
    Emitted(Selection),
    Reset,
    Unchanged,
}

/// Pure transition table.
fn step(
    state: &ConfirmationState,
    event: SelectionEvent,
) -> Result<(ConfirmationState, Transition), SelectionError> {
    use ConfirmationState::{Confirmed, Idle, Selected};

    match (state, event) {
        (_, SelectionEvent::Select(selection)) => {
            Ok((Selected(selection.clone()), Transition::Selected(selection)))
        }
        (Idle, SelectionEvent::Confirm) => Err(SelectionError::NoSelection),
        (Selected(selection), SelectionEvent::Confirm) => Ok((
            Confirmed(selection.clone()),
            Transition::Confirmed(selection.clone()),
        )),
        (Confirmed(_), SelectionEvent::Confirm) => Ok((state.clone(), Transition::Unchanged)),
        (Idle, SelectionEvent::Emit) => Err(SelectionError::NoSelection),
        (Selected(_), SelectionEvent::Emit) => Err(SelectionError::NotConfirmed),
        (Confirmed(selection), SelectionEvent::Emit) => {
            Ok((Idle, Transition::Emitted(selection.clone())))
        }
        (Idle, SelectionEvent::Cancel | SelectionEvent::Clear) => Ok((Idle, Transition::Unchanged)),
        (Selected(_) | Confirmed(_), SelectionEvent::Cancel | SelectionEvent::Clear) => {
            Ok((Idle, Transition::Reset))
        }
    }
}

pub struct SelectionController {
    store: Arc<OccupancyStore>,
    state: ConfirmationState,
}

impl SelectionController {
    pub fn new(store: Arc<OccupancyStore>) -> Self {
        Self {
            store,
            state: ConfirmationState::Idle,
        }
    }

    /// Applies one event; the only place state changes.
    pub fn apply(&mut self, event: SelectionEvent) -> Result<Transition, SelectionError> {
        let (next, transition) = step(&self.state, event)?;
        debug!(
            "event=selection_transition module=selection from={} to={}",
            self.state.label(),
            next.label()
        );
        self.state = next;
        Ok(transition)
    }

    /// Selects the unit at `at`, replacing any previous selection.
    pub fn select(&mut self, at: UnitRef) -> Selection {
        let selection = Selection::from(self.store.unit_at(at));
        let accepted = self.apply(SelectionEvent::Select(selection.clone()));
        debug_assert!(accepted.is_ok(), "select is accepted from every state");
        info!(
            "event=unit_select module=selection status=ok unit={at} occupied={}",
            selection.occupied
        );
        selection
    }

    pub fn current_selection(&self) -> Option<&Selection> {
        self.state.selection()
    }

    pub fn state(&self) -> &ConfirmationState {
        &self.state
    }

    /// Action offered to the user; only `Selected` has one.
    pub fn available_action(&self) -> Option<ActionKind> {
        match &self.state {
            ConfirmationState::Selected(selection) => {
                Some(ActionKind::for_occupancy(selection.occupied))
            }
            _ => None,
        }
    }

    /// Deterministic payload for the current selection.
    ///
    /// # Errors
    /// - Returns [`SelectionError::NoSelection`] when nothing is selected.
    pub fn build_action_payload(&self) -> Result<ActionMessage, SelectionError> {
        self.current_selection()
            .map(ActionMessage::for_selection)
            .ok_or(SelectionError::NoSelection)
    }

    /// User accepted the offered action.
    pub fn confirm(&mut self) -> Result<ActionMessage, SelectionError> {
        self.apply(SelectionEvent::Confirm)?;
        self.build_action_payload()
    }

    /// Sends the confirmed action to the host and returns to `Idle`.
    ///
    /// # Side effects
    /// - `send_data(callback)`, then `open_link(deep link)` when a bot is
    ///   configured, then `close()`.
    pub fn emit(
        &mut self,
        host: &mut dyn HostChannel,
        bot_username: Option<&str>,
    ) -> Result<OutboundAction, SelectionError> {
        let Transition::Emitted(selection) = self.apply(SelectionEvent::Emit)? else {
            return Err(SelectionError::NotConfirmed);
        };

        let outbound = OutboundAction::new(&selection, bot_username);
        host.send_data(&outbound.callback_data);
        if let Some(link) = outbound.deep_link.as_deref() {
            host.open_link(link);
        }
        host.close();

        info!(
            "event=action_emit module=selection status=ok action={} unit={} deep_link={}",
            outbound.message.action.label(),
            selection.unit,
            outbound.deep_link.is_some()
        );
        Ok(outbound)
    }

    pub fn cancel(&mut self) {
        let accepted = self.apply(SelectionEvent::Cancel);
        debug_assert!(accepted.is_ok(), "cancel is accepted from every state");
    }

    pub fn clear_selection(&mut self) {
        let accepted = self.apply(SelectionEvent::Clear);
        debug_assert!(accepted.is_ok(), "clear is accepted from every state");
    }
}
