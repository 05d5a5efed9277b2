//! Outbound action message and its wire encodings.
//!
//! # Invariants
//! - `ActionMessage` is a pure function of the selection: no timestamps or
//!   other incidental fields take part in equality.
//! - Occupied units map to `create_receipt` with their client id; free
//!   units map to `create_contract` with none.
//! - The callback string and deep-link parameter are serializations of the
//!   same selection, not separate designs.

use crate::model::unit::{Area, Floor};
use crate::selection::Selection;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Prefix of the legacy callback string.
pub const CALLBACK_PREFIX: &str = "apt_";
/// Area sent when the dataset has none (typical two-room unit).
pub const FALLBACK_AREA: &str = "40.71";
pub const FALLBACK_BLOCK: &str = "A";
pub const FALLBACK_CLIENT_ID: &str = "none";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    CreateContract,
    CreateReceipt,
}

impl ActionKind {
    pub fn for_occupancy(occupied: bool) -> Self {
        if occupied {
            Self::CreateReceipt
        } else {
            Self::CreateContract
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::CreateContract => "create_contract",
            Self::CreateReceipt => "create_receipt",
        }
    }

    /// Verb used by the callback string and deep links.
    pub fn short_label(self) -> &'static str {
        match self {
            Self::CreateContract => "contract",
            Self::CreateReceipt => "receipt",
        }
    }
}

/// Structured payload handed to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionMessage {
    pub action: ActionKind,
    pub floor: Floor,
    pub apartment: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

impl ActionMessage {
    pub fn for_selection(selection: &Selection) -> Self {
        let action = ActionKind::for_occupancy(selection.occupied);
        let client_id = match action {
            ActionKind::CreateReceipt => selection.client_id.clone(),
            ActionKind::CreateContract => None,
        };
        Self {
            action,
            floor: selection.unit.floor(),
            apartment: selection.unit.number(),
            client_id,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// `{verb}_{floor}_{apartment}_{area}_{block}_{client_id}` with fallbacks.
pub fn deep_link_param(selection: &Selection) -> String {
    let action = ActionKind::for_occupancy(selection.occupied);
    format!(
        "{}_{}_{}_{}_{}_{}",
        action.short_label(),
        selection.unit.floor().label(),
        selection.unit.number(),
        wire_area(selection),
        wire_block(selection),
        wire_client_id(selection)
    )
}

/// Dataset area text as written, or the nominal area.
fn wire_area(selection: &Selection) -> &str {
    non_blank(selection.area.as_ref().map(Area::as_text)).unwrap_or(FALLBACK_AREA)
}

fn wire_block(selection: &Selection) -> &str {
    non_blank(selection.block.as_deref()).unwrap_or(FALLBACK_BLOCK)
}

fn wire_client_id(selection: &Selection) -> &str {
    non_blank(selection.client_id.as_deref()).unwrap_or(FALLBACK_CLIENT_ID)
}

/// Legacy delimited form accepted by the host's `send_data` consumer.
pub fn callback_data(selection: &Selection) -> String {
    format!("{CALLBACK_PREFIX}{}", deep_link_param(selection))
}

pub fn deep_link_url(bot_username: &str, param: &str) -> String {
    format!(
        "https://t.me/{}?start={param}",
        bot_username.trim().trim_start_matches('@')
    )
}

/// Everything the host receives for one emitted action.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundAction {
    pub message: ActionMessage,
    pub callback_data: String,
    pub deep_link: Option<String>,
    /// Record kept in session storage after the action went out.
    pub emitted: EmittedSelection,
    /// Unix epoch milliseconds; for host-side logging only.
    pub created_at_ms: i64,
}

impl OutboundAction {
    pub fn new(selection: &Selection, bot_username: Option<&str>) -> Self {
        let deep_link = non_blank(bot_username)
            .map(|bot| deep_link_url(bot, &deep_link_param(selection)));
        let created_at_ms = now_epoch_ms();
        Self {
            message: ActionMessage::for_selection(selection),
            callback_data: callback_data(selection),
            deep_link,
            emitted: EmittedSelection::new(selection, created_at_ms),
            created_at_ms,
        }
    }
}

/// Last emitted selection, stored under `selectedApartment`.
///
/// Fields carry the same fallbacks as the callback string, so a host can
/// rebuild the message it sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmittedSelection {
    /// `contract` or `receipt`.
    pub action: String,
    pub floor: Floor,
    pub apartment: u8,
    pub area: String,
    pub block: String,
    pub client_id: String,
    #[serde(default)]
    pub owner: String,
    /// Unix epoch milliseconds.
    pub timestamp: i64,
}

impl EmittedSelection {
    pub fn new(selection: &Selection, timestamp: i64) -> Self {
        Self {
            action: ActionKind::for_occupancy(selection.occupied)
                .short_label()
                .to_string(),
            floor: selection.unit.floor(),
            apartment: selection.unit.number(),
            area: wire_area(selection).to_string(),
            block: wire_block(selection).to_string(),
            client_id: wire_client_id(selection).to_string(),
            owner: selection.owner.clone().unwrap_or_default(),
            timestamp,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as i64)
}
