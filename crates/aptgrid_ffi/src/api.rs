//! FFI use-case API for the Flutter board host.
//!
//! # Responsibility
//! - Expose board use cases to Dart via FRB as flat DTOs.
//! - Own the single live board session of this process.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Host effects are returned to the caller in emission order; the Dart
//!   side replays them against the real host API.
//! - Calls made before `board_start` fail with a message, never a panic.

use aptgrid_core::projection::filter::StatusFilter;
use aptgrid_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    BoardConfig, BoardError, BoardService, EffectQueue, Floor, HostEffect, OutboundAction,
    SqliteSessionStorage, Tab,
};
use log::{info, warn};
use std::sync::Mutex;

type Board = BoardService<SqliteSessionStorage>;

static BOARD: Mutex<Option<Board>> = Mutex::new(None);

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Idempotent for the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Building-wide counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardStatsDto {
    pub total: u32,
    pub occupied: u32,
    pub free: u32,
}

/// Result of starting a board session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardStartResponse {
    pub ok: bool,
    pub message: String,
    /// Restored tab label (`grid|cards|list|heatmap`).
    pub active_tab: String,
    /// `true` when the dataset could not be loaded and every unit is free.
    pub degraded: bool,
    pub stats: Option<BoardStatsDto>,
}

/// One unit as rendered by any projection.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitCellDto {
    pub floor: String,
    pub number: u32,
    pub display_number: String,
    pub occupied: bool,
    pub owner: Option<String>,
    /// Area as written in the dataset.
    pub area: Option<String>,
    pub block: Option<String>,
    pub visible: bool,
    pub tooltip: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridRowDto {
    pub floor: String,
    pub cells: Vec<UnitCellDto>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapFloorDto {
    pub floor: String,
    /// Share of occupied units, `0.0..=1.0`.
    pub density: f64,
    pub cells: Vec<UnitCellDto>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListGroupDto {
    pub floor: String,
    pub occupied_count: u32,
    pub total_count: u32,
    pub collapsed: bool,
    pub items: Vec<UnitCellDto>,
}

/// Host call the Dart side must perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEffectDto {
    /// `send_data|show_popup|show_alert|haptic|main_button|open_link|close`.
    pub kind: String,
    pub title: Option<String>,
    /// Data, message, URL, haptic style or button label; `None` hides the
    /// main button.
    pub text: Option<String>,
}

/// Response envelope for interactive board calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardActionResponse {
    pub ok: bool,
    pub message: String,
    pub effects: Vec<HostEffectDto>,
    /// Structured action payload as JSON, present after an emit.
    pub payload_json: Option<String>,
    pub callback_data: Option<String>,
}

impl BoardActionResponse {
    fn success(message: impl Into<String>, effects: Vec<HostEffectDto>) -> Self {
        Self {
            ok: true,
            message: message.into(),
            effects,
            payload_json: None,
            callback_data: None,
        }
    }

    fn failure(message: impl Into<String>, effects: Vec<HostEffectDto>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            effects,
            payload_json: None,
            callback_data: None,
        }
    }

    fn emitted(outbound: OutboundAction, effects: Vec<HostEffectDto>) -> Self {
        let payload_json = match outbound.message.to_json() {
            Ok(json) => Some(json),
            Err(err) => {
                warn!("event=ffi_payload_encode module=ffi status=error error={err}");
                None
            }
        };
        Self {
            ok: true,
            message: "Action sent.".to_string(),
            effects,
            payload_json,
            callback_data: Some(outbound.callback_data),
        }
    }
}

/// Starts (or restarts) the board session using `APTGRID_*` configuration.
///
/// `authorized` is the host trust gate result; `session_id` keys the
/// persisted tab, a fresh id is generated when absent.
///
/// # FFI contract
/// - Sync call; may block on dataset fetch up to the configured timeout.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn board_start(authorized: bool, session_id: Option<String>) -> BoardStartResponse {
    start_with_config(authorized, session_id, &BoardConfig::from_env())
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_stats() -> Option<BoardStatsDto> {
    with_board(|board| stats_dto(board)).ok()
}

/// Switches the visible projection; returns empty string on success.
#[flutter_rust_bridge::frb(sync)]
pub fn board_activate_tab(tab: String) -> String {
    let Some(tab) = Tab::from_label(&tab) else {
        return format!("unknown tab `{}`", tab.trim());
    };
    match with_board(|board| board.activate_tab(tab)) {
        Ok(_) => String::new(),
        Err(err) => err,
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_active_tab() -> Option<String> {
    with_board(|board| board.active_tab().label().to_string()).ok()
}

/// Grid rows, ground floor first; empty before the grid tab was shown.
#[flutter_rust_bridge::frb(sync)]
pub fn board_grid() -> Vec<GridRowDto> {
    with_board(|board| {
        board
            .grid()
            .map(|grid| {
                grid.rows
                    .iter()
                    .map(|row| GridRowDto {
                        floor: row.floor.label().to_string(),
                        cells: row
                            .cells
                            .iter()
                            .map(|cell| UnitCellDto {
                                owner: cell.owner.clone(),
                                ..base_cell(cell.unit, cell.occupied)
                            })
                            .collect(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    })
    .unwrap_or_default()
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_cards() -> Vec<UnitCellDto> {
    with_board(|board| {
        board
            .cards()
            .map(|cards| {
                cards
                    .cards()
                    .iter()
                    .map(|card| UnitCellDto {
                        owner: card.owner.clone(),
                        area: card.area.as_ref().map(|area| area.as_text().to_string()),
                        block: card.block.clone(),
                        visible: card.visible,
                        ..base_cell(card.unit, card.occupied)
                    })
                    .collect()
            })
            .unwrap_or_default()
    })
    .unwrap_or_default()
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_list() -> Vec<ListGroupDto> {
    with_board(|board| {
        board
            .list()
            .map(|list| {
                list.groups()
                    .iter()
                    .map(|group| ListGroupDto {
                        floor: group.floor.label().to_string(),
                        occupied_count: to_u32(group.occupied_count),
                        total_count: to_u32(group.total_count),
                        collapsed: group.collapsed,
                        items: group
                            .items
                            .iter()
                            .map(|item| UnitCellDto {
                                owner: item.owner.clone(),
                                visible: item.visible,
                                ..base_cell(item.unit, item.occupied)
                            })
                            .collect(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    })
    .unwrap_or_default()
}

/// Heatmap rows with per-floor density, ground floor first.
#[flutter_rust_bridge::frb(sync)]
pub fn board_heatmap() -> Vec<HeatmapFloorDto> {
    with_board(|board| {
        board
            .heatmap()
            .map(|heatmap| {
                Floor::all()
                    .map(|floor| HeatmapFloorDto {
                        floor: floor.label().to_string(),
                        density: heatmap.floor_density(floor),
                        cells: heatmap
                            .floor_cells(floor)
                            .map(|cell| UnitCellDto {
                                tooltip: Some(cell.tooltip.clone()),
                                ..base_cell(cell.unit, cell.occupied)
                            })
                            .collect(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    })
    .unwrap_or_default()
}

/// Search text for `cards` or `list`; returns empty string on success.
#[flutter_rust_bridge::frb(sync)]
pub fn board_set_search(tab: String, query: String) -> String {
    let result = match Tab::from_label(&tab) {
        Some(Tab::Cards) => with_board(|board| board.set_cards_search(&query)),
        Some(Tab::List) => with_board(|board| board.set_list_search(&query)),
        _ => Err(format!("tab `{}` has no search", tab.trim())),
    };
    result.err().unwrap_or_default()
}

/// List status filter (`all|occupied|free`); returns empty string on success.
#[flutter_rust_bridge::frb(sync)]
pub fn board_set_status_filter(status: String) -> String {
    let Some(status) = StatusFilter::from_label(&status) else {
        return format!("unknown status filter `{}`", status.trim());
    };
    with_board(|board| board.set_status_filter(status))
        .err()
        .unwrap_or_default()
}

/// Flips a list group; returns the new collapsed state.
#[flutter_rust_bridge::frb(sync)]
pub fn board_toggle_group(floor: String) -> Option<bool> {
    let floor = Floor::from_label(floor.trim()).ok()?;
    with_board(|board| board.toggle_group(floor)).ok()
}

/// Unit click from any projection.
#[flutter_rust_bridge::frb(sync)]
pub fn board_click_unit(floor: String, number: u32) -> BoardActionResponse {
    let mut host = EffectQueue::new();
    let result = with_board(|board| {
        board
            .click_unit(floor.trim(), number, &mut host)
            .map_err(|err| err.to_string())
    })
    .and_then(|inner| inner);
    let effects = effect_dtos(host.drain());
    match result {
        Ok(selection) => BoardActionResponse::success(
            format!("Unit {} selected.", selection.unit),
            effects,
        ),
        Err(err) => BoardActionResponse::failure(format!("board_click_unit failed: {err}"), effects),
    }
}

/// Main-button press: confirms the selection and emits the action.
#[flutter_rust_bridge::frb(sync)]
pub fn board_main_button() -> BoardActionResponse {
    let mut host = EffectQueue::new();
    let result = with_board(|board| {
        board
            .press_main_button(&mut host)
            .map_err(|err| err.to_string())
    })
    .and_then(|inner| inner);
    let effects = effect_dtos(host.drain());
    match result {
        Ok(outbound) => BoardActionResponse::emitted(outbound, effects),
        Err(err) => {
            BoardActionResponse::failure(format!("board_main_button failed: {err}"), effects)
        }
    }
}

/// Last emitted selection of this session as JSON
/// (`{action, floor, apartment, area, block, client_id, owner, timestamp}`).
#[flutter_rust_bridge::frb(sync)]
pub fn board_last_action() -> Option<String> {
    let emitted = with_board(|board| board.last_emitted()).ok()??;
    match emitted.to_json() {
        Ok(json) => Some(json),
        Err(err) => {
            warn!("event=ffi_last_action module=ffi status=error error={err}");
            None
        }
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_cancel() -> BoardActionResponse {
    let mut host = EffectQueue::new();
    let result = with_board(|board| board.cancel(&mut host));
    let effects = effect_dtos(host.drain());
    match result {
        Ok(()) => BoardActionResponse::success("Selection cleared.", effects),
        Err(err) => BoardActionResponse::failure(err, effects),
    }
}

/// Ends the session and drops all board state; returns empty string on
/// success.
#[flutter_rust_bridge::frb(sync)]
pub fn board_end() -> String {
    let mut slot = match BOARD.lock() {
        Ok(slot) => slot,
        Err(_) => return "board state lock poisoned".to_string(),
    };
    match slot.take() {
        Some(mut board) => {
            board.end();
            String::new()
        }
        None => "board session not started".to_string(),
    }
}

fn start_with_config(
    authorized: bool,
    session_id: Option<String>,
    config: &BoardConfig,
) -> BoardStartResponse {
    if !authorized {
        warn!("event=ffi_board_start module=ffi status=rejected reason=unauthorized");
        return start_failure(format!("board_start failed: {}", BoardError::Unauthorized));
    }

    let session_id = session_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(SqliteSessionStorage::generate_session_id);

    if let Err(err) = retire_board(&session_id) {
        return start_failure(err);
    }

    let storage = match SqliteSessionStorage::open(&config.session_db_path, &session_id) {
        Ok(storage) => storage,
        Err(err) => return start_failure(format!("session storage open failed: {err}")),
    };
    let source = config.dataset.open(config.fetch_timeout);
    let board = match BoardService::start(
        authorized,
        source.as_ref(),
        storage,
        config.bot_username.clone(),
    ) {
        Ok(board) => board,
        Err(err) => return start_failure(format!("board_start failed: {err}")),
    };

    let response = BoardStartResponse {
        ok: true,
        message: "Board started.".to_string(),
        active_tab: board.active_tab().label().to_string(),
        degraded: board.load_outcome().is_degraded(),
        stats: Some(stats_dto(&board)),
    };

    match BOARD.lock() {
        Ok(mut slot) => {
            *slot = Some(board);
            response
        }
        Err(_) => start_failure("board state lock poisoned".to_string()),
    }
}

/// Empties the board slot before a new start.
///
/// A reload in the same session keeps its persisted state; a different
/// session ends the previous one.
fn retire_board(next_session_id: &str) -> Result<(), String> {
    let mut slot = BOARD
        .lock()
        .map_err(|_| "board state lock poisoned".to_string())?;
    let Some(mut previous) = slot.take() else {
        return Ok(());
    };
    if previous.tab_storage().session_id() == next_session_id {
        info!("event=ffi_board_restart module=ffi status=ok mode=reload");
    } else {
        info!("event=ffi_board_restart module=ffi status=ok mode=replace");
        previous.end();
    }
    Ok(())
}

fn start_failure(message: String) -> BoardStartResponse {
    BoardStartResponse {
        ok: false,
        message,
        active_tab: Tab::default().label().to_string(),
        degraded: false,
        stats: None,
    }
}

fn with_board<T>(f: impl FnOnce(&mut Board) -> T) -> Result<T, String> {
    let mut slot = BOARD
        .lock()
        .map_err(|_| "board state lock poisoned".to_string())?;
    let board = slot
        .as_mut()
        .ok_or_else(|| "board session not started".to_string())?;
    Ok(f(board))
}

fn stats_dto(board: &Board) -> BoardStatsDto {
    let stats = board.stats();
    BoardStatsDto {
        total: to_u32(stats.total),
        occupied: to_u32(stats.occupied),
        free: to_u32(stats.free),
    }
}

fn base_cell(unit: aptgrid_core::UnitRef, occupied: bool) -> UnitCellDto {
    UnitCellDto {
        floor: unit.floor().label().to_string(),
        number: u32::from(unit.number()),
        display_number: unit.display_number(),
        occupied,
        owner: None,
        area: None,
        block: None,
        visible: true,
        tooltip: None,
    }
}

fn effect_dtos(effects: Vec<HostEffect>) -> Vec<HostEffectDto> {
    effects.into_iter().map(effect_dto).collect()
}

fn effect_dto(effect: HostEffect) -> HostEffectDto {
    let (kind, title, text) = match effect {
        HostEffect::SendData(data) => ("send_data", None, Some(data)),
        HostEffect::ShowPopup(prompt) => ("show_popup", Some(prompt.title), Some(prompt.message)),
        HostEffect::ShowAlert(message) => ("show_alert", None, Some(message)),
        HostEffect::Haptic(style) => ("haptic", None, Some(style.label().to_string())),
        HostEffect::MainButton(label) => ("main_button", None, label),
        HostEffect::OpenLink(url) => ("open_link", None, Some(url)),
        HostEffect::Close => ("close", None, None),
    };
    HostEffectDto {
        kind: kind.to_string(),
        title,
        text,
    }
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::{
        board_activate_tab, board_cards, board_click_unit, board_end, board_grid, board_heatmap,
        board_last_action, board_main_button, board_set_search, board_set_status_filter,
        board_stats, board_toggle_group, core_version, init_logging, ping, start_with_config,
    };
    use aptgrid_core::{BoardConfig, DatasetLocation};

    const DATASET: &str = r#"{
        "3": { "5": {"owner": "Ivanov", "area": "54.2", "block": "A", "client_id": "c9"} },
        "ц.": { "1": {"owner": "Karimova", "area": 38.5, "block": "B"} }
    }"#;

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_bad_input() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_logging("verbose".to_string(), "/tmp/logs".to_string()).is_empty());
    }

    // The board lives in a process-wide slot, so the whole lifecycle runs
    // in one test.
    #[test]
    fn board_lifecycle_over_ffi() {
        assert_eq!(board_stats(), None);
        assert!(!board_main_button().ok);

        let dir = tempfile::tempdir().expect("temp dir should be created");
        let dataset = dir.path().join("apartments_status.json");
        std::fs::write(&dataset, DATASET).expect("dataset should be written");
        let session_db = dir.path().join("session.sqlite3");
        let config = BoardConfig {
            dataset: DatasetLocation::File(dataset),
            session_db_path: session_db.clone(),
            bot_username: Some("contracts_bot".to_string()),
            ..BoardConfig::default()
        };

        let rejected = start_with_config(false, Some("s1".to_string()), &config);
        assert!(!rejected.ok);
        assert!(!session_db.exists(), "rejected start must not touch storage");

        let started = start_with_config(true, Some("s1".to_string()), &config);
        assert!(started.ok, "{}", started.message);
        assert_eq!(started.active_tab, "grid");
        let stats = started.stats.expect("started board should report stats");
        assert_eq!(stats.occupied, 2);
        assert_eq!(board_grid().len(), 10);
        assert!(board_cards().is_empty());

        assert_eq!(board_activate_tab("cards".to_string()), "");
        assert_eq!(board_set_search("cards".to_string(), "ivanov".to_string()), "");
        let visible = board_cards().into_iter().filter(|card| card.visible).count();
        assert_eq!(visible, 1);
        let ivanov = board_cards()
            .into_iter()
            .find(|card| card.display_number == "3-5")
            .expect("3-5 card should exist");
        assert_eq!(ivanov.area.as_deref(), Some("54.2"));
        assert!(!board_set_search("grid".to_string(), "x".to_string()).is_empty());
        assert!(!board_set_status_filter("busy".to_string()).is_empty());
        assert_eq!(board_toggle_group("ц.".to_string()), Some(true));

        // Two reloads of the same session keep the saved tab.
        for _ in 0..2 {
            let reloaded = start_with_config(true, Some("s1".to_string()), &config);
            assert!(reloaded.ok, "{}", reloaded.message);
            assert_eq!(reloaded.active_tab, "cards");
        }

        assert_eq!(board_activate_tab("heatmap".to_string()), "");
        let heatmap = board_heatmap();
        assert_eq!(heatmap.len(), 10);
        assert_eq!(heatmap[0].floor, "ц.");
        assert!((heatmap[0].density - 1.0 / 14.0).abs() < f64::EPSILON);
        assert_eq!(heatmap[3].cells.len(), 14);

        let clicked = board_click_unit("3".to_string(), 5);
        assert!(clicked.ok, "{}", clicked.message);
        let kinds = clicked
            .effects
            .iter()
            .map(|effect| effect.kind.as_str())
            .collect::<Vec<_>>();
        assert_eq!(kinds, ["show_popup", "main_button", "haptic"]);

        let emitted = board_main_button();
        assert!(emitted.ok, "{}", emitted.message);
        assert_eq!(
            emitted.callback_data.as_deref(),
            Some("apt_receipt_3_5_54.2_A_c9")
        );
        assert_eq!(
            emitted.payload_json.as_deref(),
            Some(r#"{"action":"create_receipt","floor":"3","apartment":5,"client_id":"c9"}"#)
        );
        let kinds = emitted
            .effects
            .iter()
            .map(|effect| effect.kind.as_str())
            .collect::<Vec<_>>();
        assert_eq!(kinds, ["send_data", "open_link", "close"]);
        let last = board_last_action().expect("emitted action should be stored");
        assert!(last.contains(r#""action":"receipt""#));
        assert!(last.contains(r#""area":"54.2""#));

        // A different session replaces the board and starts from defaults.
        let other = start_with_config(true, Some("s2".to_string()), &config);
        assert!(other.ok, "{}", other.message);
        assert_eq!(other.active_tab, "grid");
        assert_eq!(board_last_action(), None);

        assert_eq!(board_end(), "");
        assert!(!board_end().is_empty());
        assert_eq!(board_stats(), None);

        let back = start_with_config(true, Some("s1".to_string()), &config);
        assert!(back.ok, "{}", back.message);
        assert_eq!(back.active_tab, "grid", "replacing s1 by s2 ended s1");
        assert_eq!(board_end(), "");
    }
}
