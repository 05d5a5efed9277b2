//! Board configuration with environment overrides.
//!
//! # Invariants
//! - Every field has a usable default; configuration never fails.
//! - Blank or malformed overrides are ignored with a warning.

use crate::store::source::DatasetLocation;
use log::warn;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DATASET: &str = "APTGRID_DATASET";
pub const ENV_FETCH_TIMEOUT_MS: &str = "APTGRID_FETCH_TIMEOUT_MS";
pub const ENV_SESSION_DB: &str = "APTGRID_SESSION_DB";
pub const ENV_BOT_USERNAME: &str = "APTGRID_BOT_USERNAME";

pub const DEFAULT_DATASET: &str = "apartments_status.json";
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const SESSION_DB_FILE_NAME: &str = "aptgrid_session.sqlite3";

#[derive(Debug, Clone, PartialEq)]
pub struct BoardConfig {
    pub dataset: DatasetLocation,
    /// Bounded wait for URL datasets.
    pub fetch_timeout: Duration,
    pub session_db_path: PathBuf,
    /// Bot that receives deep links; no deep link when unset.
    pub bot_username: Option<String>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            dataset: DatasetLocation::parse(DEFAULT_DATASET),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            session_db_path: std::env::temp_dir().join(SESSION_DB_FILE_NAME),
            bot_username: None,
        }
    }
}

impl BoardConfig {
    /// Defaults overridden by `APTGRID_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `lookup`, which maps variable names to values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = non_blank(lookup(ENV_DATASET)) {
            config.dataset = DatasetLocation::parse(&raw);
        }
        if let Some(raw) = non_blank(lookup(ENV_FETCH_TIMEOUT_MS)) {
            match raw.parse::<u64>() {
                Ok(ms) if ms > 0 => config.fetch_timeout = Duration::from_millis(ms),
                _ => warn!(
                    "event=config_load module=config status=ignored key={ENV_FETCH_TIMEOUT_MS} reason=not_a_positive_integer"
                ),
            }
        }
        if let Some(raw) = non_blank(lookup(ENV_SESSION_DB)) {
            config.session_db_path = PathBuf::from(raw);
        }
        config.bot_username = non_blank(lookup(ENV_BOT_USERNAME));

        config
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
