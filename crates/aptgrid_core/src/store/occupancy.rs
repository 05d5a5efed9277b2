//! Session occupancy store.
//!
//! # Responsibility
//! - Load the floor → unit → occupant document once per session.
//! - Answer total lookups and building-wide counts.
//!
//! # Invariants
//! - The store is read-only after load.
//! - A failed load yields an empty store (every unit free), never an error.
//! - `occupied_count() + free_count() == total_units()`.

use crate::model::unit::{
    Area, Floor, OccupancyRecord, Unit, UnitRef, FLOOR_COUNT, UNITS_PER_FLOOR,
};
use crate::store::source::{DatasetSource, SourceError};
use log::{error, info, warn};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Parse or retrieval failure of the occupancy document.
#[derive(Debug)]
pub enum DatasetError {
    Source(SourceError),
    Json(serde_json::Error),
    /// Top-level JSON value is not an object keyed by floor.
    NotAnObject,
}

impl Display for DatasetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "invalid dataset JSON: {err}"),
            Self::NotAnObject => write!(f, "dataset must be a JSON object keyed by floor"),
        }
    }
}

impl Error for DatasetError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Source(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::NotAnObject => None,
        }
    }
}

impl From<SourceError> for DatasetError {
    fn from(value: SourceError) -> Self {
        Self::Source(value)
    }
}

impl From<serde_json::Error> for DatasetError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// What a load actually produced.
///
/// Store semantics are the same for both variants; the outcome only tells
/// an empty building apart from a degraded one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded {
        floors: usize,
        occupied: usize,
        /// Entries ignored or only partially read.
        skipped: usize,
    },
    Unavailable {
        reason: String,
    },
}

impl LoadOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// Authoritative occupancy mapping for one session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OccupancyStore {
    floors: BTreeMap<Floor, BTreeMap<u8, OccupancyRecord>>,
}

impl OccupancyStore {
    /// Store with every unit free.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads the dataset, substituting an empty store on any failure.
    pub fn load(source: &dyn DatasetSource) -> Self {
        Self::load_with_outcome(source).0
    }

    /// Same as [`OccupancyStore::load`], also reporting what happened.
    ///
    /// # Side effects
    /// - Emits `dataset_load` events with duration and counts. Occupant
    ///   fields are never logged.
    pub fn load_with_outcome(source: &dyn DatasetSource) -> (Self, LoadOutcome) {
        let started_at = Instant::now();
        let description = source.describe();
        info!("event=dataset_load module=store status=start source={description}");

        let parsed = source
            .fetch()
            .map_err(DatasetError::from)
            .and_then(|raw| Self::parse(&raw));

        match parsed {
            Ok((store, skipped)) => {
                let outcome = LoadOutcome::Loaded {
                    floors: store.floors.len(),
                    occupied: store.occupied_count(),
                    skipped,
                };
                info!(
                    "event=dataset_load module=store status=ok source={} duration_ms={} floors={} occupied={} skipped={}",
                    description,
                    started_at.elapsed().as_millis(),
                    store.floors.len(),
                    store.occupied_count(),
                    skipped
                );
                (store, outcome)
            }
            Err(err) => {
                error!(
                    "event=dataset_load module=store status=degraded source={} duration_ms={} error={}",
                    description,
                    started_at.elapsed().as_millis(),
                    err
                );
                (
                    Self::empty(),
                    LoadOutcome::Unavailable {
                        reason: err.to_string(),
                    },
                )
            }
        }
    }

    /// Parses a raw dataset document.
    ///
    /// Unknown floors, out-of-range unit keys and empty entries (`null`,
    /// `false`, `0`, `""`) are skipped with a warning. Any other unit entry
    /// marks the unit occupied: fields that cannot be read fall back to
    /// defaults and the entry is counted with the skipped ones.
    ///
    /// # Errors
    /// - Returns an error when the text is not JSON or not a JSON object.
    pub fn parse(raw: &str) -> Result<(Self, usize), DatasetError> {
        let document: Value = serde_json::from_str(raw)?;
        let Value::Object(floor_entries) = document else {
            return Err(DatasetError::NotAnObject);
        };

        let mut store = Self::empty();
        let mut skipped = 0usize;

        for (floor_label, units) in floor_entries {
            let floor = match Floor::from_label(&floor_label) {
                Ok(floor) => floor,
                Err(err) => {
                    warn!("event=dataset_parse module=store status=skipped entry=floor reason={err}");
                    skipped += 1;
                    continue;
                }
            };
            let Value::Object(unit_entries) = units else {
                warn!(
                    "event=dataset_parse module=store status=skipped entry=floor floor={floor} reason=not_an_object"
                );
                skipped += 1;
                continue;
            };

            for (number_key, record) in unit_entries {
                let unit = match parse_unit_key(floor, &number_key) {
                    Some(unit) => unit,
                    None => {
                        warn!(
                            "event=dataset_parse module=store status=skipped entry=unit floor={floor} reason=invalid_number"
                        );
                        skipped += 1;
                        continue;
                    }
                };
                match read_record(record) {
                    RecordRead::Complete(record) => {
                        store.insert(unit, record);
                    }
                    RecordRead::Partial(record, reason) => {
                        warn!(
                            "event=dataset_parse module=store status=partial entry=record unit={unit} reason={reason}"
                        );
                        skipped += 1;
                        store.insert(unit, record);
                    }
                    RecordRead::Empty => {
                        warn!(
                            "event=dataset_parse module=store status=skipped entry=record unit={unit} reason=empty_entry"
                        );
                        skipped += 1;
                    }
                }
            }
        }

        Ok((store, skipped))
    }

    /// Builds a store from already validated records.
    pub fn from_records(records: impl IntoIterator<Item = (UnitRef, OccupancyRecord)>) -> Self {
        let mut store = Self::empty();
        for (unit, record) in records {
            store.insert(unit, record);
        }
        store
    }

    fn insert(&mut self, unit: UnitRef, record: OccupancyRecord) {
        self.floors
            .entry(unit.floor())
            .or_default()
            .insert(unit.number(), record);
    }

    pub fn total_units(&self) -> usize {
        FLOOR_COUNT * usize::from(UNITS_PER_FLOOR)
    }

    pub fn occupied_count(&self) -> usize {
        self.floors.values().map(BTreeMap::len).sum()
    }

    pub fn free_count(&self) -> usize {
        self.total_units() - self.occupied_count()
    }

    /// Occupied units on one floor.
    pub fn occupied_on(&self, floor: Floor) -> usize {
        self.floors.get(&floor).map_or(0, BTreeMap::len)
    }

    /// Total lookup: absent entries are free units.
    pub fn unit_at(&self, at: UnitRef) -> Unit {
        match self.record_at(at) {
            Some(record) => Unit::occupied(at, record.clone()),
            None => Unit::free(at),
        }
    }

    pub fn record_at(&self, at: UnitRef) -> Option<&OccupancyRecord> {
        self.floors
            .get(&at.floor())
            .and_then(|units| units.get(&at.number()))
    }

    /// Every unit in grid order (ground first, then ascending numbers).
    pub fn units(&self) -> impl Iterator<Item = Unit> + '_ {
        UnitRef::all().map(|at| self.unit_at(at))
    }
}

enum RecordRead {
    Complete(OccupancyRecord),
    /// Occupied, but some fields fell back to defaults.
    Partial(OccupancyRecord, &'static str),
    Empty,
}

fn read_record(value: Value) -> RecordRead {
    match value {
        Value::Null | Value::Bool(false) => RecordRead::Empty,
        Value::String(text) if text.is_empty() => RecordRead::Empty,
        Value::Number(number) if number.as_f64() == Some(0.0) => RecordRead::Empty,
        Value::Object(fields) => {
            match serde_json::from_value::<OccupancyRecord>(Value::Object(fields.clone())) {
                Ok(record) if record.area.is_some() && record.square_meters().is_none() => {
                    RecordRead::Partial(record, "invalid_area")
                }
                Ok(record) => RecordRead::Complete(record),
                Err(_) => RecordRead::Partial(
                    OccupancyRecord {
                        owner: text_field(&fields, "owner").unwrap_or_default(),
                        area: text_field(&fields, "area").map(|text| Area::parse(&text)),
                        block: text_field(&fields, "block"),
                        client_id: text_field(&fields, "client_id"),
                    },
                    "invalid_field",
                ),
            }
        }
        _ => RecordRead::Partial(OccupancyRecord::default(), "not_an_object"),
    }
}

fn text_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn parse_unit_key(floor: Floor, key: &str) -> Option<UnitRef> {
    let number = key.trim().parse::<u32>().ok()?;
    UnitRef::new(floor, number).ok()
}
