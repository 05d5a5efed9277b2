//! Unit addressing and occupancy model.
//!
//! # Responsibility
//! - Define the fixed building geometry (floors and units per floor).
//! - Provide validated unit coordinates and the occupancy record shape.
//!
//! # Invariants
//! - A `Floor` is always one of the ten known floors (ground + `1..=9`).
//! - A `UnitRef` number is always within `1..=UNITS_PER_FLOOR`.
//! - A `Unit` is occupied iff it carries an `OccupancyRecord`.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Units on every floor, numbered from 1.
pub const UNITS_PER_FLOOR: u8 = 14;
/// Dataset label of the ground floor.
pub const GROUND_FLOOR_LABEL: &str = "ц.";
/// Number of floors, ground included.
pub const FLOOR_COUNT: usize = FLOOR_LABELS.len();

const FLOOR_LABELS: [&str; 10] = [GROUND_FLOOR_LABEL, "1", "2", "3", "4", "5", "6", "7", "8", "9"];

/// Rejected unit coordinates.
///
/// Coordinates come from the rendered grid, so these indicate a caller bug
/// rather than a runtime condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitRefError {
    UnknownFloor(String),
    NumberOutOfRange(u32),
}

impl Display for UnitRefError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownFloor(label) => write!(f, "unknown floor label `{label}`"),
            Self::NumberOutOfRange(number) => write!(
                f,
                "unit number {number} is outside 1..={UNITS_PER_FLOOR}"
            ),
        }
    }
}

impl Error for UnitRefError {}

/// One floor of the building, ordered ground first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Floor(u8);

impl Floor {
    pub const GROUND: Floor = Floor(0);

    /// Returns an upper floor (`1..=9`).
    pub fn upper(level: u8) -> Result<Self, UnitRefError> {
        if level == 0 || usize::from(level) >= FLOOR_COUNT {
            return Err(UnitRefError::UnknownFloor(level.to_string()));
        }
        Ok(Self(level))
    }

    /// Parses a dataset floor label (`ц.`, `1`..`9`).
    pub fn from_label(label: &str) -> Result<Self, UnitRefError> {
        let trimmed = label.trim();
        FLOOR_LABELS
            .iter()
            .position(|known| *known == trimmed)
            .map(|index| Self(index as u8))
            .ok_or_else(|| UnitRefError::UnknownFloor(trimmed.to_string()))
    }

    /// All floors in display order.
    pub fn all() -> impl DoubleEndedIterator<Item = Floor> + ExactSizeIterator {
        (0..FLOOR_COUNT as u8).map(Floor)
    }

    pub fn label(self) -> &'static str {
        FLOOR_LABELS[usize::from(self.0)]
    }
}

impl Display for Floor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Floor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Floor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Floor::from_label(&label).map_err(de::Error::custom)
    }
}

/// Validated `(floor, number)` coordinate of one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitRef {
    floor: Floor,
    number: u8,
}

impl UnitRef {
    pub fn new(floor: Floor, number: u32) -> Result<Self, UnitRefError> {
        if number == 0 || number > u32::from(UNITS_PER_FLOOR) {
            return Err(UnitRefError::NumberOutOfRange(number));
        }
        Ok(Self {
            floor,
            number: number as u8,
        })
    }

    /// Builds a coordinate from a host-provided floor label and number.
    pub fn parse(floor_label: &str, number: u32) -> Result<Self, UnitRefError> {
        Self::new(Floor::from_label(floor_label)?, number)
    }

    /// Every unit of the building in grid order.
    pub fn all() -> impl Iterator<Item = UnitRef> {
        Floor::all().flat_map(|floor| {
            (1..=UNITS_PER_FLOOR).map(move |number| UnitRef { floor, number })
        })
    }

    pub fn floor(&self) -> Floor {
        self.floor
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    /// Human-facing unit number, e.g. `3-5`.
    pub fn display_number(&self) -> String {
        format!("{}-{}", self.floor.label(), self.number)
    }
}

impl Display for UnitRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.floor.label(), self.number)
    }
}

/// Area as written in the dataset plus its parsed value.
///
/// The text is kept verbatim because hosts echo it back to the bot; the
/// number is only used for display and sorting.
#[derive(Debug, Clone, PartialEq)]
pub struct Area {
    text: String,
    square_meters: Option<f64>,
}

impl Area {
    /// Keeps `text` trimmed; a decimal comma is accepted for the value.
    pub fn parse(text: &str) -> Self {
        let text = text.trim().to_string();
        let square_meters = text.replace(',', ".").parse::<f64>().ok();
        Self {
            text,
            square_meters,
        }
    }

    pub fn as_text(&self) -> &str {
        &self.text
    }

    /// `None` when the dataset text is not a number.
    pub fn square_meters(&self) -> Option<f64> {
        self.square_meters
    }
}

impl Display for Area {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for Area {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

/// Occupant data attached to an occupied unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OccupancyRecord {
    #[serde(default)]
    pub owner: String,
    /// Accepts `"54.2"`, `"38,5"` and `54.2`. Never fails: an unreadable
    /// value is kept as text without a parsed number.
    #[serde(default, deserialize_with = "deserialize_area")]
    pub area: Option<Area>,
    #[serde(default)]
    pub block: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
}

impl OccupancyRecord {
    /// Parsed area in square meters, if the dataset value is numeric.
    pub fn square_meters(&self) -> Option<f64> {
        self.area.as_ref().and_then(Area::square_meters)
    }
}

/// A unit together with its occupancy state.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub at: UnitRef,
    pub occupancy: Option<OccupancyRecord>,
}

impl Unit {
    pub fn free(at: UnitRef) -> Self {
        Self {
            at,
            occupancy: None,
        }
    }

    pub fn occupied(at: UnitRef, record: OccupancyRecord) -> Self {
        Self {
            at,
            occupancy: Some(record),
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.occupancy.is_some()
    }

    pub fn owner(&self) -> Option<&str> {
        self.occupancy.as_ref().map(|record| record.owner.as_str())
    }
}

fn deserialize_area<'de, D>(deserializer: D) -> Result<Option<Area>, D::Error>
where
    D: Deserializer<'de>,
{
    struct AreaVisitor;

    impl<'de> Visitor<'de> for AreaVisitor {
        type Value = Option<Area>;

        fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str("an area as number or decimal string")
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2: Deserializer<'de>>(self, d: D2) -> Result<Self::Value, D2::Error> {
            d.deserialize_any(self)
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
            Ok(Some(Area {
                text: value.to_string(),
                square_meters: Some(value),
            }))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            Ok(Some(Area {
                text: value.to_string(),
                square_meters: Some(value as f64),
            }))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            Ok(Some(Area {
                text: value.to_string(),
                square_meters: Some(value as f64),
            }))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            let area = Area::parse(value);
            if area.text.is_empty() {
                return Ok(None);
            }
            Ok(Some(area))
        }

        fn visit_bool<E: de::Error>(self, _value: bool) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            while seq.next_element::<de::IgnoredAny>()?.is_some() {}
            Ok(None)
        }

        fn visit_map<A: de::MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            while map.next_entry::<de::IgnoredAny, de::IgnoredAny>()?.is_some() {}
            Ok(None)
        }
    }

    deserializer.deserialize_option(AreaVisitor)
}
