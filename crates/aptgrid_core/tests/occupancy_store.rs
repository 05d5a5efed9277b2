use aptgrid_core::{
    DatasetError, DatasetLocation, FileSource, Floor, InlineSource, LoadOutcome, OccupancyStore,
    UnitRef,
};
use std::time::Duration;

const FIXTURE: &str = include_str!("fixtures/apartments_status.json");

fn unit(floor: &str, number: u32) -> UnitRef {
    UnitRef::parse(floor, number).unwrap()
}

#[test]
fn single_record_dataset_counts() {
    let raw = r#"{ "3": { "5": {"owner":"Ivanov", "area":"54.2", "block":"A", "client_id":"c9"} } }"#;
    let store = OccupancyStore::load(&InlineSource::new(raw));

    assert_eq!(store.total_units(), 140);
    assert_eq!(store.occupied_count(), 1);
    assert_eq!(store.free_count(), 139);

    let occupied = store.unit_at(unit("3", 5));
    assert!(occupied.is_occupied());
    assert_eq!(occupied.owner(), Some("Ivanov"));
    let record = occupied.occupancy.unwrap();
    assert_eq!(record.square_meters(), Some(54.2));
    assert_eq!(record.client_id.as_deref(), Some("c9"));

    assert!(!store.unit_at(unit("3", 6)).is_occupied());
}

#[test]
fn fixture_counts_always_sum_to_total() {
    let (store, outcome) = OccupancyStore::load_with_outcome(&InlineSource::new(FIXTURE));

    assert_eq!(store.occupied_count(), 6);
    assert_eq!(store.occupied_count() + store.free_count(), store.total_units());
    assert_eq!(
        outcome,
        LoadOutcome::Loaded {
            floors: 4,
            occupied: 6,
            skipped: 0,
        }
    );
    assert_eq!(store.occupied_on(Floor::GROUND), 1);
    assert_eq!(store.occupied_on(Floor::upper(1).unwrap()), 2);
    assert_eq!(store.occupied_on(Floor::upper(9).unwrap()), 0);
}

#[test]
fn area_accepts_comma_decimals_and_null() {
    let store = OccupancyStore::load(&InlineSource::new(FIXTURE));

    let karimova = store.record_at(unit("ц.", 2)).unwrap();
    assert_eq!(karimova.square_meters(), Some(38.5));
    assert_eq!(karimova.area.as_ref().unwrap().as_text(), "38,5");
    assert_eq!(store.record_at(unit("1", 1)).unwrap().square_meters(), Some(61.3));
    assert_eq!(store.record_at(unit("3", 6)).unwrap().area, None);
}

#[test]
fn area_text_is_kept_as_written() {
    let store = OccupancyStore::load(&InlineSource::new(FIXTURE));

    let sidorova = store.record_at(unit("1", 14)).unwrap();
    assert_eq!(sidorova.area.as_ref().unwrap().as_text(), "44.0");
    assert_eq!(sidorova.square_meters(), Some(44.0));
}

#[test]
fn entries_with_unreadable_fields_stay_occupied() {
    let raw = r#"{
        "4": {
            "1": {"owner": "Wide", "area": "wide", "block": "B"},
            "2": "Ivanov",
            "3": {"owner": ["not", "text"], "client_id": "c7"},
            "4": null
        }
    }"#;
    let (store, outcome) = OccupancyStore::load_with_outcome(&InlineSource::new(raw));

    assert_eq!(store.occupied_count(), 3);
    assert_eq!(store.free_count(), 137);
    assert_eq!(
        outcome,
        LoadOutcome::Loaded {
            floors: 1,
            occupied: 3,
            skipped: 4,
        }
    );

    let wide = store.record_at(unit("4", 1)).unwrap();
    assert_eq!(wide.owner, "Wide");
    assert_eq!(wide.square_meters(), None);
    assert_eq!(wide.block.as_deref(), Some("B"));

    assert!(store.unit_at(unit("4", 2)).is_occupied());
    assert_eq!(store.unit_at(unit("4", 2)).owner(), Some(""));

    let listed = store.record_at(unit("4", 3)).unwrap();
    assert_eq!(listed.owner, "");
    assert_eq!(listed.client_id.as_deref(), Some("c7"));

    assert!(!store.unit_at(unit("4", 4)).is_occupied());
}

#[test]
fn unit_lookup_is_total_over_the_grid() {
    let store = OccupancyStore::load(&InlineSource::new(FIXTURE));
    let units = store.units().collect::<Vec<_>>();

    assert_eq!(units.len(), 140);
    assert_eq!(units.first().unwrap().at, unit("ц.", 1));
    assert_eq!(units.last().unwrap().at, unit("9", 14));
    assert_eq!(units.iter().filter(|unit| unit.is_occupied()).count(), 6);
}

#[test]
fn empty_dataset_means_every_unit_is_free() {
    let (store, outcome) = OccupancyStore::load_with_outcome(&InlineSource::new("{}"));

    assert_eq!(store.occupied_count(), 0);
    assert_eq!(store.free_count(), 140);
    assert!(!outcome.is_degraded());
}

#[test]
fn missing_file_degrades_to_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let source = FileSource::new(dir.path().join("apartments_status.json"));

    let (store, outcome) = OccupancyStore::load_with_outcome(&source);

    assert_eq!(store, OccupancyStore::empty());
    assert_eq!(store.free_count(), 140);
    assert!(outcome.is_degraded());
}

#[test]
fn malformed_json_degrades_to_empty_store() {
    let (store, outcome) = OccupancyStore::load_with_outcome(&InlineSource::new("{\"3\": "));

    assert_eq!(store.occupied_count(), 0);
    match outcome {
        LoadOutcome::Unavailable { reason } => assert!(!reason.is_empty()),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn top_level_must_be_an_object() {
    let err = OccupancyStore::parse("[1, 2, 3]").unwrap_err();
    assert!(matches!(err, DatasetError::NotAnObject));
}

#[test]
fn out_of_domain_entries_are_skipped() {
    let raw = r#"{
        "10": { "1": {"owner": "Nobody"} },
        "2": {
            "0": {"owner": "Zero"},
            "15": {"owner": "Fifteen"},
            "x": {"owner": "Letter"},
            "4": {"owner": "Kept", "area": 50}
        },
        "5": "not an object"
    }"#;
    let (store, skipped) = OccupancyStore::parse(raw).unwrap();

    assert_eq!(store.occupied_count(), 1);
    assert_eq!(skipped, 5);
    assert_eq!(store.record_at(unit("2", 4)).unwrap().owner, "Kept");
}

#[test]
fn file_location_loads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("apartments_status.json");
    std::fs::write(&path, FIXTURE).unwrap();

    let location = DatasetLocation::parse(path.to_str().unwrap());
    assert_eq!(location, DatasetLocation::File(path.clone()));

    let source = location.open(Duration::from_secs(1));
    let store = OccupancyStore::load(source.as_ref());
    assert_eq!(store.occupied_count(), 6);
}
