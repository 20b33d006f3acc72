//! Integration tests for exporting from several devices and merging.

use std::sync::Arc;

use pomolog_core::records::EXPORT_SCHEMA;
use pomolog_core::{
    ExportPayload, KvStore, Locale, ManualClock, MemoryStore, RecordStore, TimerEngine, Zone,
};
use serde_json::json;

const T0: i64 = 1_792_397_100_000; // 2026-10-19T08:05:00Z

fn device() -> (RecordStore, TimerEngine, Arc<ManualClock>) {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(T0));
    let records = RecordStore::open(store.clone(), Zone::utc(), Locale::En).unwrap();
    let engine = TimerEngine::new(store, clock.clone());
    (records, engine, clock)
}

fn run(records: &mut RecordStore, engine: &mut TimerEngine, clock: &ManualClock, minutes: f64, note: &str) {
    engine.start(minutes, note).unwrap();
    clock.advance_secs((minutes * 60.0) as i64);
    engine.poll(records).unwrap().expect("run should complete");
    clock.advance_secs(60);
}

#[test]
fn importing_own_export_adds_nothing() {
    let (mut records, mut engine, clock) = device();
    run(&mut records, &mut engine, &clock, 25.0, "a");
    run(&mut records, &mut engine, &clock, 5.0, "b");

    let exported = records.export_all_json(T0).unwrap();
    let summary = records.import_merge([exported]).unwrap();
    assert_eq!(summary.sources, 1);
    assert_eq!(summary.parsed, 1);
    assert_eq!(summary.added, 0);
    assert_eq!(summary.total, 2);
}

#[test]
fn two_devices_merge_into_one_log() {
    let (mut laptop, mut laptop_engine, laptop_clock) = device();
    let (mut phone, mut phone_engine, phone_clock) = device();
    assert_ne!(laptop.device_id(), phone.device_id());

    run(&mut laptop, &mut laptop_engine, &laptop_clock, 25.0, "laptop work");
    // Same start instant on a different device is a different run.
    run(&mut phone, &mut phone_engine, &phone_clock, 10.0, "phone work");

    let laptop_json = laptop.export_all_json(T0).unwrap();
    let phone_json = phone.export_all_json(T0).unwrap();

    let summary = laptop.import_merge([phone_json.clone(), laptop_json]).unwrap();
    assert_eq!(summary.parsed, 2);
    assert_eq!(summary.added, 1);
    assert_eq!(summary.total, 2);

    // Ties on start order by id, so both devices see the same sequence.
    phone
        .import_merge([laptop.export_all_json(T0).unwrap()])
        .unwrap();
    let laptop_ids: Vec<_> = laptop.list_all().iter().map(|r| &r.id).collect();
    let phone_ids: Vec<_> = phone.list_all().iter().map(|r| &r.id).collect();
    assert_eq!(laptop_ids, phone_ids);

    let payload: ExportPayload = serde_json::from_str(&phone_json).unwrap();
    assert_eq!(payload.schema, EXPORT_SCHEMA);
    assert_eq!(payload.device_id, phone.device_id());
}

#[test]
fn malformed_source_is_skipped_and_counted() {
    let (mut records, mut engine, clock) = device();
    run(&mut records, &mut engine, &clock, 25.0, "existing");
    let existing = serde_json::to_value(&records.list_all()[0]).unwrap();
    let previous = records.len();

    let well_formed = json!({
        "schema": EXPORT_SCHEMA,
        "exported_at_ms": T0,
        "device_id": "other",
        "records": [
            existing,
            {"id": "other_1", "device_id": "other", "date_key": "2026-10-18", "start_ms": T0 - 86_400_000, "end_ms": T0 - 86_000_000, "note": "x"},
            {"id": "other_2", "device_id": "other", "date_key": "2026-10-20", "start_ms": T0 + 86_400_000, "end_ms": T0 + 86_500_000, "note": "y", "unknown": 1}
        ]
    })
    .to_string();

    let summary = records
        .import_merge([well_formed, "{{ definitely not json".to_string()])
        .unwrap();
    assert_eq!(summary.sources, 2);
    assert_eq!(summary.parsed, 1);
    assert_eq!(summary.added, 2);
    assert_eq!(summary.total, previous + 2);

    let dates: Vec<_> = records.list_all().iter().map(|r| r.date_key.as_str()).collect();
    assert_eq!(dates, ["2026-10-18", "2026-10-19", "2026-10-20"]);
}

#[test]
fn merged_log_is_persisted() {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let mut records = RecordStore::open(store.clone(), Zone::utc(), Locale::En).unwrap();
    let bare = json!([{"id": "x_1", "start_ms": 1}, {"id": "x_2", "start_ms": 2}]);
    records.import_merge([bare]).unwrap();

    let reopened = RecordStore::open(store, Zone::utc(), Locale::En).unwrap();
    assert_eq!(reopened.len(), 2);
}

#[tokio::test]
async fn import_files_counts_unreadable_files() {
    let dir = tempfile::TempDir::new().unwrap();
    let (mut records, mut engine, clock) = device();
    run(&mut records, &mut engine, &clock, 1.0, "a");

    let export_path = dir.path().join("all.json");
    pomolog_core::records::write_export(&export_path, &records.export_all_json(T0).unwrap())
        .await
        .unwrap();

    let (mut other, _, _) = device();
    let summary = other
        .import_files(&[export_path, dir.path().join("missing.json")])
        .await
        .unwrap();
    assert_eq!(summary.sources, 2);
    assert_eq!(summary.parsed, 1);
    assert_eq!(summary.added, 1);
    assert_eq!(other.list_all()[0].note, "a");
}
