//! Property tests for countdown durations.

use std::sync::Arc;

use pomolog_core::{Locale, ManualClock, MemoryStore, RecordStore, TimerEngine, Zone};
use proptest::prelude::*;

proptest! {
    #[test]
    fn start_then_query_matches_whole_seconds(minutes in 0.001f64..600.0) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let mut engine = TimerEngine::new(store, clock);
        engine.start(minutes, "").unwrap();
        let expected = ((minutes * 60.0).floor() as u64).max(1);
        prop_assert_eq!(engine.query_remaining(), expected);
    }

    #[test]
    fn pause_resume_preserves_remaining(
        minutes in 1.0f64..120.0,
        elapsed_secs in 0i64..60,
        paused_secs in 0i64..100_000,
    ) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let mut engine = TimerEngine::new(store, clock.clone());
        engine.start(minutes, "").unwrap();
        clock.advance_secs(elapsed_secs);
        let before = engine.query_remaining();
        engine.pause().unwrap();
        clock.advance_secs(paused_secs);
        engine.resume().unwrap();
        prop_assert_eq!(engine.query_remaining(), before);
    }

    #[test]
    fn a_completed_run_is_recorded_exactly_once(minutes in 0.02f64..90.0, late_secs in 0i64..7_200) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let mut records = RecordStore::open(store.clone(), Zone::utc(), Locale::En).unwrap();
        let mut engine = TimerEngine::new(store, clock.clone());
        engine.start(minutes, "").unwrap();
        clock.advance_secs(engine.query_remaining() as i64 + late_secs);
        prop_assert!(engine.poll(&mut records).unwrap().is_some());
        prop_assert!(engine.finish(&mut records).unwrap().is_none());
        prop_assert!(engine.poll(&mut records).unwrap().is_none());
        prop_assert_eq!(records.len(), 1);
    }
}
