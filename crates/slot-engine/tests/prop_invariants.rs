//! Property-based tests for the engine's core invariants using proptest.
//!
//! These verify laws that should hold for *any* schedule shape, not just the
//! examples in the unit suites: half-open intervals, the overlap write
//! boundary, conflict idempotence, and the ranking contracts.

use chrono::{Days, NaiveDate, NaiveTime, Weekday};
use proptest::prelude::*;
use slot_engine::{
    classify, detect_day, suggest, ConflictConfig, RankerConfig, ScheduleEntry, ScheduleStore,
    SlotCriteria, SlotState, WorkingHours, WorkingHoursRule, SLOT_MINUTES,
};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Strategies — generate grid-aligned schedule shapes
// ---------------------------------------------------------------------------

/// Monday of the fixed test week.
fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 16).unwrap()
}

fn t(h: u32, min: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, min, 0).unwrap()
}

/// A template with every day open 08:00-18:00 and no break, so interval laws
/// are not masked by template boundaries.
fn wide_open_hours() -> WorkingHours {
    let weekdays = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];
    WorkingHours::new(
        weekdays
            .iter()
            .map(|&wd| WorkingHoursRule::open(wd, t(8, 0), t(18, 0)).unwrap())
            .collect(),
    )
    .unwrap()
}

/// Weekday offset 0..5 (Mon-Fri of the test week).
fn arb_day() -> impl Strategy<Value = NaiveDate> {
    (0u64..5).prop_map(|offset| monday().checked_add_days(Days::new(offset)).unwrap())
}

/// Grid-aligned start between 09:00 and 16:45.
fn arb_start() -> impl Strategy<Value = NaiveTime> {
    (9u32..=16, 0u32..4).prop_map(|(h, q)| t(h, q * 15))
}

fn arb_duration() -> impl Strategy<Value = u32> {
    prop_oneof![Just(15u32), Just(30), Just(45), Just(60)]
}

fn arb_entry() -> impl Strategy<Value = ScheduleEntry> {
    (arb_day(), arb_start(), arb_duration()).prop_map(|(date, start, duration)| {
        ScheduleEntry::appointment(date, start, duration, Uuid::new_v4(), "consultation").unwrap()
    })
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    /// Half-open interval law: the start instant of an entry is never open,
    /// the end instant is free again (absent any other constraint).
    #[test]
    fn half_open_interval_law(date in arb_day(), start in arb_start(), duration in arb_duration()) {
        let hours = wide_open_hours();
        let mut store = ScheduleStore::new();
        let entry = ScheduleEntry::appointment(date, start, duration, Uuid::new_v4(), "consultation").unwrap();
        let end_minute = entry.end_minute();
        store.upsert_entry(entry, false).unwrap();

        prop_assert_ne!(
            classify(&store, &hours, date, start).unwrap(),
            SlotState::Open,
            "start instant must be occupied"
        );

        let end = t((end_minute / 60) as u32, (end_minute % 60) as u32);
        prop_assert_eq!(
            classify(&store, &hours, date, end).unwrap(),
            SlotState::Open,
            "end instant must be free"
        );
    }

    /// No silent overlap: after any sequence of unforced upserts, no two
    /// active stored entries intersect.
    #[test]
    fn unforced_writes_never_overlap(entries in prop::collection::vec(arb_entry(), 1..10)) {
        let mut store = ScheduleStore::new();
        let mut accepted = 0usize;
        for entry in entries {
            if store.upsert_entry(entry, false).is_ok() {
                accepted += 1;
            }
        }
        prop_assert_eq!(store.len(), accepted);

        for offset in 0..5u64 {
            let date = monday().checked_add_days(Days::new(offset)).unwrap();
            let day = store.entries_for(date);
            for (i, a) in day.iter().enumerate() {
                for b in day.iter().skip(i + 1) {
                    prop_assert!(
                        !a.overlaps(b),
                        "stored entries {} and {} overlap",
                        a.id,
                        b.id
                    );
                }
            }
        }
    }

    /// Conflict detection is idempotent on unchanged state.
    #[test]
    fn detection_is_idempotent(entries in prop::collection::vec(arb_entry(), 0..10)) {
        let hours = WorkingHours::standard();
        let mut store = ScheduleStore::new();
        for entry in entries {
            store.upsert_entry(entry, true).unwrap();
        }

        let config = ConflictConfig::default();
        let first = detect_day(&store, &hours, &config, monday()).unwrap();
        let second = detect_day(&store, &hours, &config, monday()).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Ranking contracts: every candidate is open for its full duration, and
    /// the list obeys score-desc / (date, time)-asc ordering.
    #[test]
    fn ranking_validity_and_order(
        entries in prop::collection::vec(arb_entry(), 0..8),
        duration in arb_duration(),
    ) {
        let hours = WorkingHours::standard();
        let mut store = ScheduleStore::new();
        for entry in entries {
            store.upsert_entry(entry, true).unwrap();
        }

        let config = RankerConfig { max_results: 50, ..RankerConfig::default() };
        let criteria = SlotCriteria {
            from: monday(),
            to: monday().checked_add_days(Days::new(4)).unwrap(),
            duration_minutes: duration,
            appointment_type: "consultation".to_string(),
            patient_id: None,
        };
        let candidates = suggest(&store, &hours, &config, &criteria).unwrap();

        for candidate in &candidates {
            prop_assert!(candidate.score <= 100);
            let start_minute = candidate
                .start_time
                .signed_duration_since(t(0, 0))
                .num_minutes();
            let mut m = start_minute;
            while m < start_minute + i64::from(candidate.duration_minutes) {
                let instant = t((m / 60) as u32, (m % 60) as u32);
                prop_assert_eq!(
                    classify(&store, &hours, candidate.date, instant).unwrap(),
                    SlotState::Open
                );
                m += i64::from(SLOT_MINUTES);
            }
        }

        for pair in candidates.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            prop_assert!(
                a.score > b.score
                    || (a.score == b.score && (a.date, a.start_time) <= (b.date, b.start_time))
            );
        }
    }
}
