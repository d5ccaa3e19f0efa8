//! Tests for the working-hours template, in particular that values loaded
//! from JSON pass through the same validation as the constructors.

use chrono::{NaiveTime, Weekday};
use slot_engine::{ScheduleError, WorkingHours, WorkingHoursRule};

fn t(h: u32, min: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, min, 0).unwrap()
}

// ── Constructors ─────────────────────────────────────────────────────────────

#[test]
fn open_rejects_inverted_day() {
    let err = WorkingHoursRule::open(Weekday::Mon, t(17, 0), t(9, 0)).unwrap_err();
    assert!(matches!(err, ScheduleError::Configuration(_)));
}

#[test]
fn with_break_rejects_window_outside_hours() {
    let rule = WorkingHoursRule::open(Weekday::Mon, t(9, 0), t(17, 0)).unwrap();
    assert!(rule.with_break(t(18, 0), t(19, 0)).is_err());

    let rule = WorkingHoursRule::open(Weekday::Mon, t(9, 0), t(17, 0)).unwrap();
    assert!(rule.with_break(t(12, 0), t(12, 0)).is_err(), "empty break");
}

#[test]
fn new_rejects_duplicate_weekday() {
    let a = WorkingHoursRule::open(Weekday::Mon, t(9, 0), t(17, 0)).unwrap();
    let b = WorkingHoursRule::closed(Weekday::Mon);
    let err = WorkingHours::new(vec![a, b]).unwrap_err();
    assert!(matches!(err, ScheduleError::Configuration(_)));
}

// ── Deserialization ──────────────────────────────────────────────────────────

#[test]
fn deserialized_rule_is_validated() {
    let inverted = serde_json::json!({
        "weekday": "Mon", "enabled": true, "start": "17:00:00", "end": "09:00:00"
    });
    let err = serde_json::from_value::<WorkingHoursRule>(inverted).unwrap_err();
    assert!(err.to_string().contains("start < end"), "{err}");

    let stray_break = serde_json::json!({
        "weekday": "Tue", "enabled": true, "start": "09:00:00", "end": "17:00:00",
        "break_window": { "start": "18:00:00", "end": "19:00:00" }
    });
    assert!(serde_json::from_value::<WorkingHoursRule>(stray_break).is_err());
}

#[test]
fn deserialized_disabled_rule_cannot_carry_a_break() {
    let value = serde_json::json!({
        "weekday": "Sat", "enabled": false, "start": "00:00:00", "end": "00:00:00",
        "break_window": { "start": "12:00:00", "end": "13:00:00" }
    });
    assert!(serde_json::from_value::<WorkingHoursRule>(value).is_err());
}

#[test]
fn deserialized_week_rejects_duplicate_weekday() {
    let value = serde_json::json!({
        "rules": [
            { "weekday": "Mon", "enabled": true, "start": "09:00:00", "end": "17:00:00" },
            { "weekday": "Mon", "enabled": true, "start": "10:00:00", "end": "16:00:00" }
        ]
    });
    let err = serde_json::from_value::<WorkingHours>(value).unwrap_err();
    assert!(err.to_string().contains("duplicate"), "{err}");
}

#[test]
fn standard_week_round_trips() {
    let hours = WorkingHours::standard();
    let json = serde_json::to_string(&hours).unwrap();
    let back: WorkingHours = serde_json::from_str(&json).unwrap();
    assert_eq!(back, hours);
}
