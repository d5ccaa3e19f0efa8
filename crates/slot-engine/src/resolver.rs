//! Availability classification — the single source of truth for what any
//! instant on the calendar means.
//!
//! Precedence, first match wins: an entry occupying the instant, then a
//! manual override, then the working-hours template. All comparisons are
//! half-open: an instant equal to an interval's end is outside it.
//!
//! Classification is pure — same store, overrides, and template always yield
//! the same answer. There are no hidden clock reads.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::hours::{WorkingHours, WorkingHoursRule};
use crate::store::{minute_of_day, OverrideState, ScheduleStore};

/// Grid resolution shared by the resolver and the slot ranker. Candidate
/// enumeration and full-duration validation both step at this granularity.
pub const SLOT_MINUTES: u32 = 15;

/// The state of a single instant on the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "state", content = "entry_id")]
pub enum SlotState {
    Open,
    /// Covered by a non-cancelled entry (appointment or block).
    Occupied(Uuid),
    Break,
    OutsideHours,
    Blocked,
}

/// Classify one `(date, time)` instant.
///
/// 1. A non-cancelled entry covering the instant wins outright.
/// 2. Otherwise a manual override applies: `blocked` → [`SlotState::Blocked`],
///    `break` → [`SlotState::Break`]. An `available` override falls through
///    to the template — it can re-open an in-hours instant (e.g. one inside
///    the break window) but never extends the working day.
/// 3. Otherwise the working-hours rule decides: disabled day or instant
///    outside `[start, end)` → [`SlotState::OutsideHours`]; inside the break
///    window → [`SlotState::Break`]; else [`SlotState::Open`].
///
/// # Errors
/// Returns `ScheduleError::Configuration` when the date's weekday has no
/// working-hours rule.
pub fn classify(
    store: &ScheduleStore,
    hours: &WorkingHours,
    date: NaiveDate,
    time: NaiveTime,
) -> Result<SlotState> {
    if let Some(entry) = store
        .entries_for(date)
        .into_iter()
        .find(|e| e.is_active() && e.covers(time))
    {
        return Ok(SlotState::Occupied(entry.id));
    }

    let force_open_in_hours = match store.override_for(date, time) {
        Some(OverrideState::Blocked) => return Ok(SlotState::Blocked),
        Some(OverrideState::Break) => return Ok(SlotState::Break),
        Some(OverrideState::Available) => true,
        None => false,
    };

    let rule = hours.rule_for(date)?;
    if !rule.enabled {
        return Ok(SlotState::OutsideHours);
    }

    let m = minute_of_day(time);
    let in_hours = minute_of_day(rule.start) <= m && m < minute_of_day(rule.end);
    if !in_hours {
        return Ok(SlotState::OutsideHours);
    }
    if force_open_in_hours {
        return Ok(SlotState::Open);
    }
    if let Some(bw) = &rule.break_window {
        if minute_of_day(bw.start) <= m && m < minute_of_day(bw.end) {
            return Ok(SlotState::Break);
        }
    }
    Ok(SlotState::Open)
}

/// Whether the whole of `[start, start + duration)` is open.
///
/// Entries are checked by direct interval intersection, so an entry at an
/// off-grid offset (e.g. 10:20-10:40) cannot slip between probes. Template
/// and override boundaries are then sampled at every grid step plus the
/// final minute of the span, which catches working hours or break windows
/// that do not end on the grid.
pub fn span_is_open(
    store: &ScheduleStore,
    hours: &WorkingHours,
    date: NaiveDate,
    start: NaiveTime,
    duration_minutes: u32,
) -> Result<bool> {
    if duration_minutes == 0 {
        return Ok(true);
    }
    let start_m = minute_of_day(start);
    let end_m = start_m + i64::from(duration_minutes);
    if end_m > 24 * 60 {
        return Ok(false);
    }

    let occupied = store
        .entries_for(date)
        .into_iter()
        .any(|e| e.is_active() && e.start_minute() < end_m && start_m < e.end_minute());
    if occupied {
        return Ok(false);
    }

    let mut m = start_m;
    while m < end_m {
        // Safe: m < 1440 here.
        let time = time_from_minute(m);
        if classify(store, hours, date, time)? != SlotState::Open {
            return Ok(false);
        }
        m += i64::from(SLOT_MINUTES);
    }
    if classify(store, hours, date, time_from_minute(end_m - 1))? != SlotState::Open {
        return Ok(false);
    }
    Ok(true)
}

/// Iterate the grid-aligned slot starts of a rule's working day.
/// Empty for disabled rules.
pub fn slot_starts(rule: &WorkingHoursRule) -> impl Iterator<Item = NaiveTime> + '_ {
    let (start_m, end_m) = if rule.enabled {
        (minute_of_day(rule.start), minute_of_day(rule.end))
    } else {
        (0, 0)
    };
    (start_m..end_m)
        .step_by(SLOT_MINUTES as usize)
        .map(time_from_minute)
}

/// Convert a minute-of-day back to a `NaiveTime`. Caller guarantees
/// `0 <= minute < 1440`.
pub(crate) fn time_from_minute(minute: i64) -> NaiveTime {
    NaiveTime::from_hms_opt((minute / 60) as u32, (minute % 60) as u32, 0)
        .expect("minute-of-day in range")
}
