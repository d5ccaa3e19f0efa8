//! Candidate slot enumeration and heuristic ranking.
//!
//! Every candidate returned by [`suggest`] is provably conflict-free: each
//! grid step of its full duration classifies as open. Scores are a heuristic
//! blend of four weighted factors (preferred time-of-day band, buffer
//! satisfaction, same-day load, earliness) summing to at most 100. Only the
//! ordering contract is load-bearing: higher score first, ties broken by
//! earlier date then earlier time.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::conflict::ConflictConfig;
use crate::error::{Result, ScheduleError};
use crate::hours::WorkingHours;
use crate::resolver::{slot_starts, span_is_open};
use crate::store::{minute_of_day, EntryKind, ScheduleEntry, ScheduleStore};

/// Maximum points per scoring factor.
const BAND_POINTS: i64 = 30;
const BUFFER_POINTS: i64 = 25;
const LOAD_POINTS: i64 = 25;
const EARLINESS_POINTS: i64 = 20;

/// Preferred time-of-day bands, minutes from midnight: mid-morning
/// (09:30-11:30) and mid-afternoon (14:00-16:00). The band score decays
/// linearly to zero two hours outside the nearest band.
const PREFERRED_BANDS: [(i64, i64); 2] = [(570, 690), (840, 960)];
const BAND_FALLOFF_MINUTES: i64 = 120;

/// What the caller is trying to book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotCriteria {
    /// Inclusive date range to search.
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub duration_minutes: u32,
    pub appointment_type: String,
    pub patient_id: Option<Uuid>,
}

/// Ranking knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankerConfig {
    /// Truncate the result to this many candidates.
    pub max_results: usize,
    /// Buffer and capacity thresholds shared with conflict detection.
    pub conflict: ConflictConfig,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            max_results: 5,
            conflict: ConflictConfig::default(),
        }
    }
}

/// A ranked, conflict-free proposal. Ephemeral, produced per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSlot {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: u32,
    /// 0-100.
    pub score: u32,
    /// Positive factors that contributed meaningfully.
    pub reasons: Vec<String>,
    /// Caveats; a candidate with warnings is still bookable.
    pub warnings: Vec<String>,
    pub buffer_satisfied: bool,
}

/// Enumerate and rank open slots matching `criteria`.
///
/// Candidates are generated on the shared scheduling grid; any slot whose
/// tail crosses a non-open instant is rejected outright. Survivors are
/// scored, sorted (score desc, then date asc, then time asc), and truncated
/// to `config.max_results`.
///
/// # Errors
/// Returns `ScheduleError::InvalidRange` when `criteria.to < criteria.from`,
/// `ScheduleError::Configuration` for a zero duration or a weekday without a
/// working-hours rule.
pub fn suggest(
    store: &ScheduleStore,
    hours: &WorkingHours,
    config: &RankerConfig,
    criteria: &SlotCriteria,
) -> Result<Vec<CandidateSlot>> {
    if criteria.to < criteria.from {
        return Err(ScheduleError::InvalidRange {
            start: criteria.from,
            end: criteria.to,
        });
    }
    if criteria.duration_minutes == 0 {
        return Err(ScheduleError::Configuration(
            "requested duration must be positive".to_string(),
        ));
    }

    let mut candidates = Vec::new();
    let mut date = criteria.from;
    let mut day_offset: i64 = 0;
    while date <= criteria.to {
        let rule = hours.rule_for(date)?;
        if rule.enabled {
            let day_entries: Vec<ScheduleEntry> = store
                .entries_for(date)
                .into_iter()
                .filter(|e| e.is_active())
                .cloned()
                .collect();
            let day_load: i64 = day_entries
                .iter()
                .filter(|e| e.kind == EntryKind::Appointment)
                .map(|e| i64::from(e.duration_minutes))
                .sum();

            for start in slot_starts(rule) {
                if !span_is_open(store, hours, date, start, criteria.duration_minutes)? {
                    continue;
                }
                candidates.push(score_candidate(
                    date,
                    start,
                    criteria.duration_minutes,
                    day_offset,
                    day_load,
                    &day_entries,
                    config,
                ));
            }
        }
        date = date.succ_opt().expect("date within chrono range");
        day_offset += 1;
    }

    candidates.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(a.date.cmp(&b.date))
            .then(a.start_time.cmp(&b.start_time))
    });
    candidates.truncate(config.max_results);
    Ok(candidates)
}

fn score_candidate(
    date: NaiveDate,
    start: NaiveTime,
    duration_minutes: u32,
    day_offset: i64,
    day_load: i64,
    day_entries: &[ScheduleEntry],
    config: &RankerConfig,
) -> CandidateSlot {
    let mut reasons = Vec::new();
    let mut warnings = Vec::new();

    let band = band_score(minute_of_day(start));
    if band >= BAND_POINTS / 2 {
        reasons.push("falls in a preferred time of day".to_string());
    }

    let buffer_satisfied = buffer_satisfied(
        start,
        duration_minutes,
        day_entries,
        i64::from(config.conflict.buffer_minutes),
    );
    let buffer = if buffer_satisfied {
        reasons.push("buffer preserved before and after".to_string());
        BUFFER_POINTS
    } else {
        warnings.push("no buffer time available next to an adjacent appointment".to_string());
        0
    };

    let capacity = i64::from(config.conflict.daily_capacity_minutes).max(1);
    let load_ratio = day_load.min(capacity) as f64 / capacity as f64;
    let load = (LOAD_POINTS as f64 * (1.0 - load_ratio)).round() as i64;
    if load >= LOAD_POINTS * 3 / 5 {
        reasons.push("light existing load that day".to_string());
    } else if day_load >= capacity {
        warnings.push("day is already at capacity".to_string());
    }

    let earliness = (EARLINESS_POINTS - 4 * day_offset).clamp(0, EARLINESS_POINTS);
    if day_offset == 0 {
        reasons.push("earliest available day".to_string());
    }

    let score = (band + buffer + load + earliness).clamp(0, 100) as u32;
    CandidateSlot {
        date,
        start_time: start,
        duration_minutes,
        score,
        reasons,
        warnings,
        buffer_satisfied,
    }
}

/// Distance-based band score: full points inside a preferred band, linear
/// falloff to zero `BAND_FALLOFF_MINUTES` away from the nearest band edge.
fn band_score(start_minute: i64) -> i64 {
    let distance = PREFERRED_BANDS
        .iter()
        .map(|&(lo, hi)| {
            if start_minute < lo {
                lo - start_minute
            } else if start_minute >= hi {
                start_minute - hi + 1
            } else {
                0
            }
        })
        .min()
        .unwrap_or(i64::MAX);
    if distance >= BAND_FALLOFF_MINUTES {
        0
    } else {
        BAND_POINTS * (BAND_FALLOFF_MINUTES - distance) / BAND_FALLOFF_MINUTES
    }
}

/// Whether the candidate keeps at least `buffer` idle minutes to its nearest
/// active appointment on each side. Having no neighbor on a side satisfies
/// that side.
fn buffer_satisfied(
    start: NaiveTime,
    duration_minutes: u32,
    day_entries: &[ScheduleEntry],
    buffer: i64,
) -> bool {
    let start_m = minute_of_day(start);
    let end_m = start_m + i64::from(duration_minutes);

    let gap_before = day_entries
        .iter()
        .filter(|e| e.kind == EntryKind::Appointment && e.end_minute() <= start_m)
        .map(|e| start_m - e.end_minute())
        .min();
    let gap_after = day_entries
        .iter()
        .filter(|e| e.kind == EntryKind::Appointment && e.start_minute() >= end_m)
        .map(|e| e.start_minute() - end_m)
        .min();

    gap_before.map_or(true, |g| g >= buffer) && gap_after.map_or(true, |g| g >= buffer)
}
