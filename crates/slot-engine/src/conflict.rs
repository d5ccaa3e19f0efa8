//! Scan a day's (or week's) entries for scheduling-invariant violations.
//!
//! Each rule is evaluated independently — one pair of entries can trigger
//! several conflict types — except that a double-booking (appointment vs
//! appointment) replaces the generic overlap report for that pair: the more
//! specific finding wins.
//!
//! Detection is idempotent and order-independent: conflicts are derived
//! fresh on every call and returned sorted by severity (high first), then
//! date, then start time.

use chrono::{Days, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::hours::WorkingHours;
use crate::store::{minute_of_day, EntryKind, ScheduleEntry, ScheduleStore};

/// How serious a conflict is. Ordering is `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictKind {
    /// Two non-cancelled entries with intersecting intervals.
    Overlap,
    /// Overlap where both entries are appointments.
    DoubleBooking,
    /// Back-to-back appointments closer than the configured buffer.
    NoBuffer,
    /// An appointment intersecting the day's break window.
    BreakViolation,
    /// Total scheduled minutes exceed the daily capacity.
    Overload,
}

/// A detected violation. Ephemeral — recomputed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub kind: ConflictKind,
    pub severity: Severity,
    pub date: NaiveDate,
    /// Start of the earliest offending entry (used for ordering and display).
    pub start_time: NaiveTime,
    pub entry_ids: Vec<Uuid>,
    pub message: String,
    /// Advisory text only, never executed.
    pub remedy: String,
}

/// Detection thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictConfig {
    /// Minimum idle minutes required between consecutive appointments.
    pub buffer_minutes: u32,
    /// Maximum scheduled appointment minutes per day.
    pub daily_capacity_minutes: u32,
}

impl Default for ConflictConfig {
    fn default() -> Self {
        Self {
            buffer_minutes: 10,
            daily_capacity_minutes: 480,
        }
    }
}

/// Scan all entries on `date` and report every conflict found.
///
/// # Errors
/// Returns `ScheduleError::Configuration` when the date's weekday has no
/// working-hours rule (the break-violation check needs the template).
pub fn detect_day(
    store: &ScheduleStore,
    hours: &WorkingHours,
    config: &ConflictConfig,
    date: NaiveDate,
) -> Result<Vec<Conflict>> {
    let active: Vec<&ScheduleEntry> = store
        .entries_for(date)
        .into_iter()
        .filter(|e| e.is_active())
        .collect();

    let mut conflicts = Vec::new();

    // Overlap / double-booking: pairwise over active entries.
    for (i, a) in active.iter().enumerate() {
        for b in active.iter().skip(i + 1) {
            if !a.overlaps(b) {
                continue;
            }
            let both_appointments =
                a.kind == EntryKind::Appointment && b.kind == EntryKind::Appointment;
            let overlap_start = a.start_minute().max(b.start_minute());
            let overlap_end = a.end_minute().min(b.end_minute());
            let (kind, message, remedy) = if both_appointments {
                (
                    ConflictKind::DoubleBooking,
                    format!(
                        "Two appointments occupy the same time ({} overlapping minutes)",
                        overlap_end - overlap_start
                    ),
                    "Reschedule one appointment to an open slot".to_string(),
                )
            } else {
                (
                    ConflictKind::Overlap,
                    format!(
                        "Entry overlaps a blocked period ({} overlapping minutes)",
                        overlap_end - overlap_start
                    ),
                    "Move the appointment outside the blocked period".to_string(),
                )
            };
            conflicts.push(Conflict {
                kind,
                severity: Severity::High,
                date,
                start_time: a.start_time.min(b.start_time),
                entry_ids: vec![a.id, b.id],
                message,
                remedy,
            });
        }
    }

    // No-buffer: consecutive appointments with a gap shorter than the buffer.
    // Overlapping pairs are already reported above and are skipped here.
    let appointments: Vec<&&ScheduleEntry> = active
        .iter()
        .filter(|e| e.kind == EntryKind::Appointment)
        .collect();
    for pair in appointments.windows(2) {
        let (cur, next) = (pair[0], pair[1]);
        let gap = next.start_minute() - cur.end_minute();
        if (0..i64::from(config.buffer_minutes)).contains(&gap) {
            conflicts.push(Conflict {
                kind: ConflictKind::NoBuffer,
                severity: Severity::Medium,
                date,
                start_time: cur.start_time,
                entry_ids: vec![cur.id, next.id],
                message: format!(
                    "Only {} minutes between consecutive appointments ({} required)",
                    gap, config.buffer_minutes
                ),
                remedy: format!("Add at least {} minutes of buffer", config.buffer_minutes),
            });
        }
    }

    // Break violation: appointments intersecting the day's break window.
    let rule = hours.rule_for(date)?;
    if let Some(bw) = rule.break_window.filter(|_| rule.enabled) {
        let (break_start, break_end) = (minute_of_day(bw.start), minute_of_day(bw.end));
        for entry in appointments.iter() {
            if entry.start_minute() < break_end && break_start < entry.end_minute() {
                conflicts.push(Conflict {
                    kind: ConflictKind::BreakViolation,
                    severity: Severity::Medium,
                    date,
                    start_time: entry.start_time,
                    entry_ids: vec![entry.id],
                    message: format!(
                        "Appointment at {} runs into the break window {}-{}",
                        entry.start_time, bw.start, bw.end
                    ),
                    remedy: "Reschedule outside the break window".to_string(),
                });
            }
        }
    }

    // Overload: one conflict per day at most.
    let scheduled: i64 = appointments.iter().map(|e| i64::from(e.duration_minutes)).sum();
    if scheduled > i64::from(config.daily_capacity_minutes) {
        let earliest = appointments
            .first()
            .map(|e| e.start_time)
            .unwrap_or_else(|| NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        conflicts.push(Conflict {
            kind: ConflictKind::Overload,
            severity: Severity::Low,
            date,
            start_time: earliest,
            entry_ids: appointments.iter().map(|e| e.id).collect(),
            message: format!(
                "{} scheduled minutes exceed the daily capacity of {}",
                scheduled, config.daily_capacity_minutes
            ),
            remedy: "Move an appointment to a lighter day".to_string(),
        });
    }

    sort_conflicts(&mut conflicts);
    debug!(%date, count = conflicts.len(), "conflict scan complete");
    Ok(conflicts)
}

/// Scan `week_start` and the following six days.
///
/// # Errors
/// Propagates the first `ScheduleError::Configuration` from any day's scan.
pub fn detect_week(
    store: &ScheduleStore,
    hours: &WorkingHours,
    config: &ConflictConfig,
    week_start: NaiveDate,
) -> Result<Vec<Conflict>> {
    let mut conflicts = Vec::new();
    for offset in 0..7 {
        let date = week_start
            .checked_add_days(Days::new(offset))
            .expect("date within chrono range");
        conflicts.extend(detect_day(store, hours, config, date)?);
    }
    sort_conflicts(&mut conflicts);
    Ok(conflicts)
}

/// Severity desc, then date asc, then start time asc. Stable, so equal keys
/// keep generation order and repeated scans return identical lists.
fn sort_conflicts(conflicts: &mut [Conflict]) {
    conflicts.sort_by_key(|c| (std::cmp::Reverse(c.severity), c.date, c.start_time));
}
