//! In-memory schedule index for a single clinician.
//!
//! Entries are kept in an id-keyed arena with a per-date index for range
//! queries; manual slot overrides live in a sparse map beside them. The write
//! boundary enforces the engine's central invariant: no two non-cancelled
//! entries may occupy intersecting time unless the caller explicitly forces
//! the overlap.
//!
//! The store has no interior mutability. Mutating methods take `&mut self`,
//! so in-process use is single-writer by construction; callers that share a
//! store across threads must serialize writers themselves (a mutex or a
//! per-clinician actor).

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Result, ScheduleError};

/// Minute-of-day for a time, ignoring seconds.
///
/// All interval arithmetic in the engine happens in minute-of-day space so
/// that adding a duration can never wrap past midnight unnoticed.
pub(crate) fn minute_of_day(time: NaiveTime) -> i64 {
    i64::from(time.hour()) * 60 + i64::from(time.minute())
}

/// What a schedule entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryKind {
    Appointment,
    Block,
}

/// Lifecycle status of an entry.
///
/// Appointments move `Pending → Confirmed → Completed`, with `Cancelled` and
/// `NoShow` terminal. Administrative blocks are always `Blocked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
    Blocked,
}

/// Why an administrative block exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockReason {
    Lunch,
    Surgery,
    Personal,
}

/// Manual per-slot annotation set by staff.
///
/// Takes precedence over the working-hours default for that instant, but
/// never over an entry occupying it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverrideState {
    Available,
    Blocked,
    Break,
}

/// A scheduled appointment or administrative block.
///
/// `(date, start_time, duration_minutes)` defines the half-open interval
/// `[start, start + duration)`. Date and time are never edited in place —
/// a reschedule cancels this entry and creates a new one, preserving audit
/// history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: Uuid,
    pub kind: EntryKind,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: u32,
    pub status: EntryStatus,
    /// Patient reference; appointments only.
    pub patient_id: Option<Uuid>,
    /// Appointment type label (e.g. "consultation"); appointments only.
    pub appointment_type: Option<String>,
    /// Reason for the block; blocks only.
    pub block_reason: Option<BlockReason>,
    /// Set on the cancelled side of a reschedule, pointing at the
    /// replacement entry.
    pub rescheduled_to: Option<Uuid>,
}

impl ScheduleEntry {
    /// Create a pending appointment.
    ///
    /// # Errors
    /// Returns `ScheduleError::Configuration` if the duration is zero or the
    /// interval would cross midnight.
    pub fn appointment(
        date: NaiveDate,
        start_time: NaiveTime,
        duration_minutes: u32,
        patient_id: Uuid,
        appointment_type: impl Into<String>,
    ) -> Result<Self> {
        validate_interval(date, start_time, duration_minutes)?;
        Ok(Self {
            id: Uuid::new_v4(),
            kind: EntryKind::Appointment,
            date,
            start_time,
            duration_minutes,
            status: EntryStatus::Pending,
            patient_id: Some(patient_id),
            appointment_type: Some(appointment_type.into()),
            block_reason: None,
            rescheduled_to: None,
        })
    }

    /// Create an administrative block.
    ///
    /// # Errors
    /// Returns `ScheduleError::Configuration` if the duration is zero or the
    /// interval would cross midnight.
    pub fn block(
        date: NaiveDate,
        start_time: NaiveTime,
        duration_minutes: u32,
        reason: BlockReason,
    ) -> Result<Self> {
        validate_interval(date, start_time, duration_minutes)?;
        Ok(Self {
            id: Uuid::new_v4(),
            kind: EntryKind::Block,
            date,
            start_time,
            duration_minutes,
            status: EntryStatus::Blocked,
            patient_id: None,
            appointment_type: None,
            block_reason: Some(reason),
            rescheduled_to: None,
        })
    }

    /// Start of the interval in minute-of-day space.
    pub fn start_minute(&self) -> i64 {
        minute_of_day(self.start_time)
    }

    /// Exclusive end of the interval in minute-of-day space.
    pub fn end_minute(&self) -> i64 {
        self.start_minute() + i64::from(self.duration_minutes)
    }

    /// Whether this entry still occupies its time. Cancelled entries do not.
    pub fn is_active(&self) -> bool {
        self.status != EntryStatus::Cancelled
    }

    /// Whether the half-open interval covers the given instant.
    pub fn covers(&self, time: NaiveTime) -> bool {
        let m = minute_of_day(time);
        self.start_minute() <= m && m < self.end_minute()
    }

    /// Whether two entries on the same date intersect in time.
    ///
    /// Adjacent entries (one ends exactly when the other starts) do NOT
    /// overlap.
    pub fn overlaps(&self, other: &ScheduleEntry) -> bool {
        self.date == other.date
            && self.start_minute() < other.end_minute()
            && other.start_minute() < self.end_minute()
    }
}

fn validate_interval(date: NaiveDate, start_time: NaiveTime, duration_minutes: u32) -> Result<()> {
    if duration_minutes == 0 {
        return Err(ScheduleError::Configuration(format!(
            "entry on {} at {} must have a positive duration",
            date, start_time
        )));
    }
    if minute_of_day(start_time) + i64::from(duration_minutes) > 24 * 60 {
        return Err(ScheduleError::Configuration(format!(
            "entry on {} at {} for {} minutes crosses midnight",
            date, start_time, duration_minutes
        )));
    }
    Ok(())
}

/// In-memory index of entries and overrides for one clinician's calendar.
#[derive(Debug, Clone, Default)]
pub struct ScheduleStore {
    entries: HashMap<Uuid, ScheduleEntry>,
    /// Per-date index, ids in insertion order (the tie-break for sorting).
    by_date: BTreeMap<NaiveDate, Vec<Uuid>>,
    overrides: HashMap<(NaiveDate, NaiveTime), OverrideState>,
}

impl ScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries on `date`, sorted by start time; ties keep insertion
    /// order (stable).
    pub fn entries_for(&self, date: NaiveDate) -> Vec<&ScheduleEntry> {
        let mut entries: Vec<&ScheduleEntry> = self
            .by_date
            .get(&date)
            .map(|ids| ids.iter().filter_map(|id| self.entries.get(id)).collect())
            .unwrap_or_default();
        entries.sort_by_key(|e| e.start_minute());
        entries
    }

    /// Look up an entry by id.
    pub fn entry(&self, id: Uuid) -> Option<&ScheduleEntry> {
        self.entries.get(&id)
    }

    /// Number of entries in the store (all dates, all statuses).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The manual override for an instant, if any.
    pub fn override_for(&self, date: NaiveDate, time: NaiveTime) -> Option<OverrideState> {
        self.overrides.get(&(date, time)).copied()
    }

    /// Insert or update an entry, enforcing the overlap invariant.
    ///
    /// An active (non-cancelled) entry is rejected when its interval
    /// intersects any other active entry on the same date, unless
    /// `allow_overlap` is set (admin/override paths only). Cancelled entries
    /// occupy no time and are always accepted.
    ///
    /// # Errors
    /// Returns `ScheduleError::Overlap` naming the first conflicting entry,
    /// or `ScheduleError::Configuration` for a zero/overflowing duration.
    pub fn upsert_entry(&mut self, entry: ScheduleEntry, allow_overlap: bool) -> Result<()> {
        validate_interval(entry.date, entry.start_time, entry.duration_minutes)?;

        if entry.is_active() {
            let clash = self
                .entries_for(entry.date)
                .into_iter()
                .find(|other| other.id != entry.id && other.is_active() && other.overlaps(&entry));
            if let Some(other) = clash {
                if allow_overlap {
                    warn!(
                        entry_id = %entry.id,
                        existing_id = %other.id,
                        date = %entry.date,
                        "overlap forced by caller"
                    );
                } else {
                    return Err(ScheduleError::Overlap {
                        existing: other.id,
                        date: entry.date,
                        start: entry.start_time,
                    });
                }
            }
        }

        // Re-index if an update moved the entry to a different date.
        if let Some(previous) = self.entries.get(&entry.id) {
            if previous.date != entry.date {
                if let Some(ids) = self.by_date.get_mut(&previous.date) {
                    ids.retain(|id| *id != entry.id);
                }
                self.by_date.entry(entry.date).or_default().push(entry.id);
            }
        } else {
            self.by_date.entry(entry.date).or_default().push(entry.id);
        }

        debug!(entry_id = %entry.id, date = %entry.date, start = %entry.start_time, "entry upserted");
        self.entries.insert(entry.id, entry);
        Ok(())
    }

    /// Remove an entry entirely, returning it.
    ///
    /// # Errors
    /// Returns `ScheduleError::EntryNotFound` if the id is unknown.
    pub fn remove_entry(&mut self, id: Uuid) -> Result<ScheduleEntry> {
        let entry = self
            .entries
            .remove(&id)
            .ok_or(ScheduleError::EntryNotFound(id))?;
        if let Some(ids) = self.by_date.get_mut(&entry.date) {
            ids.retain(|i| *i != id);
        }
        debug!(entry_id = %id, date = %entry.date, "entry removed");
        Ok(entry)
    }

    /// Set a manual override for an instant, replacing any previous one.
    pub fn set_override(&mut self, date: NaiveDate, time: NaiveTime, state: OverrideState) {
        debug!(%date, %time, ?state, "override set");
        self.overrides.insert((date, time), state);
    }

    /// Clear the override for an instant, if present.
    pub fn clear_override(&mut self, date: NaiveDate, time: NaiveTime) {
        self.overrides.remove(&(date, time));
    }

    /// Mutable access for same-crate status transitions. Date/time must not
    /// be edited through this handle (it would bypass the overlap check and
    /// the date index).
    pub(crate) fn entry_mut(&mut self, id: Uuid) -> Option<&mut ScheduleEntry> {
        self.entries.get_mut(&id)
    }
}
