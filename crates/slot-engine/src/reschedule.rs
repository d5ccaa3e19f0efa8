//! Entry lifecycle transitions and the reschedule transaction.
//!
//! Statuses move `Pending → Confirmed → Completed`; `Cancelled` and `NoShow`
//! are terminal and reachable from `Pending` or `Confirmed`. Each transition
//! is a named function returning a `Result` — there are no silent state
//! flips.
//!
//! A reschedule never edits an entry's date or time in place. It validates
//! the target slot, cancels the old entry with a link to its replacement,
//! and inserts a fresh entry — all or nothing. The returned
//! [`RescheduleCompleted`] event is the boundary contract for the external
//! notification collaborator.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::conflict::{detect_day, ConflictConfig, Severity};
use crate::error::{Result, ScheduleError};
use crate::hours::WorkingHours;
use crate::resolver::span_is_open;
use crate::store::{EntryStatus, ScheduleEntry, ScheduleStore};

/// Emitted after a successful reschedule, for the notification collaborator
/// (patient SMS/email lives outside this engine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescheduleCompleted {
    pub old_entry_id: Uuid,
    pub new_entry_id: Uuid,
    pub patient_id: Option<Uuid>,
    pub old_date: NaiveDate,
    pub old_start_time: NaiveTime,
    pub new_date: NaiveDate,
    pub new_start_time: NaiveTime,
    pub duration_minutes: u32,
}

fn can_transition(from: EntryStatus, to: EntryStatus) -> bool {
    use EntryStatus::*;
    matches!(
        (from, to),
        (Pending, Confirmed)
            | (Confirmed, Completed)
            | (Pending, Cancelled)
            | (Confirmed, Cancelled)
            | (Pending, NoShow)
            | (Confirmed, NoShow)
    )
}

fn transition(store: &mut ScheduleStore, id: Uuid, to: EntryStatus) -> Result<()> {
    let entry = store
        .entry_mut(id)
        .ok_or(ScheduleError::EntryNotFound(id))?;
    if !can_transition(entry.status, to) {
        return Err(ScheduleError::InvalidTransition {
            from: entry.status,
            to,
        });
    }
    debug!(entry_id = %id, from = ?entry.status, ?to, "status transition");
    entry.status = to;
    Ok(())
}

/// `Pending → Confirmed`.
pub fn confirm(store: &mut ScheduleStore, id: Uuid) -> Result<()> {
    transition(store, id, EntryStatus::Confirmed)
}

/// `Confirmed → Completed`.
pub fn complete(store: &mut ScheduleStore, id: Uuid) -> Result<()> {
    transition(store, id, EntryStatus::Completed)
}

/// `Pending | Confirmed → Cancelled` (terminal).
pub fn cancel(store: &mut ScheduleStore, id: Uuid) -> Result<()> {
    transition(store, id, EntryStatus::Cancelled)
}

/// `Pending | Confirmed → NoShow` (terminal).
pub fn mark_no_show(store: &mut ScheduleStore, id: Uuid) -> Result<()> {
    transition(store, id, EntryStatus::NoShow)
}

/// Move an appointment to a new slot as a single logical transaction.
///
/// The target is validated first: every grid step of the new interval must
/// classify as open with the old entry lifted out of the way, and inserting
/// the replacement must not produce any high-severity conflict. Only then is
/// the old entry marked cancelled (linked to its replacement) and the new
/// entry created with the same patient, type, and duration. On any failure
/// the store is left untouched.
///
/// The new entry starts `Pending` unless `confirm_immediately` is set.
///
/// # Errors
/// - `ScheduleError::EntryNotFound` — unknown `id`.
/// - `ScheduleError::InvalidTransition` — the entry is completed, cancelled,
///   a no-show, or a block.
/// - `ScheduleError::SlotUnavailable` — the target slot is not fully open or
///   would create a high-severity conflict.
pub fn reschedule(
    store: &mut ScheduleStore,
    hours: &WorkingHours,
    config: &ConflictConfig,
    id: Uuid,
    new_date: NaiveDate,
    new_time: NaiveTime,
    confirm_immediately: bool,
) -> Result<RescheduleCompleted> {
    let old = store
        .entry(id)
        .ok_or(ScheduleError::EntryNotFound(id))?
        .clone();
    if !can_transition(old.status, EntryStatus::Cancelled) {
        return Err(ScheduleError::InvalidTransition {
            from: old.status,
            to: EntryStatus::Cancelled,
        });
    }

    // Stage the whole transaction on a copy; the live store is only replaced
    // once every step has succeeded.
    let mut staged = store.clone();
    let mut cancelled = staged.remove_entry(id)?;

    if !span_is_open(&staged, hours, new_date, new_time, old.duration_minutes)? {
        return Err(ScheduleError::SlotUnavailable {
            date: new_date,
            time: new_time,
            reason: "target slot is not open for the full duration".to_string(),
        });
    }

    let mut replacement = old.clone();
    replacement.id = Uuid::new_v4();
    replacement.date = new_date;
    replacement.start_time = new_time;
    replacement.status = if confirm_immediately {
        EntryStatus::Confirmed
    } else {
        EntryStatus::Pending
    };
    replacement.rescheduled_to = None;
    let new_id = replacement.id;

    staged
        .upsert_entry(replacement, false)
        .map_err(|err| match err {
            ScheduleError::Overlap { .. } => ScheduleError::SlotUnavailable {
                date: new_date,
                time: new_time,
                reason: "target slot overlaps an existing entry".to_string(),
            },
            other => other,
        })?;

    let high_conflict = detect_day(&staged, hours, config, new_date)?
        .into_iter()
        .any(|c| c.severity == Severity::High && c.entry_ids.contains(&new_id));
    if high_conflict {
        return Err(ScheduleError::SlotUnavailable {
            date: new_date,
            time: new_time,
            reason: "moving here would create a high-severity conflict".to_string(),
        });
    }

    cancelled.status = EntryStatus::Cancelled;
    cancelled.rescheduled_to = Some(new_id);
    staged.upsert_entry(cancelled, false)?;

    *store = staged;
    info!(
        old_entry_id = %id,
        new_entry_id = %new_id,
        %new_date,
        %new_time,
        "reschedule completed"
    );
    Ok(RescheduleCompleted {
        old_entry_id: id,
        new_entry_id: new_id,
        patient_id: old.patient_id,
        old_date: old.date,
        old_start_time: old.start_time,
        new_date,
        new_start_time: new_time,
        duration_minutes: old.duration_minutes,
    })
}
