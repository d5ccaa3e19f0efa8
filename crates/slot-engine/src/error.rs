//! Error types for slot-engine operations.

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;
use uuid::Uuid;

use crate::store::EntryStatus;

#[derive(Error, Debug)]
pub enum ScheduleError {
    /// Missing or invalid working-hours configuration. Fatal to any
    /// classification for the affected weekday; never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A write was rejected because the entry's interval intersects an
    /// existing non-cancelled entry. Recoverable: re-present open slots.
    #[error("Entry overlaps existing entry {existing} on {date} at {start}")]
    Overlap {
        existing: Uuid,
        date: NaiveDate,
        start: NaiveTime,
    },

    /// A reschedule target failed validation. Recoverable: the caller
    /// should show alternatives from the slot ranker.
    #[error("Slot {date} {time} is unavailable: {reason}")]
    SlotUnavailable {
        date: NaiveDate,
        time: NaiveTime,
        reason: String,
    },

    /// The referenced entry does not exist in the store.
    #[error("Entry not found: {0}")]
    EntryNotFound(Uuid),

    /// The requested status transition is not allowed by the entry
    /// state machine.
    #[error("Invalid transition from {from:?} to {to:?}")]
    InvalidTransition { from: EntryStatus, to: EntryStatus },

    /// A date range where the end precedes the start.
    #[error("Invalid date range: {end} precedes {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
