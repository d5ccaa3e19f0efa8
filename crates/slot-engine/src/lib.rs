//! # slot-engine
//!
//! Deterministic scheduling-availability core for clinician calendars:
//! classifies any instant as open/occupied/break/blocked/outside-hours,
//! detects scheduling conflicts, ranks candidate slots for booking, and
//! coordinates reschedules as auditable state transitions.
//!
//! The engine is pure and in-memory. Persistence, notifications, and UI are
//! external collaborators that feed it [`store::ScheduleEntry`] data and
//! consume its [`conflict::Conflict`], [`ranker::CandidateSlot`], and
//! [`reschedule::RescheduleCompleted`] outputs.
//!
//! ## Modules
//!
//! - [`hours`] — weekly working-hours template with optional break windows
//! - [`store`] — entry/override index with the overlap-rejecting write boundary
//! - [`resolver`] — instant classification (entry > override > template)
//! - [`conflict`] — overlap, double-booking, buffer, break, and overload scans
//! - [`ranker`] — conflict-free candidate enumeration and heuristic scoring
//! - [`reschedule`] — status state machine and the reschedule transaction
//! - [`error`] — error types

pub mod conflict;
pub mod error;
pub mod hours;
pub mod ranker;
pub mod reschedule;
pub mod resolver;
pub mod store;

pub use conflict::{detect_day, detect_week, Conflict, ConflictConfig, ConflictKind, Severity};
pub use error::{Result, ScheduleError};
pub use hours::{BreakWindow, WorkingHours, WorkingHoursRule};
pub use ranker::{suggest, CandidateSlot, RankerConfig, SlotCriteria};
pub use reschedule::{
    cancel, complete, confirm, mark_no_show, reschedule, RescheduleCompleted,
};
pub use resolver::{classify, slot_starts, span_is_open, SlotState, SLOT_MINUTES};
pub use store::{
    BlockReason, EntryKind, EntryStatus, OverrideState, ScheduleEntry, ScheduleStore,
};
