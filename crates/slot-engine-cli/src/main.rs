//! `slotcal` CLI — classify slots, scan for conflicts, and suggest openings
//! from a JSON calendar file.
//!
//! ## Usage
//!
//! ```sh
//! # Classify a single instant
//! slotcal classify -i clinic.json --date 2026-03-16 --time 12:30
//!
//! # Scan one day (or the week starting that day) for conflicts
//! slotcal conflicts -i clinic.json --date 2026-03-16
//! slotcal conflicts -i clinic.json --date 2026-03-16 --week
//!
//! # Rank open 30-minute consultation slots across a date range
//! slotcal suggest -i clinic.json --from 2026-03-16 --to 2026-03-20 \
//!     --duration 30 --type consultation
//! ```
//!
//! The calendar file holds entries and overrides; when it carries no
//! `working_hours` section, the standard clinic week (Mon-Fri 09:00-17:00,
//! break 12:00-13:00) applies. Pass `--json` for machine-readable output.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::io::Read;

use slot_engine::{
    classify, detect_day, detect_week, suggest, ConflictConfig, OverrideState, RankerConfig,
    ScheduleEntry, ScheduleStore, SlotCriteria, SlotState, WorkingHours,
};

#[derive(Parser)]
#[command(name = "slotcal", version, about = "Clinic scheduling engine CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Emit JSON instead of human-readable lines
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify one (date, time) instant
    Classify {
        /// Calendar file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Date, e.g. 2026-03-16
        #[arg(long)]
        date: NaiveDate,
        /// Time of day, e.g. 12:30
        #[arg(long, value_parser = parse_time)]
        time: NaiveTime,
    },
    /// Detect scheduling conflicts for a day or a week
    Conflicts {
        /// Calendar file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Date to scan (with --week: the first of seven days)
        #[arg(long)]
        date: NaiveDate,
        /// Scan the whole week starting at --date
        #[arg(long)]
        week: bool,
        /// Required buffer between appointments, minutes
        #[arg(long, default_value_t = 10)]
        buffer: u32,
        /// Daily capacity, scheduled minutes
        #[arg(long, default_value_t = 480)]
        capacity: u32,
    },
    /// Rank open candidate slots for a new appointment
    Suggest {
        /// Calendar file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// First date of the search range
        #[arg(long)]
        from: NaiveDate,
        /// Last date of the search range (inclusive)
        #[arg(long)]
        to: NaiveDate,
        /// Appointment duration in minutes
        #[arg(long)]
        duration: u32,
        /// Appointment type label
        #[arg(long = "type")]
        appointment_type: String,
        /// Number of candidates to return
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
}

/// On-disk calendar document. Entries that overlap are loaded as-is so the
/// conflicts command can report them.
#[derive(Debug, Deserialize)]
struct CalendarFile {
    #[serde(default)]
    working_hours: Option<WorkingHours>,
    #[serde(default)]
    entries: Vec<ScheduleEntry>,
    #[serde(default)]
    overrides: Vec<OverrideRecord>,
}

#[derive(Debug, Deserialize)]
struct OverrideRecord {
    date: NaiveDate,
    time: NaiveTime,
    state: OverrideState,
}

fn parse_time(raw: &str) -> std::result::Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| format!("invalid time '{raw}', expected HH:MM"))
}

fn load_calendar(input: Option<&str>) -> Result<(ScheduleStore, WorkingHours)> {
    let raw = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read calendar file {path}"))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read calendar from stdin")?;
            buf
        }
    };
    let file: CalendarFile = serde_json::from_str(&raw).context("invalid calendar JSON")?;

    let hours = file.working_hours.unwrap_or_else(WorkingHours::standard);
    let mut store = ScheduleStore::new();
    for entry in file.entries {
        let id = entry.id;
        store
            .upsert_entry(entry, true)
            .with_context(|| format!("failed to load entry {id}"))?;
    }
    for record in file.overrides {
        store.set_override(record.date, record.time, record.state);
    }
    Ok((store, hours))
}

fn state_label(state: &SlotState) -> &'static str {
    match state {
        SlotState::Open => "open",
        SlotState::Occupied(_) => "occupied",
        SlotState::Break => "break",
        SlotState::OutsideHours => "outside-hours",
        SlotState::Blocked => "blocked",
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Classify { input, date, time } => {
            let (store, hours) = load_calendar(input.as_deref())?;
            let state = classify(&store, &hours, date, time)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&state)?);
            } else {
                match state {
                    SlotState::Occupied(id) => println!("{date} {time} -> occupied by {id}"),
                    other => println!("{date} {time} -> {}", state_label(&other)),
                }
            }
        }
        Commands::Conflicts {
            input,
            date,
            week,
            buffer,
            capacity,
        } => {
            let (store, hours) = load_calendar(input.as_deref())?;
            let config = ConflictConfig {
                buffer_minutes: buffer,
                daily_capacity_minutes: capacity,
            };
            let conflicts = if week {
                detect_week(&store, &hours, &config, date)?
            } else {
                detect_day(&store, &hours, &config, date)?
            };
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&conflicts)?);
            } else if conflicts.is_empty() {
                println!("no conflicts");
            } else {
                for c in &conflicts {
                    println!(
                        "{:?}\t{}\t{} {}\t{} ({})",
                        c.severity,
                        kind_label(c),
                        c.date,
                        c.start_time,
                        c.message,
                        c.remedy
                    );
                }
            }
        }
        Commands::Suggest {
            input,
            from,
            to,
            duration,
            appointment_type,
            limit,
        } => {
            let (store, hours) = load_calendar(input.as_deref())?;
            let config = RankerConfig {
                max_results: limit,
                ..RankerConfig::default()
            };
            let criteria = SlotCriteria {
                from,
                to,
                duration_minutes: duration,
                appointment_type,
                patient_id: None,
            };
            let candidates = suggest(&store, &hours, &config, &criteria)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&candidates)?);
            } else if candidates.is_empty() {
                println!("no open slots in range");
            } else {
                for (rank, c) in candidates.iter().enumerate() {
                    let flags = if c.buffer_satisfied { "" } else { " [tight]" };
                    println!(
                        "{}. {} {} ({} min, score {}){}",
                        rank + 1,
                        c.date,
                        c.start_time,
                        c.duration_minutes,
                        c.score,
                        flags
                    );
                    for reason in &c.reasons {
                        println!("     + {reason}");
                    }
                    for warning in &c.warnings {
                        println!("     ! {warning}");
                    }
                }
            }
        }
    }
    Ok(())
}

fn kind_label(c: &slot_engine::Conflict) -> &'static str {
    match c.kind {
        slot_engine::ConflictKind::Overlap => "overlap",
        slot_engine::ConflictKind::DoubleBooking => "double-booking",
        slot_engine::ConflictKind::NoBuffer => "no-buffer",
        slot_engine::ConflictKind::BreakViolation => "break-violation",
        slot_engine::ConflictKind::Overload => "overload",
    }
}
