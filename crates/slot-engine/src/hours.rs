//! Weekly working-hours template.
//!
//! A clinic configures one [`WorkingHoursRule`] per weekday (a disabled rule
//! still counts as configured). The engine reads the template during
//! classification and never mutates it.

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};

/// A break window inside a working day, e.g. the lunch hour.
///
/// Half-open: an instant equal to `end` is already outside the break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Availability template for a single weekday.
///
/// Deserialization goes through the same validation as the constructors, so
/// a rule loaded from configuration can never carry an inverted day or a
/// break window outside `[start, end)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RuleConfig")]
pub struct WorkingHoursRule {
    pub weekday: Weekday,
    pub enabled: bool,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub break_window: Option<BreakWindow>,
}

impl WorkingHoursRule {
    /// Create an enabled rule for `weekday` covering `[start, end)`.
    ///
    /// # Errors
    /// Returns `ScheduleError::Configuration` if `start >= end`.
    pub fn open(weekday: Weekday, start: NaiveTime, end: NaiveTime) -> Result<Self> {
        if start >= end {
            return Err(ScheduleError::Configuration(format!(
                "working hours for {:?} must satisfy start < end ({} >= {})",
                weekday, start, end
            )));
        }
        Ok(Self {
            weekday,
            enabled: true,
            start,
            end,
            break_window: None,
        })
    }

    /// Create a disabled rule (clinic closed that weekday).
    pub fn closed(weekday: Weekday) -> Self {
        let midnight = NaiveTime::from_hms_opt(0, 0, 0).unwrap();
        Self {
            weekday,
            enabled: false,
            start: midnight,
            end: midnight,
            break_window: None,
        }
    }

    /// Attach a break window to this rule.
    ///
    /// # Errors
    /// Returns `ScheduleError::Configuration` unless
    /// `start <= break_start < break_end <= end`.
    pub fn with_break(mut self, break_start: NaiveTime, break_end: NaiveTime) -> Result<Self> {
        if break_start >= break_end || break_start < self.start || break_end > self.end {
            return Err(ScheduleError::Configuration(format!(
                "break window {}..{} must lie within working hours {}..{} for {:?}",
                break_start, break_end, self.start, self.end, self.weekday
            )));
        }
        self.break_window = Some(BreakWindow {
            start: break_start,
            end: break_end,
        });
        Ok(self)
    }
}

/// Wire shape for [`WorkingHoursRule`]; converted through the validating
/// constructors.
#[derive(Debug, Deserialize)]
struct RuleConfig {
    weekday: Weekday,
    enabled: bool,
    start: NaiveTime,
    end: NaiveTime,
    #[serde(default)]
    break_window: Option<BreakWindow>,
}

impl TryFrom<RuleConfig> for WorkingHoursRule {
    type Error = ScheduleError;

    fn try_from(config: RuleConfig) -> Result<Self> {
        if !config.enabled {
            if config.break_window.is_some() {
                return Err(ScheduleError::Configuration(format!(
                    "disabled rule for {:?} cannot carry a break window",
                    config.weekday
                )));
            }
            return Ok(WorkingHoursRule::closed(config.weekday));
        }
        let rule = WorkingHoursRule::open(config.weekday, config.start, config.end)?;
        match config.break_window {
            Some(bw) => rule.with_break(bw.start, bw.end),
            None => Ok(rule),
        }
    }
}

/// The full weekly template: at most one rule per weekday.
///
/// Lookup fails when a weekday has no rule at all — every weekday must be
/// configured explicitly, even if only as [`WorkingHoursRule::closed`].
/// Deserialization runs the duplicate-weekday check from
/// [`WorkingHours::new`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WeekConfig")]
pub struct WorkingHours {
    rules: Vec<WorkingHoursRule>,
}

/// Wire shape for [`WorkingHours`].
#[derive(Debug, Deserialize)]
struct WeekConfig {
    #[serde(default)]
    rules: Vec<WorkingHoursRule>,
}

impl TryFrom<WeekConfig> for WorkingHours {
    type Error = ScheduleError;

    fn try_from(config: WeekConfig) -> Result<Self> {
        WorkingHours::new(config.rules)
    }
}

impl WorkingHours {
    /// Build a template from a list of per-weekday rules.
    ///
    /// # Errors
    /// Returns `ScheduleError::Configuration` if two rules target the same
    /// weekday.
    pub fn new(rules: Vec<WorkingHoursRule>) -> Result<Self> {
        for (i, rule) in rules.iter().enumerate() {
            if rules[..i].iter().any(|r| r.weekday == rule.weekday) {
                return Err(ScheduleError::Configuration(format!(
                    "duplicate working-hours rule for {:?}",
                    rule.weekday
                )));
            }
        }
        Ok(Self { rules })
    }

    /// Insert or replace the rule for its weekday.
    pub fn set_rule(&mut self, rule: WorkingHoursRule) {
        if let Some(existing) = self.rules.iter_mut().find(|r| r.weekday == rule.weekday) {
            *existing = rule;
        } else {
            self.rules.push(rule);
        }
    }

    /// Look up the rule governing `date` by its weekday.
    ///
    /// # Errors
    /// Returns `ScheduleError::Configuration` when the weekday has no rule.
    pub fn rule_for(&self, date: NaiveDate) -> Result<&WorkingHoursRule> {
        let weekday = date.weekday();
        self.rules
            .iter()
            .find(|r| r.weekday == weekday)
            .ok_or_else(|| {
                ScheduleError::Configuration(format!(
                    "no working-hours rule configured for {:?}",
                    weekday
                ))
            })
    }

    /// A common clinic week: Mon-Fri 09:00-17:00 with a 12:00-13:00 break,
    /// weekend closed.
    pub fn standard() -> Self {
        let start = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let end = NaiveTime::from_hms_opt(17, 0, 0).unwrap();
        let break_start = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        let break_end = NaiveTime::from_hms_opt(13, 0, 0).unwrap();

        let weekdays = [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ];
        let mut rules: Vec<WorkingHoursRule> = weekdays
            .iter()
            .map(|&wd| {
                WorkingHoursRule::open(wd, start, end)
                    .and_then(|r| r.with_break(break_start, break_end))
                    .expect("standard template is valid")
            })
            .collect();
        rules.push(WorkingHoursRule::closed(Weekday::Sat));
        rules.push(WorkingHoursRule::closed(Weekday::Sun));

        Self { rules }
    }
}
