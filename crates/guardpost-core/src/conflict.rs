//! Assignment conflict checking.
//!
//! Decides, before an assignment is committed, whether it is safe. The
//! daily rule is hard: one assignment per agent per calendar date,
//! system-wide. The weekly rule is soft: at or past the limit the caller
//! must obtain explicit confirmation, but may proceed.
//!
//! A shift that starts at 23:00 and ends at 09:00 the next day is keyed to
//! its start date only; the daily check compares exact calendar dates, not
//! 24-hour rolling windows.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// One row of the derived assignment view: a shift an agent already holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub shift_id: String,
    pub post_id: String,
    pub date: NaiveDate,
}

/// Outcome of a pre-assignment check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AssignmentCheck {
    /// No rule triggered; committing is safe.
    Allowed,
    /// The agent already holds an assignment on that date. Hard rule --
    /// callers must reject the assignment outright.
    DailyConflict,
    /// The weekly soft limit is reached. Proceeding is supported but
    /// requires explicit confirmation.
    NeedsConfirmation { weekly_count: usize },
}

/// True if the agent already holds any assignment on `date` other than the
/// one being edited.
pub fn daily_conflict(
    records: &[AssignmentRecord],
    date: NaiveDate,
    excluding_shift_id: Option<&str>,
) -> bool {
    records
        .iter()
        .filter(|record| Some(record.shift_id.as_str()) != excluding_shift_id)
        .any(|record| record.date == date)
}

/// Number of distinct calendar days in `reference`'s ISO week (same ISO
/// week-year, weeks starting Monday) for which the agent holds an
/// assignment.
pub fn weekly_count(records: &[AssignmentRecord], reference: NaiveDate) -> usize {
    let week = reference.iso_week();
    records
        .iter()
        .filter(|record| record.date.iso_week() == week)
        .map(|record| record.date)
        .collect::<BTreeSet<_>>()
        .len()
}

/// Evaluate a proposed assignment of an agent to a shift dated `date`.
///
/// `excluding_shift_id` names the shift being edited, if any, so that
/// re-assigning an agent to their own shift does not conflict with itself.
pub fn check_assignment(
    records: &[AssignmentRecord],
    date: NaiveDate,
    excluding_shift_id: Option<&str>,
    weekly_soft_limit: usize,
) -> AssignmentCheck {
    let kept: Vec<AssignmentRecord> = records
        .iter()
        .filter(|record| Some(record.shift_id.as_str()) != excluding_shift_id)
        .cloned()
        .collect();

    if daily_conflict(&kept, date, None) {
        return AssignmentCheck::DailyConflict;
    }

    let count = weekly_count(&kept, date);
    if count >= weekly_soft_limit {
        return AssignmentCheck::NeedsConfirmation {
            weekly_count: count,
        };
    }

    AssignmentCheck::Allowed
}
