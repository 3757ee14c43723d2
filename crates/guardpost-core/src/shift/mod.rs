//! Shift and checkpoint domain types.
//!
//! A shift is one guard-post-day assignment window. It owns an ordered
//! sequence of checkpoints -- the expected check-in events sampled at the
//! shift's frequency. Checkpoints never outlive their shift.

pub mod generator;
pub mod indicator;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Checkpoint status lifecycle.
///
/// ```text
/// PENDING --(auto, time passes without check-in)--> LATE
/// PENDING --(manual transition)--> COMPLETED | MISSED
/// LATE    --(manual transition)--> COMPLETED | MISSED
/// ```
///
/// No state is terminal: supervisors may move a checkpoint back to PENDING
/// to correct an erroneous validation. LATE is storable and displayable but
/// is never set by this engine; only an external automatic evaluation writes
/// it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckpointStatus {
    /// Awaiting its check-in
    Pending,
    /// Check-in confirmed
    Completed,
    /// Check-in arrived after the scheduled time
    Late,
    /// Check-in never arrived
    Missed,
}

impl CheckpointStatus {
    /// Whether this status may be set through the manual transition path.
    pub fn is_manual(&self) -> bool {
        matches!(
            self,
            CheckpointStatus::Pending | CheckpointStatus::Completed | CheckpointStatus::Missed
        )
    }
}

impl Default for CheckpointStatus {
    fn default() -> Self {
        CheckpointStatus::Pending
    }
}

impl std::fmt::Display for CheckpointStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CheckpointStatus::Pending => "PENDING",
            CheckpointStatus::Completed => "COMPLETED",
            CheckpointStatus::Late => "LATE",
            CheckpointStatus::Missed => "MISSED",
        };
        f.write_str(s)
    }
}

/// Sampling frequency for checkpoint generation.
///
/// The supported set is fixed; arbitrary minute values are rejected at the
/// boundary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// Every 30 minutes
    Every30,
    /// Every hour
    Hourly,
    /// Every two hours
    Every2h,
}

impl Frequency {
    /// Interval length in minutes.
    pub fn minutes(&self) -> u32 {
        match self {
            Frequency::Every30 => 30,
            Frequency::Hourly => 60,
            Frequency::Every2h => 120,
        }
    }

    /// Parse a minute count back into the enumerated set.
    pub fn from_minutes(minutes: u32) -> Result<Self, ValidationError> {
        match minutes {
            30 => Ok(Frequency::Every30),
            60 => Ok(Frequency::Hourly),
            120 => Ok(Frequency::Every2h),
            other => Err(ValidationError::InvalidFrequency { minutes: other }),
        }
    }
}

impl Default for Frequency {
    fn default() -> Self {
        Frequency::Hourly
    }
}

/// One expected check-in within a shift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Unique identifier
    pub id: String,
    /// Owning shift
    pub shift_id: String,
    /// Scheduled time as minutes from the shift date's midnight.
    /// Values >= 1440 fall on the next calendar day.
    pub scheduled_min: u32,
    /// Current status
    pub status: CheckpointStatus,
    /// Duress signal, independent of status
    pub distress: bool,
    /// True once a human has explicitly set the status
    pub manual_override: bool,
    /// When the check-in was confirmed
    pub completed_at: Option<DateTime<Utc>>,
    /// Free-text supervisor comment
    pub comment: Option<String>,
}

impl Checkpoint {
    /// Scheduled time-of-day as "HH:MM", wrapping past midnight.
    pub fn scheduled_label(&self) -> String {
        format_hhmm(self.scheduled_min)
    }
}

/// One guard-post-day assignment window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shift {
    /// Unique identifier
    pub id: String,
    /// Guard post reference
    pub post_id: String,
    /// Site name, denormalized from the directory at creation time
    pub site: String,
    /// Calendar date the shift is keyed to (its start date)
    pub date: NaiveDate,
    /// Start time of day, "HH:MM"
    pub start_time: String,
    /// End time of day, "HH:MM"; an end at or before the start wraps past
    /// midnight
    pub end_time: String,
    /// Checkpoint sampling frequency
    pub frequency: Frequency,
    /// Two-word spoken passphrase for duress verification, generated once
    /// at creation and immutable thereafter
    pub indicator: String,
    /// Assigned agent; None means unassigned, which is a valid state
    pub agent_id: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Owned checkpoints, ordered by scheduled time
    #[serde(default)]
    pub checkpoints: Vec<Checkpoint>,
}

/// A validated request to transition exactly one checkpoint.
///
/// Applying it always marks the checkpoint as manually overridden and
/// overwrites the completion time and comment with the supplied values.
/// Distress is cleared only when `clear_distress` is set -- a COMPLETED or
/// MISSED status never clears it implicitly.
#[derive(Debug, Clone)]
pub struct TransitionRequest {
    pub checkpoint_id: String,
    pub status: CheckpointStatus,
    pub clear_distress: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub comment: Option<String>,
}

/// Parse an "HH:MM" time of day into minutes from midnight.
pub fn parse_hhmm(value: &str) -> Result<u32, ValidationError> {
    let invalid = || ValidationError::InvalidTime {
        value: value.to_string(),
    };

    let (h, m) = value.split_once(':').ok_or_else(invalid)?;
    let hours: u32 = h.parse().map_err(|_| invalid())?;
    let minutes: u32 = m.parse().map_err(|_| invalid())?;
    if h.len() != 2 || m.len() != 2 || hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    Ok(hours * 60 + minutes)
}

/// Format minutes from midnight as "HH:MM", wrapping past 24:00.
pub fn format_hhmm(minutes: u32) -> String {
    let wrapped = minutes % 1440;
    format!("{:02}:{:02}", wrapped / 60, wrapped % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hhmm_accepts_valid_times() {
        assert_eq!(parse_hhmm("00:00").unwrap(), 0);
        assert_eq!(parse_hhmm("08:30").unwrap(), 510);
        assert_eq!(parse_hhmm("23:59").unwrap(), 1439);
    }

    #[test]
    fn parse_hhmm_rejects_garbage() {
        for bad in ["", "8:30", "08:3", "24:00", "12:60", "ab:cd", "12-30"] {
            assert!(parse_hhmm(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn format_hhmm_wraps_past_midnight() {
        assert_eq!(format_hhmm(0), "00:00");
        assert_eq!(format_hhmm(1439), "23:59");
        assert_eq!(format_hhmm(1440), "00:00");
        assert_eq!(format_hhmm(1560), "02:00");
    }

    #[test]
    fn frequency_minutes_round_trip() {
        for freq in [Frequency::Every30, Frequency::Hourly, Frequency::Every2h] {
            assert_eq!(Frequency::from_minutes(freq.minutes()).unwrap(), freq);
        }
        assert!(Frequency::from_minutes(45).is_err());
        assert!(Frequency::from_minutes(0).is_err());
    }

    #[test]
    fn late_is_not_manual() {
        assert!(CheckpointStatus::Pending.is_manual());
        assert!(CheckpointStatus::Completed.is_manual());
        assert!(CheckpointStatus::Missed.is_manual());
        assert!(!CheckpointStatus::Late.is_manual());
    }

    #[test]
    fn shift_serialization() {
        let shift = Shift {
            id: "shift-1".to_string(),
            post_id: "post-1".to_string(),
            site: "North Gate".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            start_time: "08:00".to_string(),
            end_time: "20:00".to_string(),
            frequency: Frequency::Hourly,
            indicator: "amber falcon".to_string(),
            agent_id: Some("agent-7".to_string()),
            created_at: Utc::now(),
            checkpoints: vec![Checkpoint {
                id: "cp-1".to_string(),
                shift_id: "shift-1".to_string(),
                scheduled_min: 480,
                status: CheckpointStatus::Pending,
                distress: false,
                manual_override: false,
                completed_at: None,
                comment: None,
            }],
        };

        let json = serde_json::to_string(&shift).unwrap();
        let decoded: Shift = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.checkpoints.len(), 1);
        assert_eq!(decoded.checkpoints[0].scheduled_label(), "08:00");
    }
}
