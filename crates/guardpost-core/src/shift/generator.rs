//! Checkpoint generator.
//!
//! Turns a time window plus a sampling frequency into the checkpoint
//! skeleton of a new shift. The walk steps from the start to the normalized
//! end inclusive; a final step that would overshoot the end is not emitted,
//! so the tail interval between the last checkpoint and the shift end is
//! intentionally unmonitored.

use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use uuid::Uuid;

use super::{parse_hhmm, Checkpoint, CheckpointStatus, Frequency, Shift};
use crate::error::ValidationError;

/// Maximum normalized shift duration (12 hours).
pub const MAX_SHIFT_MINUTES: u32 = 720;

/// Normalize a shift window to absolute minutes from the shift date's
/// midnight.
///
/// An end at or before the start is treated as next-day (plus 24h). Windows
/// longer than [`MAX_SHIFT_MINUTES`] are rejected.
pub fn normalize_window(start_min: u32, end_min: u32) -> Result<(u32, u32), ValidationError> {
    let end = if end_min <= start_min {
        end_min + 1440
    } else {
        end_min
    };
    let duration = end - start_min;
    if duration > MAX_SHIFT_MINUTES {
        return Err(ValidationError::WindowTooLong { minutes: duration });
    }
    Ok((start_min, end))
}

/// Expected check-in offsets for a normalized window.
///
/// Walks from `start_min` to `norm_end_min` inclusive, stepping by the
/// frequency. The count is `floor((end - start) / freq) + 1`.
pub fn checkpoint_offsets(start_min: u32, norm_end_min: u32, frequency: Frequency) -> Vec<u32> {
    let step = frequency.minutes();
    let mut offsets = Vec::new();
    let mut current = start_min;
    while current <= norm_end_min {
        offsets.push(current);
        current += step;
    }
    offsets
}

/// Request to generate one or more shifts.
///
/// An empty weekday set generates a single shift on `reference_date`. A
/// non-empty set generates one independent shift per matching date of the
/// reference date's week (Monday through Sunday).
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub post_id: String,
    pub weekdays: Vec<Weekday>,
    pub reference_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub frequency: Frequency,
}

impl GenerateRequest {
    /// Request a single shift on one date.
    pub fn single(
        post_id: impl Into<String>,
        date: NaiveDate,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
        frequency: Frequency,
    ) -> Self {
        Self {
            post_id: post_id.into(),
            weekdays: Vec::new(),
            reference_date: date,
            start_time: start_time.into(),
            end_time: end_time.into(),
            frequency,
        }
    }

    /// The calendar dates this request expands to, in ascending order.
    pub fn target_dates(&self) -> Vec<NaiveDate> {
        if self.weekdays.is_empty() {
            return vec![self.reference_date];
        }
        let monday = self.reference_date
            - Duration::days(i64::from(self.reference_date.weekday().num_days_from_monday()));
        (0..7)
            .map(|offset| monday + Duration::days(offset))
            .filter(|date| self.weekdays.contains(&date.weekday()))
            .collect()
    }
}

/// Build one shift and its checkpoint skeleton.
///
/// Validates the window and emits every checkpoint as PENDING with no
/// distress and no manual override. Nothing is persisted here.
pub fn build_shift(
    post_id: &str,
    site: &str,
    date: NaiveDate,
    start_time: &str,
    end_time: &str,
    frequency: Frequency,
    indicator: String,
) -> Result<Shift, ValidationError> {
    let start_min = parse_hhmm(start_time)?;
    let end_min = parse_hhmm(end_time)?;
    let (start, norm_end) = normalize_window(start_min, end_min)?;

    let shift_id = Uuid::new_v4().to_string();
    let checkpoints = checkpoint_offsets(start, norm_end, frequency)
        .into_iter()
        .map(|scheduled_min| Checkpoint {
            id: Uuid::new_v4().to_string(),
            shift_id: shift_id.clone(),
            scheduled_min,
            status: CheckpointStatus::Pending,
            distress: false,
            manual_override: false,
            completed_at: None,
            comment: None,
        })
        .collect();

    Ok(Shift {
        id: shift_id,
        post_id: post_id.to_string(),
        site: site.to_string(),
        date,
        start_time: start_time.to_string(),
        end_time: end_time.to_string(),
        frequency,
        indicator,
        agent_id: None,
        created_at: Utc::now(),
        checkpoints,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn day_shift_hourly_emits_13_checkpoints() {
        // 08:00-20:00 at 60-minute frequency.
        let shift = build_shift(
            "post-1",
            "North Gate",
            date(2024, 3, 1),
            "08:00",
            "20:00",
            Frequency::Hourly,
            "amber falcon".to_string(),
        )
        .unwrap();

        assert_eq!(shift.checkpoints.len(), 13);
        assert_eq!(shift.checkpoints[0].scheduled_label(), "08:00");
        assert_eq!(shift.checkpoints[12].scheduled_label(), "20:00");
        assert!(shift
            .checkpoints
            .iter()
            .all(|cp| cp.status == CheckpointStatus::Pending && !cp.distress));
    }

    #[test]
    fn night_shift_wraps_past_midnight() {
        // 22:00-06:00 at 120-minute frequency: 22:00, 00:00, 02:00, 04:00, 06:00.
        let shift = build_shift(
            "post-1",
            "North Gate",
            date(2024, 3, 1),
            "22:00",
            "06:00",
            Frequency::Every2h,
            "silver harbor".to_string(),
        )
        .unwrap();

        let labels: Vec<String> = shift
            .checkpoints
            .iter()
            .map(|cp| cp.scheduled_label())
            .collect();
        assert_eq!(labels, ["22:00", "00:00", "02:00", "04:00", "06:00"]);
        assert_eq!(shift.checkpoints.last().unwrap().scheduled_min, 1800);
    }

    #[test]
    fn fourteen_hour_window_is_rejected() {
        let err = build_shift(
            "post-1",
            "North Gate",
            date(2024, 3, 1),
            "06:00",
            "20:00",
            Frequency::Hourly,
            "copper raven".to_string(),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::WindowTooLong { minutes: 840 }));
    }

    #[test]
    fn tail_interval_stays_unmonitored() {
        // 08:00-09:45 at 30': checkpoints at 08:00, 08:30, 09:00, 09:30.
        // The 09:30-09:45 tail gets no checkpoint.
        let (start, end) = normalize_window(480, 585).unwrap();
        let offsets = checkpoint_offsets(start, end, Frequency::Every30);
        assert_eq!(offsets, [480, 510, 540, 570]);
    }

    #[test]
    fn end_equal_to_start_counts_as_full_day_and_is_rejected() {
        let err = normalize_window(480, 480).unwrap_err();
        assert!(matches!(err, ValidationError::WindowTooLong { minutes: 1440 }));
    }

    #[test]
    fn target_dates_expand_the_reference_week() {
        // 2024-03-06 is a Wednesday; its week runs 03-04 through 03-10.
        let request = GenerateRequest {
            post_id: "post-1".to_string(),
            weekdays: vec![Weekday::Mon, Weekday::Fri],
            reference_date: date(2024, 3, 6),
            start_time: "08:00".to_string(),
            end_time: "16:00".to_string(),
            frequency: Frequency::Hourly,
        };
        assert_eq!(request.target_dates(), [date(2024, 3, 4), date(2024, 3, 8)]);
    }

    #[test]
    fn empty_weekday_set_targets_the_reference_date() {
        let request =
            GenerateRequest::single("post-1", date(2024, 3, 6), "08:00", "16:00", Frequency::Hourly);
        assert_eq!(request.target_dates(), [date(2024, 3, 6)]);
    }

    proptest! {
        #[test]
        fn checkpoint_walk_matches_formula(
            start in 0u32..1440,
            duration in 1u32..=720,
            freq_idx in 0usize..3,
        ) {
            let frequency = [Frequency::Every30, Frequency::Hourly, Frequency::Every2h][freq_idx];
            let raw_end = (start + duration) % 1440;
            let (norm_start, norm_end) = normalize_window(start, raw_end).unwrap();
            prop_assert_eq!(norm_start, start);
            prop_assert_eq!(norm_end, start + duration);

            let offsets = checkpoint_offsets(norm_start, norm_end, frequency);
            let step = frequency.minutes();
            prop_assert_eq!(offsets.len() as u32, duration / step + 1);
            prop_assert_eq!(offsets[0], start);
            for pair in offsets.windows(2) {
                prop_assert_eq!(pair[1] - pair[0], step);
            }
            prop_assert!(*offsets.last().unwrap() <= norm_end);
        }

        #[test]
        fn overlong_windows_are_always_rejected(
            start in 0u32..1440,
            duration in 721u32..1440,
        ) {
            let raw_end = (start + duration) % 1440;
            prop_assert!(normalize_window(start, raw_end).is_err());
        }
    }
}
