//! Live dashboard counters.
//!
//! Pure computation over a filtered shift snapshot. Cheap enough to rerun
//! on every filter or data change -- checkpoint counts per shift are tens,
//! not thousands.

use serde::{Deserialize, Serialize};

use crate::shift::{CheckpointStatus, Shift};

/// Site and free-text filter over a shift snapshot.
///
/// The search term is matched case-insensitively against site, post id,
/// and agent id.
#[derive(Debug, Clone, Default)]
pub struct ShiftFilter {
    pub site: Option<String>,
    pub search: Option<String>,
}

impl ShiftFilter {
    pub fn matches(&self, shift: &Shift) -> bool {
        if let Some(site) = &self.site {
            if !shift.site.eq_ignore_ascii_case(site) {
                return false;
            }
        }
        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            let hit = shift.site.to_lowercase().contains(&term)
                || shift.post_id.to_lowercase().contains(&term)
                || shift
                    .agent_id
                    .as_deref()
                    .is_some_and(|agent| agent.to_lowercase().contains(&term));
            if !hit {
                return false;
            }
        }
        true
    }
}

/// Counters over every checkpoint of every shift in the filtered set.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatrolStats {
    pub shifts: usize,
    pub checkpoints: usize,
    pub completed: usize,
    pub late: usize,
    pub missed: usize,
    pub distress: usize,
}

/// Compute counters for the shifts that pass the filter.
pub fn compute(shifts: &[Shift], filter: &ShiftFilter) -> PatrolStats {
    let mut stats = PatrolStats::default();
    for shift in shifts.iter().filter(|shift| filter.matches(shift)) {
        stats.shifts += 1;
        stats.checkpoints += shift.checkpoints.len();
        for cp in &shift.checkpoints {
            match cp.status {
                CheckpointStatus::Completed => stats.completed += 1,
                CheckpointStatus::Late => stats.late += 1,
                CheckpointStatus::Missed => stats.missed += 1,
                CheckpointStatus::Pending => {}
            }
            if cp.distress {
                stats.distress += 1;
            }
        }
    }
    stats
}
