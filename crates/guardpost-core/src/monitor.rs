//! Distress and missed-checkpoint monitoring.
//!
//! Single-threaded, polling-based: the caller feeds each refreshed shift
//! snapshot to [`DistressMonitor::scan`], which reports checkpoints newly
//! observed in distress or newly observed as MISSED. The monitor never
//! mutates checkpoint state.
//!
//! Seen ids are evicted once their checkpoint leaves the scanned snapshot
//! (deleted, or the loaded date window changed), so the sets stay bounded
//! in a long-running process.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::shift::{CheckpointStatus, Shift};

/// Which alarm to play after a scan. Distress preempts missed; the two are
/// mutually exclusive per pass, never cumulative.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Alarm {
    Distress,
    Missed,
}

/// A checkpoint the monitor flagged during a scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckpointRef {
    pub shift_id: String,
    pub checkpoint_id: String,
}

/// Result of one scan pass.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Checkpoints whose distress flag was observed for the first time.
    pub new_distress: Vec<CheckpointRef>,
    /// Checkpoints observed as MISSED for the first time.
    pub new_missed: Vec<CheckpointRef>,
}

impl ScanReport {
    /// The single alarm this pass should play, if any.
    pub fn alarm(&self) -> Option<Alarm> {
        if !self.new_distress.is_empty() {
            Some(Alarm::Distress)
        } else if !self.new_missed.is_empty() {
            Some(Alarm::Missed)
        } else {
            None
        }
    }
}

/// Tracks which checkpoints have already been alerted on.
#[derive(Debug, Default)]
pub struct DistressMonitor {
    seen_distress: HashSet<String>,
    seen_missed: HashSet<String>,
}

impl DistressMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan a shift snapshot for newly-occurring distress or missed events.
    ///
    /// A checkpoint fires at most once per id while it stays in the loaded
    /// window; a checkpoint alerted, evicted, and loaded again fires again.
    pub fn scan(&mut self, shifts: &[Shift]) -> ScanReport {
        let current: HashSet<&str> = shifts
            .iter()
            .flat_map(|shift| shift.checkpoints.iter())
            .map(|cp| cp.id.as_str())
            .collect();
        self.seen_distress.retain(|id| current.contains(id.as_str()));
        self.seen_missed.retain(|id| current.contains(id.as_str()));

        let mut report = ScanReport::default();
        for shift in shifts {
            for cp in &shift.checkpoints {
                if cp.distress && self.seen_distress.insert(cp.id.clone()) {
                    report.new_distress.push(CheckpointRef {
                        shift_id: shift.id.clone(),
                        checkpoint_id: cp.id.clone(),
                    });
                }
                if cp.status == CheckpointStatus::Missed && self.seen_missed.insert(cp.id.clone()) {
                    report.new_missed.push(CheckpointRef {
                        shift_id: shift.id.clone(),
                        checkpoint_id: cp.id.clone(),
                    });
                }
            }
        }

        if !report.new_distress.is_empty() {
            warn!(
                count = report.new_distress.len(),
                "distress signal observed"
            );
        }
        report
    }

    /// Forget everything, as a process restart would.
    pub fn reset(&mut self) {
        self.seen_distress.clear();
        self.seen_missed.clear();
    }
}
