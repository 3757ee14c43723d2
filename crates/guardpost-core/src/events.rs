use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::shift::CheckpointStatus;

/// Every state change in the engine produces an Event.
/// The embedding application observes them through the service's
/// subscription seam.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// The snapshot for a date was re-fetched.
    SnapshotRefreshed {
        date: NaiveDate,
        shift_count: usize,
        at: DateTime<Utc>,
    },
    ShiftCreated {
        shift_id: String,
        date: NaiveDate,
        checkpoint_count: usize,
        at: DateTime<Utc>,
    },
    ShiftDeleted {
        shift_id: String,
        at: DateTime<Utc>,
    },
    /// Agent rebound (or unbound, when `agent_id` is None).
    AgentAssigned {
        shift_id: String,
        agent_id: Option<String>,
        at: DateTime<Utc>,
    },
    CheckpointTransitioned {
        checkpoint_id: String,
        shift_id: String,
        status: CheckpointStatus,
        distress_cleared: bool,
        at: DateTime<Utc>,
    },
    /// A checkpoint newly observed with its duress flag raised.
    DistressRaised {
        checkpoint_id: String,
        shift_id: String,
        at: DateTime<Utc>,
    },
    /// A checkpoint newly observed as MISSED.
    CheckpointMissed {
        checkpoint_id: String,
        shift_id: String,
        at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization_is_tagged() {
        let event = Event::CheckpointTransitioned {
            checkpoint_id: "cp-1".to_string(),
            shift_id: "shift-1".to_string(),
            status: CheckpointStatus::Completed,
            distress_cleared: true,
            at: Utc::now(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"CheckpointTransitioned\""));
        let decoded: Event = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            decoded,
            Event::CheckpointTransitioned { distress_cleared: true, .. }
        ));
    }
}
