//! Integration tests for the patrol engine.
//!
//! These drive the full flow the dashboard performs: generate shifts,
//! validate checkpoints, watch the monitor, and enforce assignment rules,
//! all against an in-memory database.

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use guardpost_core::{
    Alarm, AssignmentCheck, CheckpointStatus, Config, Event, Frequency, GenerateRequest,
    PatrolDb, PatrolObserver, PatrolService, ShiftFilter, StaticDirectory, TransitionRequest,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn make_service() -> PatrolService {
    let db = PatrolDb::open_memory().unwrap();
    let directory = StaticDirectory::new()
        .with_post("gate-north", "Riverside Plant")
        .with_post("gate-south", "Riverside Plant")
        .with_post("lobby", "Harbor Tower")
        .with_agent("agent-1", "J. Mercer")
        .with_agent("agent-2", "A. Okafor");
    PatrolService::new(db, Box::new(directory), Config::default())
}

/// Observer that records every alarm and event it sees.
#[derive(Clone, Default)]
struct Recorder {
    alarms: Arc<Mutex<Vec<Alarm>>>,
    events: Arc<Mutex<Vec<Event>>>,
}

impl PatrolObserver for Recorder {
    fn on_event(&self, event: &Event) {
        self.events.lock().unwrap().push(event.clone());
    }

    fn on_alarm(&self, alarm: Alarm) {
        self.alarms.lock().unwrap().push(alarm);
    }
}

#[test]
fn full_day_flow() {
    let mut service = make_service();
    let recorder = Recorder::default();
    service.subscribe(Box::new(recorder.clone()));

    let today = date(2024, 3, 1);

    // Generate a 08:00-20:00 hourly shift: 13 checkpoints, all pending.
    let outcomes = service
        .generate_shifts(&GenerateRequest::single(
            "gate-north",
            today,
            "08:00",
            "20:00",
            Frequency::Hourly,
        ))
        .unwrap();
    let shift = outcomes.into_iter().next().unwrap().result.unwrap();
    assert_eq!(shift.checkpoints.len(), 13);
    assert_eq!(shift.site, "Riverside Plant");

    service.refresh(today).unwrap();
    let stats = service.stats(&ShiftFilter::default());
    assert_eq!(stats.shifts, 1);
    assert_eq!(stats.checkpoints, 13);
    assert_eq!(stats.completed, 0);

    // The guard checks in at the first two checkpoints.
    for cp in &shift.checkpoints[..2] {
        service
            .transition_checkpoint(&TransitionRequest {
                checkpoint_id: cp.id.clone(),
                status: CheckpointStatus::Completed,
                clear_distress: false,
                completed_at: Some(chrono::Utc::now()),
                comment: None,
            })
            .unwrap();
    }
    assert_eq!(service.stats(&ShiftFilter::default()).completed, 2);

    // The third check-in never arrives and dispatch marks it missed.
    service
        .transition_checkpoint(&TransitionRequest {
            checkpoint_id: shift.checkpoints[2].id.clone(),
            status: CheckpointStatus::Missed,
            clear_distress: false,
            completed_at: None,
            comment: Some("no radio contact".to_string()),
        })
        .unwrap();

    let alarms = recorder.alarms.lock().unwrap().clone();
    assert_eq!(alarms, vec![Alarm::Missed]);

    // Steady state: further ticks stay quiet.
    assert_eq!(service.tick().unwrap(), None);
    assert_eq!(recorder.alarms.lock().unwrap().len(), 1);

    let events = recorder.events.lock().unwrap();
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::ShiftCreated { checkpoint_count: 13, .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::CheckpointMissed { .. })));
}

#[test]
fn distress_preempts_missed_and_fires_once() {
    let mut service = make_service();
    let recorder = Recorder::default();
    service.subscribe(Box::new(recorder.clone()));

    let today = date(2024, 3, 1);
    let shift = service
        .generate_shifts(&GenerateRequest::single(
            "lobby",
            today,
            "22:00",
            "06:00",
            Frequency::Every2h,
        ))
        .unwrap()
        .into_iter()
        .next()
        .unwrap()
        .result
        .unwrap();
    assert_eq!(shift.checkpoints.len(), 5);
    service.refresh(today).unwrap();

    // A missed checkpoint and a duress signal land in the same pass.
    service
        .transition_checkpoint(&TransitionRequest {
            checkpoint_id: shift.checkpoints[0].id.clone(),
            status: CheckpointStatus::Missed,
            clear_distress: false,
            completed_at: None,
            comment: None,
        })
        .unwrap();
    service.raise_distress(&shift.checkpoints[1].id).unwrap();

    let alarms = recorder.alarms.lock().unwrap().clone();
    // The missed transition alarmed on its own refresh; the distress pass
    // then preempted with the distress alarm only.
    assert_eq!(alarms, vec![Alarm::Missed, Alarm::Distress]);

    assert_eq!(service.tick().unwrap(), None);

    // Clearing distress requires the explicit flag; completing alone
    // leaves it up.
    service
        .transition_checkpoint(&TransitionRequest {
            checkpoint_id: shift.checkpoints[1].id.clone(),
            status: CheckpointStatus::Completed,
            clear_distress: false,
            completed_at: None,
            comment: None,
        })
        .unwrap();
    assert_eq!(service.stats(&ShiftFilter::default()).distress, 1);

    service
        .transition_checkpoint(&TransitionRequest {
            checkpoint_id: shift.checkpoints[1].id.clone(),
            status: CheckpointStatus::Completed,
            clear_distress: true,
            completed_at: None,
            comment: None,
        })
        .unwrap();
    assert_eq!(service.stats(&ShiftFilter::default()).distress, 0);
}

#[test]
fn assignment_rules_across_posts_and_weeks() {
    let mut service = make_service();

    // Agent 1 takes gate-north on 03-01; gate-south the same day is a
    // hard conflict even though the post and window differ.
    let first = service
        .generate_shifts(&GenerateRequest::single(
            "gate-north",
            date(2024, 3, 1),
            "08:00",
            "16:00",
            Frequency::Hourly,
        ))
        .unwrap()
        .into_iter()
        .next()
        .unwrap()
        .result
        .unwrap();
    let second = service
        .generate_shifts(&GenerateRequest::single(
            "gate-south",
            date(2024, 3, 1),
            "18:00",
            "23:00",
            Frequency::Every30,
        ))
        .unwrap()
        .into_iter()
        .next()
        .unwrap()
        .result
        .unwrap();

    service.try_assign(&first.id, "agent-1", false).unwrap();
    assert!(service.try_assign(&second.id, "agent-1", false).is_err());

    // A different agent is fine.
    assert_eq!(
        service.try_assign(&second.id, "agent-2", false).unwrap(),
        AssignmentCheck::Allowed
    );

    // Deleting agent 1's shift frees the day again.
    service.delete_shift(&first.id).unwrap();
    let third = service
        .generate_shifts(&GenerateRequest::single(
            "gate-north",
            date(2024, 3, 1),
            "08:00",
            "16:00",
            Frequency::Hourly,
        ))
        .unwrap()
        .into_iter()
        .next()
        .unwrap()
        .result
        .unwrap();
    assert_eq!(
        service.try_assign(&third.id, "agent-1", false).unwrap(),
        AssignmentCheck::Allowed
    );
}

#[test]
fn recurring_generation_and_weekly_soft_limit() {
    let mut service = make_service();

    // Generate Monday through Friday of ISO week 10 in one request.
    let request = GenerateRequest {
        post_id: "gate-north".to_string(),
        weekdays: vec![
            chrono::Weekday::Mon,
            chrono::Weekday::Tue,
            chrono::Weekday::Wed,
            chrono::Weekday::Thu,
            chrono::Weekday::Fri,
        ],
        reference_date: date(2024, 3, 6),
        start_time: "08:00".to_string(),
        end_time: "16:00".to_string(),
        frequency: Frequency::Hourly,
    };
    let outcomes = service.generate_shifts(&request).unwrap();
    assert_eq!(outcomes.len(), 5);

    for outcome in &outcomes {
        let shift = outcome.result.as_ref().unwrap();
        service.try_assign(&shift.id, "agent-1", false).unwrap();
    }

    // The sixth shift of the week pauses for confirmation.
    let saturday = service
        .generate_shifts(&GenerateRequest::single(
            "gate-north",
            date(2024, 3, 9),
            "08:00",
            "12:00",
            Frequency::Hourly,
        ))
        .unwrap()
        .into_iter()
        .next()
        .unwrap()
        .result
        .unwrap();
    assert_eq!(
        service.try_assign(&saturday.id, "agent-1", false).unwrap(),
        AssignmentCheck::NeedsConfirmation { weekly_count: 5 }
    );
    assert_eq!(
        service.try_assign(&saturday.id, "agent-1", true).unwrap(),
        AssignmentCheck::NeedsConfirmation { weekly_count: 5 }
    );

    // The following Monday is a fresh week.
    let next_week = service
        .generate_shifts(&GenerateRequest::single(
            "gate-north",
            date(2024, 3, 11),
            "08:00",
            "12:00",
            Frequency::Hourly,
        ))
        .unwrap()
        .into_iter()
        .next()
        .unwrap()
        .result
        .unwrap();
    assert_eq!(
        service.try_assign(&next_week.id, "agent-1", false).unwrap(),
        AssignmentCheck::Allowed
    );
}

#[test]
fn overlong_window_creates_nothing() {
    let mut service = make_service();
    let err = service
        .generate_shifts(&GenerateRequest::single(
            "gate-north",
            date(2024, 3, 1),
            "06:00",
            "20:00",
            Frequency::Hourly,
        ))
        .unwrap_err();
    assert!(err.to_string().contains("12-hour"));
    assert!(service
        .list_shifts_for_date(date(2024, 3, 1))
        .unwrap()
        .is_empty());
}

#[test]
fn site_filter_and_search_narrow_the_stats() {
    let mut service = make_service();
    let today = date(2024, 3, 1);
    for post in ["gate-north", "lobby"] {
        service
            .generate_shifts(&GenerateRequest::single(
                post,
                today,
                "08:00",
                "12:00",
                Frequency::Hourly,
            ))
            .unwrap();
    }
    service.refresh(today).unwrap();

    assert_eq!(service.stats(&ShiftFilter::default()).shifts, 2);
    let riverside = ShiftFilter {
        site: Some("Riverside Plant".to_string()),
        search: None,
    };
    assert_eq!(service.stats(&riverside).shifts, 1);
    let by_term = ShiftFilter {
        site: None,
        search: Some("lobby".to_string()),
    };
    assert_eq!(service.stats(&by_term).shifts, 1);
}
