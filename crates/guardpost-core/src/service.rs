//! Patrol service: the engine's command and read surface.
//!
//! Holds the current snapshot for one viewed date and routes every command
//! through the persistence layer, re-fetching the whole date on success
//! rather than patching local state. There are no internal threads; the
//! embedding application owns the refresh timer and calls [`PatrolService::tick`]
//! at the configured interval, unconditionally.

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::conflict::{self, AssignmentCheck};
use crate::directory::Directory;
use crate::error::{CoreError, DatabaseError, Result, ValidationError};
use crate::events::Event;
use crate::monitor::{Alarm, DistressMonitor};
use crate::shift::generator::{build_shift, GenerateRequest};
use crate::shift::{indicator, Shift, TransitionRequest};
use crate::stats::{self, PatrolStats, ShiftFilter};
use crate::storage::PatrolDb;

/// Observer seam for the embedding application.
///
/// All hooks default to no-ops; implement only what the UI needs. Hooks are
/// invoked synchronously on the caller's thread.
pub trait PatrolObserver {
    /// The snapshot for the viewed date was replaced.
    fn on_refresh(&self, _shifts: &[Shift]) {}

    /// A state change occurred.
    fn on_event(&self, _event: &Event) {}

    /// An alarm should be played. At most one per refresh pass; distress
    /// preempts missed.
    fn on_alarm(&self, _alarm: Alarm) {}
}

/// Per-date outcome of a bulk generation request.
///
/// Shift attempts are independent: one failing date does not roll back
/// earlier dates, and the caller can see exactly which dates succeeded.
#[derive(Debug)]
pub struct GeneratedShift {
    pub date: NaiveDate,
    pub result: Result<Shift>,
}

/// The patrol engine service object.
///
/// Owns the database handle, the directory seam, the distress monitor, and
/// the snapshot of the currently viewed date.
pub struct PatrolService {
    db: PatrolDb,
    directory: Box<dyn Directory>,
    monitor: DistressMonitor,
    config: Config,
    observers: Vec<Box<dyn PatrolObserver>>,
    snapshot: Vec<Shift>,
    current_date: Option<NaiveDate>,
}

impl PatrolService {
    /// Build a service over an already-open database.
    pub fn new(db: PatrolDb, directory: Box<dyn Directory>, config: Config) -> Self {
        Self {
            db,
            directory,
            monitor: DistressMonitor::new(),
            config,
            observers: Vec::new(),
            snapshot: Vec::new(),
            current_date: None,
        }
    }

    /// Open the default database and configuration.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(directory: Box<dyn Directory>) -> Result<Self> {
        let db = PatrolDb::open().map_err(|e| CoreError::Custom(e.to_string()))?;
        Ok(Self::new(db, directory, Config::load_or_default()))
    }

    /// Register an observer.
    pub fn subscribe(&mut self, observer: Box<dyn PatrolObserver>) {
        self.observers.push(observer);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The currently viewed date, if any refresh has happened yet.
    pub fn current_date(&self) -> Option<NaiveDate> {
        self.current_date
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> &[Shift] {
        &self.snapshot
    }

    fn notify(&self, event: Event) {
        for observer in &self.observers {
            observer.on_event(&event);
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Fetch a date's shifts without touching the snapshot or the monitor.
    pub fn list_shifts_for_date(&self, date: NaiveDate) -> Result<Vec<Shift>> {
        Ok(self.db.list_shifts_by_date(date)?)
    }

    /// Display label for an agent: the directory name, or the raw id when
    /// the directory does not know the agent.
    pub fn agent_label(&self, agent_id: &str) -> String {
        self.directory
            .agent_name(agent_id)
            .unwrap_or_else(|| agent_id.to_string())
    }

    /// Counters over the snapshot, narrowed by the filter.
    pub fn stats(&self, filter: &ShiftFilter) -> PatrolStats {
        stats::compute(&self.snapshot, filter)
    }

    // ── Refresh ──────────────────────────────────────────────────────

    /// Re-fetch the given date's shift list, feed it to the monitor, and
    /// notify observers.
    pub fn refresh(&mut self, date: NaiveDate) -> Result<&[Shift]> {
        self.refresh_inner(date)?;
        Ok(&self.snapshot)
    }

    /// Timer entry point: re-fetch the currently viewed date.
    ///
    /// Does nothing until the first `refresh` selects a date. Never backs
    /// off on error; the next tick fires regardless.
    pub fn tick(&mut self) -> Result<Option<Alarm>> {
        match self.current_date {
            Some(date) => self.refresh_inner(date),
            None => Ok(None),
        }
    }

    fn refresh_inner(&mut self, date: NaiveDate) -> Result<Option<Alarm>> {
        let shifts = self.db.list_shifts_by_date(date)?;
        debug!(%date, shift_count = shifts.len(), "snapshot refreshed");

        let report = self.monitor.scan(&shifts);
        self.snapshot = shifts;
        self.current_date = Some(date);

        for observer in &self.observers {
            observer.on_refresh(&self.snapshot);
        }
        self.notify(Event::SnapshotRefreshed {
            date,
            shift_count: self.snapshot.len(),
            at: Utc::now(),
        });
        for flagged in &report.new_distress {
            self.notify(Event::DistressRaised {
                checkpoint_id: flagged.checkpoint_id.clone(),
                shift_id: flagged.shift_id.clone(),
                at: Utc::now(),
            });
        }
        for flagged in &report.new_missed {
            self.notify(Event::CheckpointMissed {
                checkpoint_id: flagged.checkpoint_id.clone(),
                shift_id: flagged.shift_id.clone(),
                at: Utc::now(),
            });
        }

        let alarm = report.alarm();
        if let Some(alarm) = alarm {
            for observer in &self.observers {
                observer.on_alarm(alarm);
            }
        }
        Ok(alarm)
    }

    fn refresh_current(&mut self) -> Result<()> {
        if let Some(date) = self.current_date {
            self.refresh_inner(date)?;
        }
        Ok(())
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Generate shifts for every date the request expands to.
    ///
    /// Validation (unknown post, malformed times, overlong window) happens
    /// once, before any insert. Each date is then attempted independently
    /// and sequentially; the returned list carries one result per date, so
    /// partial success is observable. Within one date, the shift and its
    /// checkpoints commit atomically.
    pub fn generate_shifts(&mut self, request: &GenerateRequest) -> Result<Vec<GeneratedShift>> {
        let site = self
            .directory
            .site_of_post(&request.post_id)
            .ok_or_else(|| ValidationError::UnknownPost {
                post_id: request.post_id.clone(),
            })?;

        // Surface window errors before touching the database.
        build_shift(
            &request.post_id,
            &site,
            request.reference_date,
            &request.start_time,
            &request.end_time,
            request.frequency,
            String::new(),
        )?;

        let mut outcomes = Vec::new();
        for date in request.target_dates() {
            let result = build_shift(
                &request.post_id,
                &site,
                date,
                &request.start_time,
                &request.end_time,
                request.frequency,
                indicator::generate_default(),
            )
            .map_err(CoreError::from)
            .and_then(|shift| {
                self.db.create_shift(&shift).map_err(DatabaseError::from)?;
                Ok(shift)
            });

            match &result {
                Ok(shift) => {
                    info!(shift_id = %shift.id, %date, checkpoints = shift.checkpoints.len(),
                        "shift created");
                    self.notify(Event::ShiftCreated {
                        shift_id: shift.id.clone(),
                        date,
                        checkpoint_count: shift.checkpoints.len(),
                        at: Utc::now(),
                    });
                }
                Err(err) => {
                    warn!(%date, error = %err, "shift creation failed");
                }
            }
            outcomes.push(GeneratedShift { date, result });
        }

        self.refresh_current()?;
        Ok(outcomes)
    }

    /// Apply a manual transition to one checkpoint.
    ///
    /// LATE is reserved for automatic evaluation and is rejected here.
    pub fn transition_checkpoint(&mut self, request: &TransitionRequest) -> Result<()> {
        if !request.status.is_manual() {
            return Err(ValidationError::StatusNotManual {
                status: request.status.to_string(),
            }
            .into());
        }

        let checkpoint = self
            .db
            .get_checkpoint(&request.checkpoint_id)?
            .ok_or_else(|| DatabaseError::NotFound {
                entity: "checkpoint",
                id: request.checkpoint_id.clone(),
            })?;

        self.db.transition_checkpoint(request)?;
        info!(checkpoint_id = %request.checkpoint_id, status = %request.status,
            clear_distress = request.clear_distress, "checkpoint transitioned");

        self.notify(Event::CheckpointTransitioned {
            checkpoint_id: checkpoint.id,
            shift_id: checkpoint.shift_id,
            status: request.status,
            distress_cleared: request.clear_distress,
            at: Utc::now(),
        });
        self.refresh_current()
    }

    /// Evaluate a proposed assignment without committing anything.
    pub fn check_assignment(
        &self,
        agent_id: &str,
        date: NaiveDate,
        excluding_shift_id: Option<&str>,
    ) -> Result<AssignmentCheck> {
        let records = self.db.list_agent_assignments(agent_id)?;
        Ok(conflict::check_assignment(
            &records,
            date,
            excluding_shift_id,
            self.config.assignment.weekly_soft_limit,
        ))
    }

    /// Rebind a shift's agent without conflict checking.
    ///
    /// This is the raw registry operation; callers are expected to run
    /// [`Self::check_assignment`] first, or use [`Self::try_assign`].
    pub fn assign_agent(&mut self, shift_id: &str, agent_id: Option<&str>) -> Result<()> {
        if !self.db.assign_agent(shift_id, agent_id)? {
            return Err(DatabaseError::NotFound {
                entity: "shift",
                id: shift_id.to_string(),
            }
            .into());
        }
        let label = agent_id.map(|id| self.agent_label(id));
        info!(%shift_id, agent = label.as_deref().unwrap_or("<unassigned>"), "agent assigned");
        self.notify(Event::AgentAssigned {
            shift_id: shift_id.to_string(),
            agent_id: agent_id.map(String::from),
            at: Utc::now(),
        });
        self.refresh_current()
    }

    /// Conflict-checked assignment flow.
    ///
    /// A daily conflict is a hard error. At or past the weekly soft limit,
    /// nothing is written unless `confirm_overage` is set; callers surface
    /// the returned `NeedsConfirmation` to the user and call again with the
    /// confirmation. Returns the check outcome that was enforced.
    pub fn try_assign(
        &mut self,
        shift_id: &str,
        agent_id: &str,
        confirm_overage: bool,
    ) -> Result<AssignmentCheck> {
        let shift = self
            .db
            .get_shift(shift_id)?
            .ok_or_else(|| DatabaseError::NotFound {
                entity: "shift",
                id: shift_id.to_string(),
            })?;

        let check = self.check_assignment(agent_id, shift.date, Some(shift_id))?;
        match check {
            AssignmentCheck::DailyConflict => {
                Err(crate::error::ConflictError::DailyConflict {
                    agent_id: agent_id.to_string(),
                    date: shift.date,
                }
                .into())
            }
            AssignmentCheck::NeedsConfirmation { .. } if !confirm_overage => Ok(check),
            AssignmentCheck::Allowed | AssignmentCheck::NeedsConfirmation { .. } => {
                self.assign_agent(shift_id, Some(agent_id))?;
                Ok(check)
            }
        }
    }

    /// Delete a shift and its checkpoints. Irreversible.
    pub fn delete_shift(&mut self, shift_id: &str) -> Result<()> {
        if !self.db.delete_shift(shift_id)? {
            return Err(DatabaseError::NotFound {
                entity: "shift",
                id: shift_id.to_string(),
            }
            .into());
        }
        info!(%shift_id, "shift deleted");
        self.notify(Event::ShiftDeleted {
            shift_id: shift_id.to_string(),
            at: Utc::now(),
        });
        self.refresh_current()
    }

    /// Raise the duress flag on a checkpoint (the duress-code write path).
    pub fn raise_distress(&mut self, checkpoint_id: &str) -> Result<()> {
        if !self.db.raise_distress(checkpoint_id)? {
            return Err(DatabaseError::NotFound {
                entity: "checkpoint",
                id: checkpoint_id.to_string(),
            }
            .into());
        }
        warn!(%checkpoint_id, "distress flag raised");
        self.refresh_current()
    }
}
