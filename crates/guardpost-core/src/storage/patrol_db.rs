//! SQLite-based storage for shifts and their checkpoints.
//!
//! The unit of atomicity is exactly one shift plus its checkpoints: a shift
//! and its checkpoint skeleton are inserted in a single transaction, and
//! deletion cascades in one as well. No transaction ever spans multiple
//! shifts.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use super::data_dir;
use super::migrations;
use crate::conflict::AssignmentRecord;
use crate::shift::{Checkpoint, CheckpointStatus, Frequency, Shift, TransitionRequest};

// === Helper Functions ===

/// Parse checkpoint status from database string
fn parse_status(status_str: &str) -> CheckpointStatus {
    match status_str {
        "COMPLETED" => CheckpointStatus::Completed,
        "LATE" => CheckpointStatus::Late,
        "MISSED" => CheckpointStatus::Missed,
        _ => CheckpointStatus::Pending,
    }
}

/// Format checkpoint status for database storage
fn format_status(status: CheckpointStatus) -> &'static str {
    match status {
        CheckpointStatus::Pending => "PENDING",
        CheckpointStatus::Completed => "COMPLETED",
        CheckpointStatus::Late => "LATE",
        CheckpointStatus::Missed => "MISSED",
    }
}

/// Parse frequency from stored minute count with fallback to hourly
fn parse_frequency(minutes: u32) -> Frequency {
    Frequency::from_minutes(minutes).unwrap_or(Frequency::Hourly)
}

/// Parse date from "YYYY-MM-DD" with fallback to the epoch date
fn parse_date_fallback(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap_or_default()
}

/// Parse datetime from RFC3339 string with fallback to current time
fn parse_datetime_fallback(dt_str: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(dt_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Build a Checkpoint from a database row
fn row_to_checkpoint(row: &rusqlite::Row) -> Result<Checkpoint, rusqlite::Error> {
    let status_str: String = row.get(3)?;
    let completed_at_str: Option<String> = row.get(6)?;
    let completed_at = completed_at_str
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc));

    Ok(Checkpoint {
        id: row.get(0)?,
        shift_id: row.get(1)?,
        scheduled_min: row.get::<_, i64>(2)? as u32,
        status: parse_status(&status_str),
        distress: row.get(4)?,
        manual_override: row.get(5)?,
        completed_at,
        comment: row.get(7)?,
    })
}

/// Build a Shift (without checkpoints) from a database row
fn row_to_shift(row: &rusqlite::Row) -> Result<Shift, rusqlite::Error> {
    let date_str: String = row.get(3)?;
    let created_at_str: String = row.get(8)?;

    Ok(Shift {
        id: row.get(0)?,
        post_id: row.get(1)?,
        site: row.get(2)?,
        date: parse_date_fallback(&date_str),
        start_time: row.get(4)?,
        end_time: row.get(5)?,
        frequency: parse_frequency(row.get::<_, i64>(6)? as u32),
        agent_id: row.get(7)?,
        created_at: parse_datetime_fallback(&created_at_str),
        indicator: row.get(9)?,
        checkpoints: Vec::new(),
    })
}

const SHIFT_COLUMNS: &str = "id, post_id, site, date, start_time, end_time, frequency_min, \
                             agent_id, created_at, indicator";

const CHECKPOINT_COLUMNS: &str =
    "id, shift_id, scheduled_min, status, distress, manual_override, completed_at, comment";

/// SQLite database for patrol storage.
///
/// Stores shifts and their checkpoint collections.
pub struct PatrolDb {
    conn: Connection,
}

impl PatrolDb {
    /// Open the patrol database at `~/.config/guardpost/guardpost.db`.
    ///
    /// Creates tables if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let path = data_dir()?.join("guardpost.db");
        info!(path = %path.display(), "opening patrol database");
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open the patrol database at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: impl AsRef<std::path::Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests and ephemeral embedding).
    pub fn open_memory() -> Result<Self, Box<dyn std::error::Error>> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        // Create base tables (v1 schema) first
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS shifts (
                id            TEXT PRIMARY KEY,
                post_id       TEXT NOT NULL,
                site          TEXT NOT NULL,
                date          TEXT NOT NULL,
                start_time    TEXT NOT NULL,
                end_time      TEXT NOT NULL,
                frequency_min INTEGER NOT NULL,
                agent_id      TEXT,
                created_at    TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS checkpoints (
                id            TEXT PRIMARY KEY,
                shift_id      TEXT NOT NULL,
                scheduled_min INTEGER NOT NULL,
                status        TEXT NOT NULL DEFAULT 'PENDING',
                distress      INTEGER NOT NULL DEFAULT 0,
                completed_at  TEXT,
                comment       TEXT
            );",
        )?;

        // Run incremental migrations (v1 -> v2 -> v3, etc.)
        migrations::migrate(&self.conn)?;

        // Lookup indexes (idempotent, run after migrations add the columns)
        self.conn.execute_batch(
            "CREATE INDEX IF NOT EXISTS idx_shifts_date ON shifts(date);
             CREATE INDEX IF NOT EXISTS idx_shifts_agent ON shifts(agent_id);
             CREATE INDEX IF NOT EXISTS idx_checkpoints_shift ON checkpoints(shift_id);",
        )?;

        Ok(())
    }

    fn load_checkpoints(&self, shift_id: &str) -> Result<Vec<Checkpoint>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CHECKPOINT_COLUMNS} FROM checkpoints
             WHERE shift_id = ?1
             ORDER BY scheduled_min ASC",
        ))?;
        let checkpoints = stmt.query_map(params![shift_id], |row| row_to_checkpoint(row))?;
        checkpoints.collect()
    }

    // === Shift CRUD ===

    /// Insert a shift and all of its checkpoints in a single transaction.
    ///
    /// All-or-nothing: if any checkpoint insert fails, the shift row is
    /// rolled back and nothing is committed.
    pub fn create_shift(&self, shift: &Shift) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch("BEGIN IMMEDIATE TRANSACTION;")?;
        let result: Result<(), rusqlite::Error> = (|| {
            self.conn.execute(
                "INSERT INTO shifts (
                    id, post_id, site, date, start_time, end_time,
                    frequency_min, agent_id, created_at, indicator
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    shift.id,
                    shift.post_id,
                    shift.site,
                    format_date(shift.date),
                    shift.start_time,
                    shift.end_time,
                    shift.frequency.minutes(),
                    shift.agent_id,
                    shift.created_at.to_rfc3339(),
                    shift.indicator,
                ],
            )?;
            for cp in &shift.checkpoints {
                self.conn.execute(
                    "INSERT INTO checkpoints (
                        id, shift_id, scheduled_min, status, distress,
                        manual_override, completed_at, comment
                     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        cp.id,
                        cp.shift_id,
                        cp.scheduled_min,
                        format_status(cp.status),
                        cp.distress,
                        cp.manual_override,
                        cp.completed_at.map(|dt| dt.to_rfc3339()),
                        cp.comment,
                    ],
                )?;
            }
            Ok(())
        })();
        match result {
            Ok(()) => {
                self.conn.execute_batch("COMMIT;")?;
                Ok(())
            }
            Err(err) => {
                let _ = self.conn.execute_batch("ROLLBACK;");
                Err(err)
            }
        }
    }

    /// Get a shift by ID, with its checkpoints.
    pub fn get_shift(&self, id: &str) -> Result<Option<Shift>, rusqlite::Error> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {SHIFT_COLUMNS} FROM shifts WHERE id = ?1"))?;

        let result = stmt.query_row(params![id], |row| row_to_shift(row));

        match result {
            Ok(mut shift) => {
                shift.checkpoints = self.load_checkpoints(&shift.id)?;
                Ok(Some(shift))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// List all shifts on a calendar date, with nested checkpoints.
    ///
    /// This is the only supported query granularity for shift reads;
    /// cross-date queries are not provided.
    pub fn list_shifts_by_date(&self, date: NaiveDate) -> Result<Vec<Shift>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SHIFT_COLUMNS} FROM shifts
             WHERE date = ?1
             ORDER BY start_time ASC, id ASC",
        ))?;
        let shifts = stmt.query_map(params![format_date(date)], |row| row_to_shift(row))?;
        let mut items = shifts.collect::<Result<Vec<Shift>, _>>()?;
        for shift in &mut items {
            shift.checkpoints = self.load_checkpoints(&shift.id)?;
        }
        Ok(items)
    }

    /// Rebind (or unbind) a shift's agent reference.
    ///
    /// Performs no conflict checking; callers run the conflict checker
    /// first. Returns false if the shift does not exist.
    pub fn assign_agent(
        &self,
        shift_id: &str,
        agent_id: Option<&str>,
    ) -> Result<bool, rusqlite::Error> {
        let changed = self.conn.execute(
            "UPDATE shifts SET agent_id = ?1 WHERE id = ?2",
            params![agent_id, shift_id],
        )?;
        Ok(changed > 0)
    }

    /// Delete a shift and cascade to its checkpoints. Irreversible.
    ///
    /// Returns false if the shift does not exist.
    pub fn delete_shift(&self, shift_id: &str) -> Result<bool, rusqlite::Error> {
        self.conn.execute_batch("BEGIN IMMEDIATE TRANSACTION;")?;
        let result: Result<usize, rusqlite::Error> = (|| {
            self.conn.execute(
                "DELETE FROM checkpoints WHERE shift_id = ?1",
                params![shift_id],
            )?;
            self.conn
                .execute("DELETE FROM shifts WHERE id = ?1", params![shift_id])
        })();
        match result {
            Ok(deleted) => {
                self.conn.execute_batch("COMMIT;")?;
                Ok(deleted > 0)
            }
            Err(err) => {
                let _ = self.conn.execute_batch("ROLLBACK;");
                Err(err)
            }
        }
    }

    // === Checkpoint operations ===

    /// Get a checkpoint by ID.
    pub fn get_checkpoint(&self, id: &str) -> Result<Option<Checkpoint>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CHECKPOINT_COLUMNS} FROM checkpoints WHERE id = ?1"
        ))?;
        stmt.query_row(params![id], |row| row_to_checkpoint(row))
            .optional()
    }

    /// Apply a validated transition to exactly one checkpoint.
    ///
    /// Always sets manual_override; overwrites completed_at and comment
    /// with the supplied values; clears distress only when the request
    /// says so. Returns false if the checkpoint does not exist.
    pub fn transition_checkpoint(
        &self,
        request: &TransitionRequest,
    ) -> Result<bool, rusqlite::Error> {
        let changed = self.conn.execute(
            "UPDATE checkpoints
             SET status = ?1,
                 manual_override = 1,
                 completed_at = ?2,
                 comment = ?3,
                 distress = CASE WHEN ?4 THEN 0 ELSE distress END
             WHERE id = ?5",
            params![
                format_status(request.status),
                request.completed_at.map(|dt| dt.to_rfc3339()),
                request.comment,
                request.clear_distress,
                request.checkpoint_id,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Raise the duress flag on a checkpoint without touching its status.
    ///
    /// This is the write path a duress code entry takes; clearing goes
    /// through [`Self::transition_checkpoint`] only.
    pub fn raise_distress(&self, checkpoint_id: &str) -> Result<bool, rusqlite::Error> {
        let changed = self.conn.execute(
            "UPDATE checkpoints SET distress = 1 WHERE id = ?1",
            params![checkpoint_id],
        )?;
        Ok(changed > 0)
    }

    // === Assignment view ===

    /// All shifts currently bound to an agent, as conflict-checker records.
    pub fn list_agent_assignments(
        &self,
        agent_id: &str,
    ) -> Result<Vec<AssignmentRecord>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, post_id, date FROM shifts WHERE agent_id = ?1 ORDER BY date ASC",
        )?;
        let records = stmt.query_map(params![agent_id], |row| {
            let date_str: String = row.get(2)?;
            Ok(AssignmentRecord {
                shift_id: row.get(0)?,
                post_id: row.get(1)?,
                date: parse_date_fallback(&date_str),
            })
        })?;
        records.collect()
    }
}
