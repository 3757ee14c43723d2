//! # Guardpost Core Library
//!
//! This library provides the patrol checkpoint & shift-assignment engine
//! for the Guardpost operations dashboard. It is a library-level component
//! embedded in a larger interactive application: the surrounding UI renders
//! the snapshot and drives commands, while this crate owns the rules.
//!
//! ## Architecture
//!
//! - **Checkpoint Generator**: turns a shift time window and a sampling
//!   frequency into the ordered checkpoint skeleton
//! - **Patrol Service**: snapshot holder and command surface; caller-driven
//!   `tick()`, no internal threads
//! - **Storage**: SQLite-based shift/checkpoint persistence and TOML-based
//!   configuration
//! - **Distress Monitor**: polling-based detection of newly-distressed or
//!   newly-missed checkpoints
//!
//! ## Key Components
//!
//! - [`PatrolService`]: command and read surface over one viewed date
//! - [`PatrolDb`]: shift and checkpoint persistence
//! - [`DistressMonitor`]: alert deduplication with distress preemption
//! - [`Directory`]: read-only seam to the post/personnel directories

pub mod config;
pub mod conflict;
pub mod directory;
pub mod error;
pub mod events;
pub mod monitor;
pub mod service;
pub mod shift;
pub mod stats;
pub mod storage;

pub use config::Config;
pub use conflict::{AssignmentCheck, AssignmentRecord};
pub use directory::{Directory, StaticDirectory};
pub use error::{ConfigError, ConflictError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use monitor::{Alarm, DistressMonitor};
pub use service::{GeneratedShift, PatrolObserver, PatrolService};
pub use shift::generator::GenerateRequest;
pub use shift::{Checkpoint, CheckpointStatus, Frequency, Shift, TransitionRequest};
pub use stats::{PatrolStats, ShiftFilter};
pub use storage::PatrolDb;
