//! # timebox - daily task planning with estimation feedback
//!
//! A command-line planner for the tasks of a single day. Each task carries an
//! estimated duration; when it is completed the actual duration is recorded, and
//! over time the tool reports whether you tend to under- or overestimate.
//!
//! ## Key Features
//!
//! - **Two-level tasks**: root tasks with optional subtasks, created in one step
//! - **Day view**: tasks scheduled for a date, grouped into roots and subtasks,
//!   with the total planned time still ahead
//! - **Estimation feedback**: immediate feedback on each completion and an
//!   aggregate accuracy report across all completed work
//! - **Local File Storage**: one JSON document under `~/.timebox/`
//!
//! ## Quick Start
//!
//! ```bash
//! # Plan a task for today with two subtasks
//! tb add "Write report" --estimate 1h --subtask "Outline:15" --subtask "Draft:45"
//!
//! # See today's plan
//! tb today
//!
//! # Record how long it actually took
//! tb complete 1 --actual 1h30m
//!
//! # How good are my estimates?
//! tb stats
//! ```
//!
//! The two views are pure functions over the stored records:
//! [`hierarchy::organize`] for the day view and [`stats::analyze`] for the
//! accuracy report.

pub mod cli;
pub mod cmd;
pub mod config;
pub mod db;
pub mod fields;
pub mod hierarchy;
pub mod prompt;
pub mod stats;
pub mod task;

/// Library-level error type for timebox operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("Task {0} not found")]
    NotFound(u64),

    #[error("Task {0} is already completed")]
    AlreadyCompleted(u64),

    #[error("Task {0} is a subtask and cannot have subtasks of its own")]
    NestedSubtask(u64),

    #[error("Task {0} is completed; subtasks can only be added to open tasks")]
    CompletedParent(u64),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for timebox operations.
pub type Result<T> = std::result::Result<T, Error>;
