//! Task data structure and related functionality.
//!
//! This module defines the `Task` record, the single entity the planner stores,
//! together with `TaskDraft`, the validated input used to create one.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A planned piece of work with its estimated and (once done) actual duration.
///
/// Tasks form a two-level hierarchy: a task without a `parent` is a root task,
/// a task with one is a subtask of that root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub owner: String,
    pub name: String,
    pub estimated_minutes: u32,
    pub scheduled_date: NaiveDate,
    #[serde(default)]
    pub parent: Option<u64>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub actual_minutes: Option<u32>,
    #[serde(default)]
    pub completed_at_utc: Option<i64>,
    pub created_at_utc: i64,
}

impl Task {
    /// Whether this task references a parent.
    pub fn is_subtask(&self) -> bool {
        self.parent.is_some()
    }

    /// Record completion. Sets the completed flag, the actual duration and the
    /// completion time together; a task can only be completed once.
    pub fn complete(&mut self, actual_minutes: u32, now_utc: i64) -> Result<()> {
        if self.is_completed {
            return Err(Error::AlreadyCompleted(self.id));
        }
        if actual_minutes == 0 {
            return Err(Error::InvalidInput(
                "actual duration must be at least one minute".into(),
            ));
        }
        self.is_completed = true;
        self.actual_minutes = Some(actual_minutes);
        self.completed_at_utc = Some(now_utc);
        Ok(())
    }

    /// Minutes still planned for this task: the estimate while open, zero once done.
    pub fn remaining_minutes(&self) -> u32 {
        if self.is_completed {
            0
        } else {
            self.estimated_minutes
        }
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.created_at_utc, 0).single()
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at_utc
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
    }
}

/// Name and estimate for a task that is about to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub name: String,
    pub estimated_minutes: u32,
}

impl TaskDraft {
    pub fn new(name: impl Into<String>, estimated_minutes: u32) -> Self {
        Self {
            name: name.into(),
            estimated_minutes,
        }
    }

    /// Check the draft and return it with its name trimmed.
    pub fn validated(self) -> Result<Self> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::InvalidInput("task name cannot be empty".into()));
        }
        if self.estimated_minutes == 0 {
            return Err(Error::InvalidInput(format!(
                "estimate for '{name}' must be at least one minute"
            )));
        }
        Ok(Self {
            name,
            estimated_minutes: self.estimated_minutes,
        })
    }

    /// Parse the `NAME:DURATION` form used by `tb add --subtask`.
    pub fn parse_pair(s: &str) -> Result<Self> {
        let Some((name, duration)) = s.rsplit_once(':') else {
            return Err(Error::InvalidInput(format!(
                "subtask '{s}' must look like NAME:DURATION"
            )));
        };
        let minutes = crate::db::parse_minutes(duration).ok_or_else(|| {
            Error::InvalidInput(format!("unrecognised duration '{duration}' in subtask '{s}'"))
        })?;
        Self::new(name, minutes).validated()
    }
}
