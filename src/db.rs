//! Task store and utility functions for parsing and formatting.
//!
//! This module provides the `Database` struct, the single source of truth for
//! the user's tasks. Every mutation validates its input, updates the in-memory
//! collection and returns the records it touched, so callers can render results
//! without reading the file again. The module also hosts the helpers for
//! human-friendly durations and days.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::fields::SortKey;
use crate::task::{Task, TaskDraft};
use crate::{Error, Result};

/// File-backed store for all users' tasks.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Database {
    #[serde(default)]
    pub next_id: u64,
    pub tasks: Vec<Task>,
}

impl Database {
    /// Load the store from a JSON file. A missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no store file yet, starting empty");
            return Ok(Database::default());
        }
        let buf = fs::read_to_string(path)?;
        let db: Database = serde_json::from_str(&buf)?;
        debug!(path = %path.display(), tasks = db.tasks.len(), "loaded store");
        Ok(db)
    }

    /// Save the store using an atomic write (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(self)?;
        let mut f = File::create(&tmp)?;
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, path)?;
        debug!(path = %path.display(), tasks = self.tasks.len(), "saved store");
        Ok(())
    }

    /// Allocate the next task id. Ids are never reused, even after deletes.
    fn allocate_id(&mut self) -> u64 {
        let highest = self.tasks.iter().map(|t| t.id).max().unwrap_or(0);
        let id = self.next_id.max(highest + 1).max(1);
        self.next_id = id + 1;
        id
    }

    /// Get a task owned by `owner`.
    pub fn get(&self, owner: &str, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id && t.owner == owner)
    }

    fn get_mut(&mut self, owner: &str, id: u64) -> Option<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id && t.owner == owner)
    }

    fn insert(
        &mut self,
        owner: &str,
        draft: TaskDraft,
        date: NaiveDate,
        parent: Option<u64>,
        now_utc: i64,
    ) -> Task {
        let task = Task {
            id: self.allocate_id(),
            owner: owner.to_string(),
            name: draft.name,
            estimated_minutes: draft.estimated_minutes,
            scheduled_date: date,
            parent,
            is_completed: false,
            actual_minutes: None,
            completed_at_utc: None,
            created_at_utc: now_utc,
        };
        self.tasks.push(task.clone());
        task
    }

    /// Create a root task and its subtasks in one insert.
    ///
    /// All drafts are validated before anything is stored, so a bad subtask
    /// leaves the store untouched. Subtasks inherit the root's scheduled date.
    /// Returns the created records, root first.
    pub fn create_task(
        &mut self,
        owner: &str,
        draft: TaskDraft,
        date: NaiveDate,
        subtasks: Vec<TaskDraft>,
        now_utc: i64,
    ) -> Result<Vec<Task>> {
        let draft = draft.validated()?;
        let subtasks = subtasks
            .into_iter()
            .map(TaskDraft::validated)
            .collect::<Result<Vec<_>>>()?;

        let root = self.insert(owner, draft, date, None, now_utc);
        info!(task_id = root.id, %date, subtasks = subtasks.len(), "created task");
        let mut created = vec![root.clone()];
        for sub in subtasks {
            created.push(self.insert(owner, sub, date, Some(root.id), now_utc));
        }
        Ok(created)
    }

    /// Add subtasks to an existing, still open root task.
    pub fn add_subtasks(
        &mut self,
        owner: &str,
        parent_id: u64,
        drafts: Vec<TaskDraft>,
        now_utc: i64,
    ) -> Result<Vec<Task>> {
        let parent = self.get(owner, parent_id).ok_or(Error::NotFound(parent_id))?;
        if parent.is_subtask() {
            return Err(Error::NestedSubtask(parent_id));
        }
        if parent.is_completed {
            return Err(Error::CompletedParent(parent_id));
        }
        let date = parent.scheduled_date;
        let drafts = drafts
            .into_iter()
            .map(TaskDraft::validated)
            .collect::<Result<Vec<_>>>()?;

        let created: Vec<Task> = drafts
            .into_iter()
            .map(|d| self.insert(owner, d, date, Some(parent_id), now_utc))
            .collect();
        info!(parent_id, count = created.len(), "added subtasks");
        Ok(created)
    }

    /// Complete a task with its actual duration and return the updated record.
    pub fn complete_task(
        &mut self,
        owner: &str,
        id: u64,
        actual_minutes: u32,
        now_utc: i64,
    ) -> Result<Task> {
        let task = self.get_mut(owner, id).ok_or(Error::NotFound(id))?;
        task.complete(actual_minutes, now_utc)?;
        info!(
            task_id = id,
            estimated = task.estimated_minutes,
            actual = actual_minutes,
            "completed task"
        );
        Ok(task.clone())
    }

    /// Delete a task together with its subtasks and return the removed records.
    pub fn delete_task(&mut self, owner: &str, id: u64) -> Result<Vec<Task>> {
        if self.get(owner, id).is_none() {
            return Err(Error::NotFound(id));
        }
        let ids: HashSet<u64> = self
            .tasks
            .iter()
            .filter(|t| t.owner == owner && (t.id == id || t.parent == Some(id)))
            .map(|t| t.id)
            .collect();

        let (removed, kept): (Vec<Task>, Vec<Task>) = std::mem::take(&mut self.tasks)
            .into_iter()
            .partition(|t| ids.contains(&t.id) && t.owner == owner);
        self.tasks = kept;
        info!(task_id = id, removed = removed.len(), "deleted task");
        Ok(removed)
    }

    /// Direct subtasks of a task, in store order.
    pub fn subtasks_of(&self, owner: &str, id: u64) -> Vec<Task> {
        self.tasks
            .iter()
            .filter(|t| t.owner == owner && t.parent == Some(id))
            .cloned()
            .collect()
    }

    /// All tasks of `owner` scheduled on `date`: root tasks ordered by `sort`,
    /// followed by subtasks in creation order.
    pub fn tasks_for_day(&self, owner: &str, date: NaiveDate, sort: SortKey) -> Vec<Task> {
        let (mut tasks, subtasks): (Vec<Task>, Vec<Task>) = self
            .tasks
            .iter()
            .filter(|t| t.owner == owner && t.scheduled_date == date)
            .cloned()
            .partition(|t| t.parent.is_none());
        sort.sort(&mut tasks);
        tasks.extend(subtasks);
        debug!(%date, count = tasks.len(), "day query");
        tasks
    }

    /// Completed tasks of `owner` that carry an actual duration.
    pub fn completed_with_actual(&self, owner: &str) -> Vec<Task> {
        self.tasks
            .iter()
            .filter(|t| t.owner == owner && t.is_completed && t.actual_minutes.is_some())
            .cloned()
            .collect()
    }
}

/// Parse a duration into whole minutes.
///
/// Supports:
/// - "90", "90m", "90min"
/// - "2h", "1.5h"
/// - "1h30m", "1h 30m"
///
/// Zero, unrecognised input and durations that don't fit in `u32` yield `None`.
pub fn parse_minutes(s: &str) -> Option<u32> {
    let s = s.trim().to_lowercase().replace(' ', "");
    if s.is_empty() {
        return None;
    }

    let minutes = if let Some((h, rest)) = s.split_once('h') {
        let hours: f64 = h.parse().ok()?;
        let rest = rest.trim_end_matches("min").trim_end_matches('m');
        let extra: u32 = if rest.is_empty() { 0 } else { rest.parse().ok()? };
        let from_hours = (hours * 60.0).round();
        if !from_hours.is_finite() || from_hours < 0.0 || from_hours > f64::from(u32::MAX) {
            return None;
        }
        u32::try_from(from_hours as u64).ok()?.checked_add(extra)?
    } else {
        s.trim_end_matches("min").trim_end_matches('m').parse().ok()?
    };

    (minutes > 0).then_some(minutes)
}

/// Parse a human-readable day relative to `today`.
///
/// Supports:
/// - "today", "tomorrow", "yesterday"
/// - "monday".."sunday" and "mon".."sun" (this week's occurrence, today included)
/// - "next monday", etc. (the occurrence in the following week)
/// - "in 3d", "in 2w"
/// - "YYYY-MM-DD" format
pub fn parse_day_input(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return today.succ_opt(),
        "yesterday" => return today.pred_opt(),
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        let rest = rest.trim();
        if let Some(n) = rest.strip_suffix('d') {
            let days = Duration::try_days(n.trim().parse().ok()?)?;
            return today.checked_add_signed(days);
        }
        if let Some(n) = rest.strip_suffix('w') {
            let weeks = Duration::try_weeks(n.trim().parse().ok()?)?;
            return today.checked_add_signed(weeks);
        }
        return None;
    }

    let (next_week, day_name) = match s.strip_prefix("next ") {
        Some(rest) => (true, rest.trim()),
        None => (false, s.as_str()),
    };
    if let Some(target) = weekday_index(day_name) {
        let current = today.weekday().num_days_from_monday() as i64;
        let ahead = (target - current).rem_euclid(7);
        let ahead = if next_week { ahead + 7 } else { ahead };
        return today.checked_add_signed(Duration::days(ahead));
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

fn weekday_index(name: &str) -> Option<i64> {
    let idx = match name {
        "monday" | "mon" => 0,
        "tuesday" | "tue" => 1,
        "wednesday" | "wed" => 2,
        "thursday" | "thu" => 3,
        "friday" | "fri" => 4,
        "saturday" | "sat" => 5,
        "sunday" | "sun" => 6,
        _ => return None,
    };
    Some(idx)
}

/// Format minutes as "1h 30m", "45m" or "2h".
pub fn format_minutes(minutes: u64) -> String {
    let (h, m) = (minutes / 60, minutes % 60);
    match (h, m) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn day() -> NaiveDate {
        // A Monday.
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn seeded() -> (Database, Vec<Task>) {
        let mut db = Database::default();
        let created = db
            .create_task(
                "ana",
                TaskDraft::new("Write report", 60),
                day(),
                vec![TaskDraft::new("Outline", 15), TaskDraft::new("Draft", 45)],
                NOW,
            )
            .unwrap();
        (db, created)
    }

    #[test]
    fn test_create_task_with_subtasks() {
        let (db, created) = seeded();
        assert_eq!(created.len(), 3);
        assert_eq!(created[0].parent, None);
        assert_eq!(created[1].parent, Some(created[0].id));
        assert_eq!(created[2].parent, Some(created[0].id));
        assert!(created.iter().all(|t| t.scheduled_date == day() && !t.is_completed));
        assert_eq!(db.tasks.len(), 3);
    }

    #[test]
    fn test_create_task_invalid_subtask_stores_nothing() {
        let mut db = Database::default();
        let err = db
            .create_task(
                "ana",
                TaskDraft::new("Write report", 60),
                day(),
                vec![TaskDraft::new("Outline", 0)],
                NOW,
            )
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(db.tasks.is_empty());
    }

    #[test]
    fn test_ids_are_not_reused_after_delete() {
        let (mut db, created) = seeded();
        db.delete_task("ana", created[0].id).unwrap();
        let again = db
            .create_task("ana", TaskDraft::new("Next", 10), day(), vec![], NOW)
            .unwrap();
        assert_eq!(again[0].id, 4);
    }

    #[test]
    fn test_add_subtasks_rules() {
        let (mut db, created) = seeded();
        let root = created[0].id;
        let sub = created[1].id;

        let added = db
            .add_subtasks("ana", root, vec![TaskDraft::new("Proofread", 10)], NOW)
            .unwrap();
        assert_eq!(added[0].parent, Some(root));
        assert_eq!(added[0].scheduled_date, day());

        let nested = db.add_subtasks("ana", sub, vec![TaskDraft::new("Deeper", 5)], NOW);
        assert!(matches!(nested, Err(Error::NestedSubtask(id)) if id == sub));

        db.complete_task("ana", root, 70, NOW + 60).unwrap();
        let closed = db.add_subtasks("ana", root, vec![TaskDraft::new("Late", 5)], NOW);
        assert!(matches!(closed, Err(Error::CompletedParent(_))));

        let missing = db.add_subtasks("ana", 999, vec![TaskDraft::new("X", 5)], NOW);
        assert!(matches!(missing, Err(Error::NotFound(999))));
    }

    #[test]
    fn test_complete_task_once() {
        let (mut db, created) = seeded();
        let id = created[1].id;
        let done = db.complete_task("ana", id, 20, NOW + 900).unwrap();
        assert!(done.is_completed);
        assert_eq!(done.actual_minutes, Some(20));
        assert_eq!(done.completed_at_utc, Some(NOW + 900));
        assert_eq!(db.get("ana", id), Some(&done));

        assert!(matches!(
            db.complete_task("ana", id, 25, NOW + 1000),
            Err(Error::AlreadyCompleted(_))
        ));
        assert_eq!(db.get("ana", id).unwrap().actual_minutes, Some(20));
    }

    #[test]
    fn test_delete_root_cascades_to_subtasks() {
        let (mut db, created) = seeded();
        db.create_task("ana", TaskDraft::new("Other", 5), day(), vec![], NOW)
            .unwrap();
        let removed = db.delete_task("ana", created[0].id).unwrap();
        assert_eq!(removed.len(), 3);
        assert_eq!(db.tasks.len(), 1);
        assert_eq!(db.tasks[0].name, "Other");
    }

    #[test]
    fn test_delete_subtask_keeps_root() {
        let (mut db, created) = seeded();
        let removed = db.delete_task("ana", created[2].id).unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(db.subtasks_of("ana", created[0].id).len(), 1);
    }

    #[test]
    fn test_other_owners_are_invisible() {
        let (mut db, created) = seeded();
        let id = created[0].id;
        assert!(db.get("bob", id).is_none());
        assert!(db.tasks_for_day("bob", day(), SortKey::Newest).is_empty());
        assert!(matches!(db.complete_task("bob", id, 10, NOW), Err(Error::NotFound(_))));
        assert!(matches!(db.delete_task("bob", id), Err(Error::NotFound(_))));
        assert_eq!(db.tasks.len(), 3);
    }

    #[test]
    fn test_day_and_completed_queries() {
        let (mut db, created) = seeded();
        let tomorrow = day() + Duration::days(1);
        db.create_task("ana", TaskDraft::new("Tomorrow", 30), tomorrow, vec![], NOW + 5)
            .unwrap();
        db.complete_task("ana", created[1].id, 10, NOW + 50).unwrap();

        let ids: Vec<u64> = db
            .tasks_for_day("ana", day(), SortKey::Newest)
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(db.tasks_for_day("ana", tomorrow, SortKey::Oldest).len(), 1);

        let completed = db.completed_with_actual("ana");
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].id, created[1].id);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("tasks.json");
        let (db, _) = seeded();
        db.save(&path).unwrap();

        let loaded = Database::load(&path).unwrap();
        assert_eq!(loaded.tasks, db.tasks);
        assert_eq!(loaded.next_id, db.next_id);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let db = Database::load(&dir.path().join("absent.json")).unwrap();
        assert!(db.tasks.is_empty());
    }

    #[test]
    fn test_load_corrupt_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Database::load(&path), Err(Error::Json(_))));
    }

    #[test]
    fn test_parse_minutes() {
        assert_eq!(parse_minutes("90"), Some(90));
        assert_eq!(parse_minutes("45m"), Some(45));
        assert_eq!(parse_minutes("20 min"), Some(20));
        assert_eq!(parse_minutes("2h"), Some(120));
        assert_eq!(parse_minutes("1.5h"), Some(90));
        assert_eq!(parse_minutes("1h30m"), Some(90));
        assert_eq!(parse_minutes("1h 15m"), Some(75));
        assert_eq!(parse_minutes("0"), None);
        assert_eq!(parse_minutes(""), None);
        assert_eq!(parse_minutes("soon"), None);
        assert_eq!(parse_minutes("-5"), None);
    }

    #[test]
    fn test_parse_minutes_out_of_range() {
        assert_eq!(parse_minutes("99999999h5m"), None);
        assert_eq!(parse_minutes("71582789h"), None);
        assert_eq!(parse_minutes("71582788h16m"), None);
        assert_eq!(parse_minutes("4294967296"), None);
        assert_eq!(parse_minutes("1e300h"), None);
        assert_eq!(parse_minutes("71582788h15m"), Some(u32::MAX));
    }

    #[test]
    fn test_parse_day_input() {
        let monday = day();
        assert_eq!(parse_day_input("today", monday), Some(monday));
        assert_eq!(parse_day_input("Tomorrow", monday), Some(monday + Duration::days(1)));
        assert_eq!(parse_day_input("yesterday", monday), Some(monday - Duration::days(1)));
        assert_eq!(parse_day_input("monday", monday), Some(monday));
        assert_eq!(parse_day_input("fri", monday), Some(monday + Duration::days(4)));
        assert_eq!(parse_day_input("next monday", monday), Some(monday + Duration::days(7)));
        assert_eq!(parse_day_input("next wed", monday), Some(monday + Duration::days(9)));
        assert_eq!(parse_day_input("in 3d", monday), Some(monday + Duration::days(3)));
        assert_eq!(parse_day_input("in 2w", monday), Some(monday + Duration::days(14)));
        assert_eq!(
            parse_day_input("2026-04-01", monday),
            NaiveDate::from_ymd_opt(2026, 4, 1)
        );
        assert_eq!(parse_day_input("someday", monday), None);
    }

    #[test]
    fn test_parse_day_input_out_of_range() {
        let monday = day();
        assert_eq!(parse_day_input("in 99999999d", monday), None);
        assert_eq!(parse_day_input("in 99999999w", monday), None);
        assert_eq!(parse_day_input("in -99999999d", monday), None);
        assert_eq!(parse_day_input(&format!("in {}d", i64::MAX), monday), None);
        assert_eq!(parse_day_input("tomorrow", NaiveDate::MAX), None);
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(0), "0m");
        assert_eq!(format_minutes(45), "45m");
        assert_eq!(format_minutes(120), "2h");
        assert_eq!(format_minutes(95), "1h 35m");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer name", 6), "a lon…");
    }
}
