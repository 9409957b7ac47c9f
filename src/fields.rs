//! Enumerations used to order and present tasks.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::task::Task;

/// Available sorting options for the day view.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Most recently created first.
    #[default]
    Newest,
    /// Oldest created first.
    Oldest,
    /// Alphabetical by name, case-insensitive.
    Name,
    /// Longest estimate first.
    Estimate,
}

impl SortKey {
    /// Sort tasks in place. Ties fall back to the id so the order is total.
    pub fn sort(self, tasks: &mut [Task]) {
        match self {
            SortKey::Newest => {
                tasks.sort_by(|a, b| {
                    b.created_at_utc
                        .cmp(&a.created_at_utc)
                        .then(b.id.cmp(&a.id))
                })
            }
            SortKey::Oldest => tasks.sort_by_key(|t| (t.created_at_utc, t.id)),
            SortKey::Name => tasks.sort_by_key(|t| (t.name.to_lowercase(), t.id)),
            SortKey::Estimate => tasks.sort_by(|a, b| {
                b.estimated_minutes
                    .cmp(&a.estimated_minutes)
                    .then(a.id.cmp(&b.id))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn task(id: u64, name: &str, estimate: u32, created: i64) -> Task {
        Task {
            id,
            owner: "ana".into(),
            name: name.into(),
            estimated_minutes: estimate,
            scheduled_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            parent: None,
            is_completed: false,
            actual_minutes: None,
            completed_at_utc: None,
            created_at_utc: created,
        }
    }

    fn ids(tasks: &[Task]) -> Vec<u64> {
        tasks.iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_sort_keys() {
        let mut tasks = vec![
            task(1, "beta", 30, 100),
            task(2, "Alpha", 60, 300),
            task(3, "gamma", 60, 200),
            task(4, "delta", 15, 300),
        ];

        SortKey::Newest.sort(&mut tasks);
        assert_eq!(ids(&tasks), vec![4, 2, 3, 1]);

        SortKey::Oldest.sort(&mut tasks);
        assert_eq!(ids(&tasks), vec![1, 3, 2, 4]);

        SortKey::Name.sort(&mut tasks);
        assert_eq!(ids(&tasks), vec![2, 1, 4, 3]);

        SortKey::Estimate.sort(&mut tasks);
        assert_eq!(ids(&tasks), vec![2, 3, 1, 4]);
    }
}
