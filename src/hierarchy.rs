//! Grouping of flat task records into the root/subtask forest shown in the day view.
//!
//! The store hands over a flat list (typically every task scheduled on one day).
//! [`organize`] attaches each subtask to its root and surfaces subtasks whose
//! root is not part of the list as standalone orphan nodes, so nothing scheduled
//! for the day disappears from view.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::task::Task;

/// One entry of the organized day view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "node", rename_all = "kebab-case")]
pub enum TaskNode {
    /// A root task with its direct subtasks, in input order.
    Root {
        #[serde(flatten)]
        task: Task,
        subtasks: Vec<Task>,
    },
    /// A subtask whose parent is not among the organized tasks.
    Orphan {
        #[serde(flatten)]
        task: Task,
    },
}

impl TaskNode {
    pub fn task(&self) -> &Task {
        match self {
            TaskNode::Root { task, .. } | TaskNode::Orphan { task } => task,
        }
    }

    /// Subtasks nested under this node; always empty for orphans.
    pub fn subtasks(&self) -> &[Task] {
        match self {
            TaskNode::Root { subtasks, .. } => subtasks,
            TaskNode::Orphan { .. } => &[],
        }
    }

    pub fn is_orphan(&self) -> bool {
        matches!(self, TaskNode::Orphan { .. })
    }
}

/// Organize a flat task list into roots with their subtasks, followed by orphans.
///
/// Roots keep the order they had in `tasks`, so callers sort before organizing.
/// Subtasks keep their relative input order under each root. A subtask whose
/// parent id matches no root in `tasks` (the parent is scheduled on another day,
/// was deleted, or is itself a subtask) becomes an [`TaskNode::Orphan`] appended
/// after all roots.
pub fn organize(tasks: &[Task]) -> Vec<TaskNode> {
    let (roots, children): (Vec<&Task>, Vec<&Task>) =
        tasks.iter().partition(|t| t.parent.is_none());

    let mut by_parent: HashMap<u64, Vec<&Task>> = HashMap::new();
    for &child in &children {
        if let Some(p) = child.parent {
            by_parent.entry(p).or_default().push(child);
        }
    }

    let root_ids: HashSet<u64> = roots.iter().map(|t| t.id).collect();

    let mut nodes: Vec<TaskNode> = roots
        .into_iter()
        .map(|root| TaskNode::Root {
            task: root.clone(),
            subtasks: by_parent
                .get(&root.id)
                .map(|subs| subs.iter().map(|&t| t.clone()).collect())
                .unwrap_or_default(),
        })
        .collect();

    nodes.extend(
        children
            .into_iter()
            .filter(|c| c.parent.is_some_and(|p| !root_ids.contains(&p)))
            .map(|c| TaskNode::Orphan { task: c.clone() }),
    );
    nodes
}

/// Total estimated minutes still open across the forest: roots, their subtasks
/// and orphans. Completed tasks contribute nothing.
pub fn planned_minutes(nodes: &[TaskNode]) -> u64 {
    nodes
        .iter()
        .map(|n| {
            let own = u64::from(n.task().remaining_minutes());
            let subs: u64 = n
                .subtasks()
                .iter()
                .map(|s| u64::from(s.remaining_minutes()))
                .sum();
            own + subs
        })
        .sum()
}
