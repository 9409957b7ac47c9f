//! Command implementations for the CLI interface.
//!
//! Each handler works on the already loaded [`Database`], applies at most one
//! mutation, saves, and renders its result. Views are computed from the
//! in-memory store with [`organize`] and [`analyze`].

use std::path::Path;

use chrono::{Local, NaiveDate, Utc};
use clap::Subcommand;
use clap_complete::{generate, Shell};
use serde::Serialize;

use crate::config::Config;
use crate::db::*;
use crate::fields::SortKey;
use crate::hierarchy::{organize, planned_minutes, TaskNode};
use crate::prompt::Prompter;
use crate::stats::{analyze, CompletionFeedback, EstimationReport, Tendency};
use crate::task::{Task, TaskDraft};
use crate::{Error, Result};

#[derive(Subcommand)]
pub enum Commands {
    /// Plan a new task, optionally with subtasks.
    Add {
        /// What you want to do.
        name: String,
        /// Estimated duration: 30, 45m, 1h, 1h30m, 1.5h.
        #[arg(long, short)]
        estimate: String,
        /// Scheduled day: YYYY-MM-DD, "today", "tomorrow", "fri", "next mon", "in 3d".
        #[arg(long, short, default_value = "today")]
        date: String,
        /// Subtask as NAME:DURATION. May be repeated.
        #[arg(long = "subtask", value_name = "NAME:DURATION")]
        subtasks: Vec<String>,
    },

    /// Add a subtask to an existing open task.
    Subtask {
        /// ID of the parent task.
        parent: u64,
        /// Subtask name.
        name: String,
        /// Estimated duration.
        #[arg(long, short)]
        estimate: String,
    },

    /// Show the tasks scheduled for a day, grouped with their subtasks.
    Today {
        /// Day to show.
        #[arg(long, short, default_value = "today")]
        date: String,
        /// Order of the top-level tasks.
        #[arg(long, value_enum, default_value_t = SortKey::Newest)]
        sort: SortKey,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// View a single task and its subtasks.
    View {
        /// Task ID.
        id: u64,
    },

    /// Mark a task done and record how long it actually took.
    Complete {
        /// Task ID.
        id: u64,
        /// Actual duration. Asked interactively when omitted.
        #[arg(long, short)]
        actual: Option<String>,
    },

    /// Delete a task and its subtasks.
    Delete {
        /// Task ID.
        id: u64,
        /// Skip the confirmation question.
        #[arg(long, short)]
        yes: bool,
    },

    /// Show how accurate your estimates are.
    Stats {
        /// Print JSON instead of a summary.
        #[arg(long)]
        json: bool,
    },

    /// Show or change your display name.
    Profile {
        /// New display name.
        #[arg(long)]
        name: Option<String>,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_estimate(raw: &str) -> Result<u32> {
    parse_minutes(raw).ok_or_else(|| {
        Error::InvalidInput(format!(
            "unrecognised duration '{raw}'. Use minutes (45), 1h, 1h30m or 1.5h."
        ))
    })
}

fn parse_day(raw: &str) -> Result<NaiveDate> {
    parse_day_input(raw, Local::now().date_naive()).ok_or_else(|| {
        Error::InvalidInput(format!(
            "unrecognised day '{raw}'. Use YYYY-MM-DD, 'today', 'tomorrow', a weekday or 'in Nd'."
        ))
    })
}

/// Create a task with optional subtasks.
pub fn cmd_add(
    db: &mut Database,
    db_path: &Path,
    user: &str,
    name: String,
    estimate: String,
    date: String,
    subtasks: Vec<String>,
) -> Result<()> {
    let estimated = parse_estimate(&estimate)?;
    let date = parse_day(&date)?;
    let subtasks = subtasks
        .iter()
        .map(|s| TaskDraft::parse_pair(s))
        .collect::<Result<Vec<_>>>()?;

    let draft = TaskDraft::new(name, estimated);
    let created = db.create_task(user, draft, date, subtasks, Utc::now().timestamp())?;
    db.save(db_path)?;

    let root = &created[0];
    println!("Added task {} for {}", root.id, root.scheduled_date);
    for sub in &created[1..] {
        println!("  ↳ subtask {}: {}", sub.id, sub.name);
    }
    Ok(())
}

/// Add one subtask under an existing task.
pub fn cmd_subtask(
    db: &mut Database,
    db_path: &Path,
    user: &str,
    parent: u64,
    name: String,
    estimate: String,
) -> Result<()> {
    let estimated = parse_estimate(&estimate)?;
    let drafts = vec![TaskDraft::new(name, estimated)];
    let created = db.add_subtasks(user, parent, drafts, Utc::now().timestamp())?;
    db.save(db_path)?;
    for sub in created {
        println!("Added subtask {} to task {}", sub.id, parent);
    }
    Ok(())
}

#[derive(Serialize)]
struct DayView<'a> {
    date: NaiveDate,
    planned_minutes: u64,
    tasks: &'a [TaskNode],
}

/// Show the organized tasks for one day.
pub fn cmd_today(db: &Database, user: &str, date: String, sort: SortKey, json: bool) -> Result<()> {
    let date = parse_day(&date)?;
    let nodes = organize(&db.tasks_for_day(user, date, sort));
    let planned = planned_minutes(&nodes);

    if json {
        let view = DayView {
            date,
            planned_minutes: planned,
            tasks: &nodes,
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let heading = if date == Local::now().date_naive() {
        "Today's tasks".to_string()
    } else {
        format!("Tasks for {date}")
    };
    println!("{heading}  (total planned: {})", format_minutes(planned));
    if nodes.is_empty() {
        println!("No tasks scheduled. Create one with `tb add`.");
        return Ok(());
    }
    print_nodes(&nodes);
    Ok(())
}

/// Print the day view as a table, subtasks indented under their root.
pub fn print_nodes(nodes: &[TaskNode]) {
    println!("{:<5} {:<8} {:<8} {}", "ID", "Est", "Actual", "Task");
    for node in nodes {
        let task = node.task();
        let suffix = match (node.is_orphan(), task.parent) {
            (true, Some(p)) => format!("  (subtask of #{p})"),
            _ => String::new(),
        };
        print_row(task, "", &suffix);
        for sub in node.subtasks() {
            print_row(sub, "  ↳ ", "");
        }
    }
}

fn print_row(task: &Task, indent: &str, suffix: &str) {
    let check = if task.is_completed { "[x]" } else { "[ ]" };
    let actual = or_dash(task.actual_minutes.map(|m| format_minutes(u64::from(m))));
    println!(
        "{:<5} {:<8} {:<8} {}{} {}{}",
        task.id,
        format_minutes(u64::from(task.estimated_minutes)),
        actual,
        indent,
        check,
        truncate(&task.name, 48),
        suffix
    );
}

/// View detailed information about a single task.
pub fn cmd_view(db: &Database, user: &str, id: u64) -> Result<()> {
    let task = db.get(user, id).ok_or(Error::NotFound(id))?;
    println!("ID:           {}", task.id);
    println!("Name:         {}", task.name);
    println!("Scheduled:    {}", task.scheduled_date);
    println!("Estimate:     {}", format_minutes(u64::from(task.estimated_minutes)));
    println!("Status:       {}", if task.is_completed { "Done" } else { "Open" });
    let actual = task.actual_minutes.map(|m| format_minutes(u64::from(m)));
    println!("Actual:       {}", or_dash(actual));
    println!("Parent:       {}", or_dash(task.parent.map(|p| p.to_string())));
    println!("Created UTC:  {}", or_dash(task.created_at().map(|t| t.to_rfc3339())));
    println!("Completed UTC: {}", or_dash(task.completed_at().map(|t| t.to_rfc3339())));

    let subtasks = db.subtasks_of(user, id);
    if !subtasks.is_empty() {
        println!("Subtasks:");
        for sub in subtasks {
            println!(
                "  - {} [{}] (#{}, {})",
                sub.name,
                if sub.is_completed { "x" } else { " " },
                sub.id,
                format_minutes(u64::from(sub.estimated_minutes))
            );
        }
    }
    Ok(())
}

fn or_dash(value: Option<String>) -> String {
    value.unwrap_or_else(|| "-".into())
}

/// Complete a task, asking for the actual duration when it wasn't given.
pub fn cmd_complete(
    db: &mut Database,
    db_path: &Path,
    user: &str,
    id: u64,
    actual: Option<String>,
    prompter: &mut dyn Prompter,
) -> Result<()> {
    let task = db.get(user, id).ok_or(Error::NotFound(id))?;
    if task.is_completed {
        return Err(Error::AlreadyCompleted(id));
    }

    let actual = match actual {
        Some(raw) => parse_estimate(&raw)?,
        None => {
            let question = format!(
                "How long did '{}' actually take? (estimated {})",
                task.name,
                format_minutes(u64::from(task.estimated_minutes))
            );
            match prompter.ask_minutes(&question)? {
                Some(m) => m,
                None => {
                    println!("Cancelled.");
                    return Ok(());
                }
            }
        }
    };

    let done = db.complete_task(user, id, actual, Utc::now().timestamp())?;
    db.save(db_path)?;
    println!("Completed task {}.", done.id);
    println!("{}", CompletionFeedback::new(done.estimated_minutes, actual));
    Ok(())
}

/// Delete a task and its subtasks after confirmation.
pub fn cmd_delete(
    db: &mut Database,
    db_path: &Path,
    user: &str,
    id: u64,
    prompter: &mut dyn Prompter,
) -> Result<()> {
    let task = db.get(user, id).ok_or(Error::NotFound(id))?;
    let subtask_count = db.subtasks_of(user, id).len();
    let question = match subtask_count {
        0 => format!("Delete task {} '{}'?", id, task.name),
        n => format!("Delete task {} '{}' and its {} subtask(s)?", id, task.name, n),
    };
    if !prompter.confirm(&question)? {
        println!("Cancelled.");
        return Ok(());
    }

    let removed = db.delete_task(user, id)?;
    db.save(db_path)?;
    println!("Deleted {} task(s).", removed.len());
    Ok(())
}

/// Print the estimation accuracy report.
pub fn cmd_stats(db: &Database, user: &str, json: bool) -> Result<()> {
    let report = analyze(&db.completed_with_actual(user));
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &EstimationReport) {
    println!("Estimation accuracy");
    if report.count == 0 {
        println!("{}", report.message);
        return;
    }
    println!("Tasks completed:  {}", report.count);
    println!(
        "Average accuracy: {} (actual / estimated) {}",
        report.average_accuracy,
        accuracy_glyph(report.average_ratio())
    );
    println!("Total estimated:  {}", format_minutes(report.total_estimated));
    println!("Total actual:     {}", format_minutes(report.total_actual));
    println!("{}", report.message);
    if let Some(tip) = &report.tip {
        println!("Tip: {tip}");
    }
    if report.excluded > 0 {
        println!("({} task(s) without a usable estimate were skipped)", report.excluded);
    }
}

/// Arrow pointing the way actual durations drift from the estimates.
fn accuracy_glyph(ratio: f64) -> &'static str {
    match Tendency::classify(ratio) {
        Tendency::Underestimates => "▲",
        Tendency::Overestimates => "▼",
        _ => "≈",
    }
}

/// Show or update the display name in `config.toml`.
pub fn cmd_profile(
    config: &mut Config,
    data_dir: &Path,
    user: &str,
    name: Option<String>,
) -> Result<()> {
    if let Some(name) = name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(Error::InvalidInput("display name cannot be empty".into()));
        }
        config.display_name = Some(name);
        config.save(data_dir)?;
        println!("Display name set to {}", config.display_name(user));
        return Ok(());
    }
    println!("User:          {}", user);
    println!("Display name:  {}", config.display_name(user));
    Ok(())
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}
