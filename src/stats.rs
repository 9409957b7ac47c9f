//! Estimation accuracy: how actual durations compare with the estimates.
//!
//! The accuracy ratio of a completed task is `actual / estimated`; 1.0 is a
//! perfect estimate, above 1.0 the task took longer than planned, below 1.0 it
//! took less. [`analyze`] averages the ratios over all completed tasks and
//! classifies the result; [`CompletionFeedback`] is the immediate verdict shown
//! when a single task is completed.

use std::fmt;

use serde::Serialize;
use tracing::warn;

use crate::task::Task;

/// Average ratio at or above which the user is said to underestimate.
pub const UNDERESTIMATE_RATIO: f64 = 1.1;
/// Average ratio at or below which the user is said to overestimate.
pub const OVERESTIMATE_RATIO: f64 = 0.9;
/// Absolute difference in minutes still counted as a spot-on estimate.
pub const SPOT_ON_MINUTES: i64 = 5;

pub const EMPTY_MESSAGE: &str = "Complete some tasks to see your estimation accuracy!";

/// Qualitative reading of the average accuracy ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tendency {
    Underestimates,
    Overestimates,
    Accurate,
    /// Nothing completed yet.
    NoData,
}

impl Tendency {
    pub fn classify(ratio: f64) -> Self {
        if ratio >= UNDERESTIMATE_RATIO {
            Tendency::Underestimates
        } else if ratio <= OVERESTIMATE_RATIO {
            Tendency::Overestimates
        } else {
            Tendency::Accurate
        }
    }

    /// Advice shown under the report.
    pub fn tip(self) -> Option<&'static str> {
        match self {
            Tendency::Underestimates => {
                Some("You tend to underestimate. Try adding buffer time to your estimates.")
            }
            Tendency::Overestimates => {
                Some("You tend to overestimate. Tasks usually take less time than you think!")
            }
            Tendency::Accurate => Some("Great job! Your estimates are very accurate. Keep it up!"),
            Tendency::NoData => None,
        }
    }
}

/// Accuracy of one completed task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskAccuracy {
    pub name: String,
    pub estimated: u32,
    pub actual: u32,
    pub ratio: f64,
    pub difference: i64,
}

impl TaskAccuracy {
    /// `None` when the record cannot yield a ratio: no actual duration or a zero estimate.
    pub fn of(task: &Task) -> Option<Self> {
        let actual = task.actual_minutes?;
        if task.estimated_minutes == 0 {
            return None;
        }
        Some(Self {
            name: task.name.clone(),
            estimated: task.estimated_minutes,
            actual,
            ratio: f64::from(actual) / f64::from(task.estimated_minutes),
            difference: i64::from(actual) - i64::from(task.estimated_minutes),
        })
    }
}

/// Aggregate estimation accuracy over a set of completed tasks.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimationReport {
    pub count: usize,
    /// Mean ratio with two decimals, e.g. `"1.25"`.
    pub average_accuracy: String,
    /// Signed `(ratio - 1) * 100` with one decimal, e.g. `"-25.0"`.
    pub percent_off: String,
    pub total_estimated: u64,
    pub total_actual: u64,
    pub tendency: Tendency,
    pub message: String,
    pub tip: Option<String>,
    /// Records that could not be scored and were left out.
    pub excluded: usize,
    pub per_task: Vec<TaskAccuracy>,
    #[serde(skip)]
    average_ratio: f64,
}

impl EstimationReport {
    /// Unrounded mean of the per-task ratios.
    pub fn average_ratio(&self) -> f64 {
        self.average_ratio
    }
}

/// Compute the estimation report for completed tasks.
///
/// Every scored task weighs the same regardless of its length. Records without
/// an actual duration or with a zero estimate are skipped and counted in
/// `excluded`. With nothing to score the report is neutral: ratio 1.0 and an
/// invitation to complete some tasks.
pub fn analyze(tasks: &[Task]) -> EstimationReport {
    let mut per_task = Vec::with_capacity(tasks.len());
    let mut excluded = 0usize;
    for task in tasks {
        match TaskAccuracy::of(task) {
            Some(acc) => per_task.push(acc),
            None => {
                warn!(task_id = task.id, "skipping task without a usable estimate/actual pair");
                excluded += 1;
            }
        }
    }

    if per_task.is_empty() {
        return EstimationReport {
            count: 0,
            average_accuracy: fixed(1.0, 2),
            percent_off: fixed(0.0, 1),
            total_estimated: 0,
            total_actual: 0,
            tendency: Tendency::NoData,
            message: EMPTY_MESSAGE.to_string(),
            tip: None,
            excluded,
            per_task,
            average_ratio: 1.0,
        };
    }

    let count = per_task.len();
    let average_ratio = per_task.iter().map(|a| a.ratio).sum::<f64>() / count as f64;
    let total_estimated = per_task.iter().map(|a| u64::from(a.estimated)).sum();
    let total_actual = per_task.iter().map(|a| u64::from(a.actual)).sum();

    let off = (average_ratio - 1.0) * 100.0;
    let tendency = Tendency::classify(average_ratio);
    let message = match tendency {
        Tendency::Underestimates => {
            format!("You typically underestimate by {}%", fixed(off.abs(), 1))
        }
        Tendency::Overestimates => {
            format!("You typically overestimate by {}%", fixed(off.abs(), 1))
        }
        _ => "Your estimates are pretty accurate!".to_string(),
    };

    EstimationReport {
        count,
        average_accuracy: fixed(average_ratio, 2),
        percent_off: fixed(off, 1),
        total_estimated,
        total_actual,
        tendency,
        message,
        tip: tendency.tip().map(str::to_string),
        excluded,
        per_task,
        average_ratio,
    }
}

/// Format with a fixed number of decimals, never producing a negative zero.
///
/// Halves round away from zero (`1.125` gives `"1.13"`), unlike `{:.N}`
/// which rounds them to even.
fn fixed(value: f64, places: usize) -> String {
    let scale = 10f64.powi(places as i32);
    let rounded = (value * scale).round() / scale;
    let s = format!("{rounded:.places$}");
    match s.strip_prefix('-') {
        Some(rest) if rest.chars().all(|c| c == '0' || c == '.') => rest.to_string(),
        _ => s,
    }
}

/// Verdict on a single task right after it is completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionFeedback {
    /// Within [`SPOT_ON_MINUTES`] of the estimate.
    SpotOn,
    Over { minutes: u32, percent: i64 },
    Under { minutes: u32, percent: i64 },
}

impl CompletionFeedback {
    pub fn new(estimated: u32, actual: u32) -> Self {
        let diff = i64::from(actual) - i64::from(estimated);
        if diff.abs() <= SPOT_ON_MINUTES {
            return CompletionFeedback::SpotOn;
        }
        let percent = if estimated == 0 {
            0
        } else {
            (diff as f64 / f64::from(estimated) * 100.0).round().abs() as i64
        };
        let minutes = diff.unsigned_abs() as u32;
        if diff > 0 {
            CompletionFeedback::Over { minutes, percent }
        } else {
            CompletionFeedback::Under { minutes, percent }
        }
    }
}

impl fmt::Display for CompletionFeedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionFeedback::SpotOn => write!(f, "Great estimate! You were spot on!"),
            CompletionFeedback::Over { minutes, percent } => write!(
                f,
                "It took {minutes} minutes longer than estimated ({percent}% over). \
                 Consider this for future estimates!"
            ),
            CompletionFeedback::Under { minutes, percent } => write!(
                f,
                "It took {minutes} minutes less than estimated ({percent}% under). \
                 You're getting better at estimating!"
            ),
        }
    }
}
