use crate::task::{Task, TaskId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Computed dates and float for one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSchedule {
    pub task_id: TaskId,
    pub early_start: NaiveDate,
    pub early_finish: NaiveDate,
    pub late_start: NaiveDate,
    pub late_finish: NaiveDate,
    /// Working days on the task's calendar; negative when constraints conflict.
    pub total_float: i64,
    pub is_critical: bool,
    pub is_summary: bool,
    /// Stored duration for leaves, inclusive working-day span for summaries.
    pub duration_days: i64,
    pub percent_complete: f64,
    pub schedule_variance_days: Option<i64>,
}

/// Something odd about the input that did not stop the schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleWarning {
    /// Constraints leave the task with negative float.
    InfeasibleConstraint { task_id: TaskId, total_float: i64 },
    /// Summary tasks take no part in precedence; the link was skipped.
    SummaryDependencyIgnored {
        predecessor: TaskId,
        successor: TaskId,
    },
    /// Summary with no dated descendants; it gets no dates.
    EmptySummary { task_id: TaskId },
}

impl fmt::Display for ScheduleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleWarning::InfeasibleConstraint {
                task_id,
                total_float,
            } => write!(
                f,
                "task {task_id} cannot meet its constraints (total float {total_float})"
            ),
            ScheduleWarning::SummaryDependencyIgnored {
                predecessor,
                successor,
            } => write!(
                f,
                "dependency {predecessor} -> {successor} touches a summary task and was ignored"
            ),
            ScheduleWarning::EmptySummary { task_id } => {
                write!(f, "summary task {task_id} has no scheduled children")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshSummary {
    pub task_count: usize,
    pub critical_count: usize,
    pub critical_path: Vec<TaskId>,
    pub latest_finish: Option<NaiveDate>,
    pub warning_count: usize,
    pub positive_variance_count: usize,
    pub negative_variance_count: usize,
    pub on_track_variance_count: usize,
}

impl RefreshSummary {
    pub fn to_summary_line(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("tasks={}", self.task_count));
        parts.push(format!("critical={}", self.critical_count));
        if let Some(date) = self.latest_finish {
            parts.push(format!("finish={}", date));
        }
        if self.warning_count > 0 {
            parts.push(format!("warnings={}", self.warning_count));
        }
        if self.positive_variance_count > 0 {
            parts.push(format!("variance+={}", self.positive_variance_count));
        }
        if self.negative_variance_count > 0 {
            parts.push(format!("variance-={}", self.negative_variance_count));
        }
        if self.on_track_variance_count > 0 {
            parts.push(format!("variance0={}", self.on_track_variance_count));
        }
        if !self.critical_path.is_empty() {
            let chain = self
                .critical_path
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("->");
            parts.push(format!("crit_path={}", chain));
        }
        parts.join(", ")
    }
}

/// Output of one recompute. Never partially filled: either every scheduled
/// task has an entry or the recompute failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub project_start: NaiveDate,
    pub project_finish: NaiveDate,
    pub entries: BTreeMap<TaskId, TaskSchedule>,
    pub wbs_codes: BTreeMap<TaskId, String>,
    /// Every task, parents before children.
    pub display_order: Vec<TaskId>,
    /// Chains of critical tasks joined by driving dependencies, each in
    /// precedence order, ordered by earliest start.
    pub critical_paths: Vec<Vec<TaskId>>,
    /// Driving dependencies between critical tasks, as `(predecessor, successor)`.
    pub critical_dependencies: Vec<(TaskId, TaskId)>,
    pub warnings: Vec<ScheduleWarning>,
}

impl Schedule {
    pub fn get(&self, task_id: TaskId) -> Option<&TaskSchedule> {
        self.entries.get(&task_id)
    }

    pub fn is_critical(&self, task_id: TaskId) -> bool {
        self.get(task_id).is_some_and(|entry| entry.is_critical)
    }

    pub fn wbs_code(&self, task_id: TaskId) -> Option<&str> {
        self.wbs_codes.get(&task_id).map(String::as_str)
    }

    /// Critical leaf tasks in display order.
    pub fn critical_tasks(&self) -> Vec<TaskId> {
        self.display_order
            .iter()
            .copied()
            .filter(|id| {
                self.get(*id)
                    .is_some_and(|entry| entry.is_critical && !entry.is_summary)
            })
            .collect()
    }

    pub fn is_critical_dependency(&self, predecessor: TaskId, successor: TaskId) -> bool {
        self.critical_dependencies
            .contains(&(predecessor, successor))
    }

    pub fn summary(&self) -> RefreshSummary {
        let leaves = self.entries.values().filter(|entry| !entry.is_summary);
        let mut summary = RefreshSummary {
            task_count: 0,
            critical_count: 0,
            critical_path: self
                .critical_paths
                .iter()
                .rev()
                .max_by_key(|path| path.len())
                .cloned()
                .unwrap_or_default(),
            latest_finish: None,
            warning_count: self.warnings.len(),
            positive_variance_count: 0,
            negative_variance_count: 0,
            on_track_variance_count: 0,
        };
        for entry in leaves {
            summary.task_count += 1;
            if entry.is_critical {
                summary.critical_count += 1;
            }
            summary.latest_finish = summary.latest_finish.max(Some(entry.early_finish));
            match entry.schedule_variance_days {
                Some(v) if v > 0 => summary.positive_variance_count += 1,
                Some(v) if v < 0 => summary.negative_variance_count += 1,
                Some(_) => summary.on_track_variance_count += 1,
                None => {}
            }
        }
        summary
    }

    /// Write computed fields onto the caller's tasks. Tasks without an entry
    /// (empty summaries, tasks added after the recompute) are cleared.
    pub fn apply_to(&self, tasks: &mut [Task]) {
        for task in tasks.iter_mut() {
            task.clear_computed();
            task.wbs_code = self.wbs_codes.get(&task.id).cloned();
            let Some(entry) = self.entries.get(&task.id) else {
                continue;
            };
            task.early_start = Some(entry.early_start);
            task.early_finish = Some(entry.early_finish);
            task.late_start = Some(entry.late_start);
            task.late_finish = Some(entry.late_finish);
            task.total_float = Some(entry.total_float);
            task.is_critical = Some(entry.is_critical);
            task.schedule_variance_days = entry.schedule_variance_days;
            if entry.is_summary {
                task.duration_days = entry.duration_days;
                task.percent_complete = entry.percent_complete;
            }
        }
    }
}
