use crate::calendar::WorkCalendar;
use crate::schedule::{ScheduleWarning, TaskSchedule};
use crate::task::{Task, TaskId};
use crate::wbs::{WbsTree, is_summary};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Duration-weighted progress of the leaves under a node.
#[derive(Debug, Clone, Copy, Default)]
struct Progress {
    weighted: f64,
    weight: f64,
    plain: f64,
    leaves: usize,
}

impl Progress {
    fn leaf(task: &Task) -> Self {
        let weight = task.duration_days.max(0) as f64;
        Self {
            weighted: task.percent_complete * weight,
            weight,
            plain: task.percent_complete,
            leaves: 1,
        }
    }

    fn merge(&mut self, other: Progress) {
        self.weighted += other.weighted;
        self.weight += other.weight;
        self.plain += other.plain;
        self.leaves += other.leaves;
    }

    /// Zero-length leaves alone fall back to a plain mean.
    fn fraction(&self) -> f64 {
        if self.weight > 0.0 {
            self.weighted / self.weight
        } else if self.leaves > 0 {
            self.plain / self.leaves as f64
        } else {
            0.0
        }
    }
}

/// Derives summary rows from their children, deepest summaries first.
pub struct WbsAggregator<'t> {
    tree: &'t WbsTree,
}

impl<'t> WbsAggregator<'t> {
    pub fn new(tree: &'t WbsTree) -> Self {
        Self { tree }
    }

    /// `entries` must already hold every leaf. Summaries are inserted; a
    /// summary with nothing dated beneath it is reported and left out.
    pub fn roll_up(
        &self,
        tasks: &HashMap<TaskId, &Task>,
        calendars: &HashMap<TaskId, &WorkCalendar>,
        entries: &mut BTreeMap<TaskId, TaskSchedule>,
    ) -> Vec<ScheduleWarning> {
        let mut warnings = Vec::new();
        let mut progress: HashMap<TaskId, Progress> = HashMap::with_capacity(tasks.len());

        for task_id in self.tree.post_order() {
            let Some(task) = tasks.get(&task_id) else {
                continue;
            };
            if !is_summary(task, self.tree) {
                progress.insert(task_id, Progress::leaf(task));
                continue;
            }

            let children = self.tree.children(task_id);
            let mut acc = Progress::default();
            for child in children {
                if let Some(p) = progress.get(child) {
                    acc.merge(*p);
                }
            }
            progress.insert(task_id, acc);

            let dated: Vec<&TaskSchedule> =
                children.iter().filter_map(|c| entries.get(c)).collect();
            let (Some(first), Some(calendar)) = (dated.first(), calendars.get(&task_id)) else {
                debug!(task_id, "summary has nothing to roll up");
                warnings.push(ScheduleWarning::EmptySummary { task_id });
                continue;
            };

            let mut entry = TaskSchedule {
                task_id,
                early_start: first.early_start,
                early_finish: first.early_finish,
                late_start: first.late_start,
                late_finish: first.late_finish,
                total_float: 0,
                is_critical: false,
                is_summary: true,
                duration_days: 0,
                percent_complete: acc.fraction(),
                schedule_variance_days: None,
            };
            for child in &dated {
                entry.early_start = entry.early_start.min(child.early_start);
                entry.early_finish = entry.early_finish.max(child.early_finish);
                entry.late_start = entry.late_start.min(child.late_start);
                entry.late_finish = entry.late_finish.max(child.late_finish);
                entry.is_critical |= child.is_critical;
            }
            entry.total_float = calendar.working_days_between(entry.early_start, entry.late_start);
            entry.duration_days = calendar.count_working_days(entry.early_start, entry.early_finish);
            entries.insert(task_id, entry);
        }

        warnings
    }
}
