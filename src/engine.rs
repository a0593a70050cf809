//! One full recompute: validate, order, forward pass, backward pass, float,
//! roll-up. The input snapshot is never modified.

use crate::calculations::{BackwardPass, CriticalPathIdentifier, ForwardPass, WbsAggregator};
use crate::calendar::WorkCalendar;
use crate::error::ScheduleError;
use crate::graph::{DependencyGraph, TaskNode};
use crate::schedule::{Schedule, TaskSchedule};
use crate::snapshot::ProjectSnapshot;
use crate::task::{Task, TaskId};
use crate::validation::validate_snapshot;
use crate::wbs::{WbsTree, is_summary};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

pub fn recompute(snapshot: &ProjectSnapshot) -> Result<Schedule, ScheduleError> {
    debug!(
        tasks = snapshot.tasks.len(),
        dependencies = snapshot.dependencies.len(),
        "recomputing schedule"
    );
    validate_snapshot(snapshot)?;
    let tree = WbsTree::from_tasks(&snapshot.tasks)?;

    // Any unresolved calendar fails the whole recompute.
    let mut calendars: HashMap<TaskId, &WorkCalendar> = HashMap::with_capacity(snapshot.tasks.len());
    let mut nodes = Vec::with_capacity(snapshot.tasks.len());
    for task in &snapshot.tasks {
        let calendar = snapshot.calendar_for(task)?;
        calendars.insert(task.id, calendar);
        if !is_summary(task, &tree) {
            nodes.push(TaskNode {
                task_id: task.id,
                duration_days: task.duration_days,
                constraint: task.constraint,
                calendar,
            });
        }
    }

    let (dag, mut warnings) = DependencyGraph::build(nodes, &snapshot.dependencies);
    let order = dag.topological_order()?;

    let project_start = snapshot.metadata.project_start_date;
    let early = ForwardPass::new(&dag).execute(&order, project_start);

    // Latest finish over every leaf, not only terminal tasks: an SS/SF
    // predecessor can finish after its successors.
    let computed_finish = early.dates.values().map(|dates| dates.finish).max();
    let project_end = snapshot
        .metadata
        .project_end_date
        .or(computed_finish)
        .unwrap_or(project_start);
    debug!(%project_start, %project_end, "forward pass done");

    let late = BackwardPass::new(&dag).execute(&order, project_end);
    let analysis = CriticalPathIdentifier::new(&dag).analyze(&order, &early, &late);

    let task_by_id: HashMap<TaskId, &Task> = snapshot.tasks.iter().map(|t| (t.id, t)).collect();
    let mut entries: BTreeMap<TaskId, TaskSchedule> = BTreeMap::new();
    for &node_ix in &order {
        let node = dag.node(node_ix);
        let (Some(e), Some(l)) = (early.dates.get(&node_ix), late.get(&node_ix)) else {
            continue;
        };
        let percent_complete = task_by_id
            .get(&node.task_id)
            .map_or(0.0, |task| task.percent_complete);
        entries.insert(
            node.task_id,
            TaskSchedule {
                task_id: node.task_id,
                early_start: e.start,
                early_finish: e.finish,
                late_start: l.start,
                late_finish: l.finish,
                total_float: analysis.total_float.get(&node_ix).copied().unwrap_or(0),
                is_critical: analysis.critical.contains(&node_ix),
                is_summary: false,
                duration_days: node.duration_days,
                percent_complete,
                schedule_variance_days: None,
            },
        );
    }
    warnings.extend(analysis.warnings);
    warnings.extend(WbsAggregator::new(&tree).roll_up(&task_by_id, &calendars, &mut entries));

    for task in &snapshot.tasks {
        if let (Some(entry), Some(calendar)) = (entries.get_mut(&task.id), calendars.get(&task.id)) {
            entry.schedule_variance_days = schedule_variance(task, entry, calendar);
        }
    }

    let schedule = Schedule {
        project_start,
        project_finish: project_end,
        entries,
        wbs_codes: tree.wbs_codes().into_iter().collect(),
        display_order: tree.display_order(),
        critical_paths: analysis.paths,
        critical_dependencies: analysis.critical_dependencies,
        warnings,
    };
    info!(summary = %schedule.summary().to_summary_line(), "schedule recomputed");
    Ok(schedule)
}

/// Working days the current plan has moved from the baseline; positive
/// means later. Finish dates are compared when a baseline finish exists.
pub fn schedule_variance(task: &Task, entry: &TaskSchedule, calendar: &WorkCalendar) -> Option<i64> {
    match (task.baseline_start, task.baseline_finish) {
        (_, Some(baseline_finish)) => {
            Some(calendar.working_days_between(baseline_finish, entry.early_finish))
        }
        (Some(baseline_start), None) => {
            Some(calendar.working_days_between(baseline_start, entry.early_start))
        }
        (None, None) => None,
    }
}
