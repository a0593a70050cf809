use crate::dependency::Dependency;
use crate::error::{CalendarOwner, DependencyDefect, ScheduleError};
use crate::snapshot::ProjectSnapshot;
use crate::task::{Task, TaskId};
use crate::wbs::{self, WbsTree};
use std::collections::HashSet;

const EPSILON: f64 = 1e-6;

/// Upper bound, in working days, on a task duration or a link lag.
pub const MAX_SPAN_DAYS: i64 = 100_000;

pub fn validate_task(task: &Task) -> Result<(), ScheduleError> {
    check_task(task, task.is_summary)
}

/// Summaries carry a derived duration, so the milestone rule and the span
/// bound do not apply to them.
fn check_task(task: &Task, summary: bool) -> Result<(), ScheduleError> {
    if task.duration_days < 0 {
        return Err(ScheduleError::InvalidTask(format!(
            "task {} has negative duration {}",
            task.id, task.duration_days
        )));
    }
    if !summary && task.duration_days > MAX_SPAN_DAYS {
        return Err(ScheduleError::InvalidTask(format!(
            "task {} duration {} exceeds {} working days",
            task.id, task.duration_days, MAX_SPAN_DAYS
        )));
    }

    if task.is_milestone && !summary && task.duration_days != 0 {
        return Err(ScheduleError::InvalidTask(format!(
            "milestone task {} must have zero duration (got {})",
            task.id, task.duration_days
        )));
    }

    let pct = task.percent_complete;
    if !pct.is_finite() || pct < -EPSILON || pct > 1.0 + EPSILON {
        return Err(ScheduleError::InvalidTask(format!(
            "task {} has invalid percent_complete {} (must be between 0 and 1)",
            task.id, pct
        )));
    }

    for (idx, allocation) in task.resource_allocations.iter().enumerate() {
        if allocation.resource_id.trim().is_empty() {
            return Err(ScheduleError::InvalidTask(format!(
                "task {} resource allocation #{} requires a non-empty resource_id",
                task.id, idx
            )));
        }
        if !allocation.allocation_units.is_finite() || allocation.allocation_units < -EPSILON {
            return Err(ScheduleError::InvalidTask(format!(
                "task {} allocation for '{}' has invalid allocation_units {}",
                task.id, allocation.resource_id, allocation.allocation_units
            )));
        }
    }

    Ok(())
}

pub fn validate_task_collection(tasks: &[Task]) -> Result<(), ScheduleError> {
    let mut seen_ids = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if !seen_ids.insert(task.id) {
            return Err(ScheduleError::DuplicateTask(task.id));
        }
    }
    let tree = WbsTree::from_tasks(tasks)?;
    for task in tasks {
        check_task(task, wbs::is_summary(task, &tree))?;
    }
    Ok(())
}

pub fn validate_dependency(
    dependency: &Dependency,
    known: &HashSet<TaskId>,
) -> Result<(), ScheduleError> {
    let defect = if dependency.predecessor_id == dependency.successor_id {
        Some(DependencyDefect::SelfReference)
    } else if !known.contains(&dependency.predecessor_id) {
        Some(DependencyDefect::UnknownPredecessor)
    } else if !known.contains(&dependency.successor_id) {
        Some(DependencyDefect::UnknownSuccessor)
    } else if dependency.lag_days.unsigned_abs() > MAX_SPAN_DAYS.unsigned_abs() {
        Some(DependencyDefect::LagOutOfRange)
    } else {
        None
    };
    match defect {
        Some(defect) => Err(ScheduleError::MalformedDependency {
            predecessor: dependency.predecessor_id,
            successor: dependency.successor_id,
            defect,
        }),
        None => Ok(()),
    }
}

/// Every structural check a recompute needs before any date is computed.
/// Cycles are left to the graph, which can name the tasks involved.
pub fn validate_snapshot(snapshot: &ProjectSnapshot) -> Result<(), ScheduleError> {
    let metadata = &snapshot.metadata;
    if let Some(end) = metadata.project_end_date {
        if end < metadata.project_start_date {
            return Err(ScheduleError::ProjectEndBeforeStart {
                start: metadata.project_start_date,
                end,
            });
        }
    }
    snapshot.calendars.default_calendar()?;
    validate_task_collection(&snapshot.tasks)?;

    let mut resource_ids = HashSet::with_capacity(snapshot.resources.len());
    for resource in &snapshot.resources {
        if !resource_ids.insert(resource.id.as_str()) {
            return Err(ScheduleError::DuplicateResource(resource.id.clone()));
        }
        if let Some(calendar_id) = &resource.calendar_id {
            if !snapshot.calendars.contains(calendar_id) {
                return Err(ScheduleError::UnresolvedCalendarReference {
                    owner: CalendarOwner::Resource(resource.id.clone()),
                    calendar_id: calendar_id.clone(),
                });
            }
        }
    }

    for task in &snapshot.tasks {
        if let Some(calendar_id) = &task.calendar_id {
            if !snapshot.calendars.contains(calendar_id) {
                return Err(ScheduleError::UnresolvedCalendarReference {
                    owner: CalendarOwner::Task(task.id),
                    calendar_id: calendar_id.clone(),
                });
            }
        }
        for allocation in &task.resource_allocations {
            if !resource_ids.contains(allocation.resource_id.as_str()) {
                return Err(ScheduleError::UnresolvedResourceReference {
                    task_id: task.id,
                    resource_id: allocation.resource_id.clone(),
                });
            }
        }
    }

    let known: HashSet<TaskId> = snapshot.tasks.iter().map(|t| t.id).collect();
    let mut seen_pairs = HashSet::with_capacity(snapshot.dependencies.len());
    for dependency in &snapshot.dependencies {
        validate_dependency(dependency, &known)?;
        if !seen_pairs.insert((dependency.predecessor_id, dependency.successor_id)) {
            return Err(ScheduleError::MalformedDependency {
                predecessor: dependency.predecessor_id,
                successor: dependency.successor_id,
                defect: DependencyDefect::Duplicate,
            });
        }
    }
    Ok(())
}
