//! Structural edits. Each edit checks its own preconditions and either
//! changes the snapshot or fails leaving it as it was; batching and history
//! live in [`crate::project`].

use crate::calendar::{CalendarException, WorkCalendar};
use crate::dependency::Dependency;
use crate::error::{CalendarOwner, DependencyDefect, ScheduleError};
use crate::resource::{Resource, ResourceAllocation};
use crate::snapshot::ProjectSnapshot;
use crate::task::{Task, TaskConstraint, TaskId};
use crate::validation::{validate_dependency, validate_task};
use crate::wbs::{self, WbsTree};
use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Edit {
    /// Appended after its parent's subtree, or at the end when top-level.
    AddTask { task: Task },
    /// Removes the task, its descendants and every dependency touching them.
    RemoveTask { task_id: TaskId },
    RenameTask { task_id: TaskId, name: String },
    SetDuration { task_id: TaskId, duration_days: i64 },
    SetMilestone { task_id: TaskId, is_milestone: bool },
    SetPercentComplete { task_id: TaskId, percent_complete: f64 },
    SetConstraint {
        task_id: TaskId,
        constraint: Option<TaskConstraint>,
    },
    SetTaskCalendar {
        task_id: TaskId,
        calendar_id: Option<String>,
    },
    SetNotes {
        task_id: TaskId,
        notes: Option<String>,
    },
    AssignResource {
        task_id: TaskId,
        allocation: ResourceAllocation,
    },
    AddDependency { dependency: Dependency },
    RemoveDependency {
        predecessor_id: TaskId,
        successor_id: TaskId,
    },
    AddCalendar {
        calendar_id: String,
        calendar: WorkCalendar,
    },
    RemoveCalendar { calendar_id: String },
    SetCalendarWorkingDays {
        calendar_id: String,
        working_days: Vec<Weekday>,
    },
    AddCalendarException {
        calendar_id: String,
        exception: CalendarException,
    },
    SetDefaultCalendar { calendar_id: String },
    AddResource { resource: Resource },
    Indent { task_id: TaskId },
    Outdent { task_id: TaskId },
    SetProjectStart { date: NaiveDate },
    SetProjectEnd { date: Option<NaiveDate> },
    /// Copy current earliest dates and durations of leaf tasks into their baselines.
    CaptureBaseline,
}

impl Edit {
    /// Short description used as the undo/redo label.
    pub fn label(&self) -> String {
        match self {
            Edit::AddTask { task } => format!("Add task {}", task.id),
            Edit::RemoveTask { task_id } => format!("Remove task {task_id}"),
            Edit::RenameTask { task_id, .. } => format!("Rename task {task_id}"),
            Edit::SetDuration { task_id, .. } => format!("Set duration of task {task_id}"),
            Edit::SetMilestone { task_id, .. } => format!("Toggle milestone on task {task_id}"),
            Edit::SetPercentComplete { task_id, .. } => {
                format!("Set progress of task {task_id}")
            }
            Edit::SetConstraint { task_id, .. } => format!("Set constraint on task {task_id}"),
            Edit::SetTaskCalendar { task_id, .. } => format!("Set calendar of task {task_id}"),
            Edit::SetNotes { task_id, .. } => format!("Edit notes of task {task_id}"),
            Edit::AssignResource {
                task_id,
                allocation,
            } => format!("Assign {} to task {task_id}", allocation.resource_id),
            Edit::AddDependency { dependency } => format!("Link {}", dependency.label()),
            Edit::RemoveDependency {
                predecessor_id,
                successor_id,
            } => format!("Unlink {predecessor_id} -> {successor_id}"),
            Edit::AddCalendar { calendar_id, .. } => format!("Add calendar {calendar_id}"),
            Edit::RemoveCalendar { calendar_id } => format!("Remove calendar {calendar_id}"),
            Edit::SetCalendarWorkingDays { calendar_id, .. } => {
                format!("Change working week of {calendar_id}")
            }
            Edit::AddCalendarException { calendar_id, exception } => {
                format!("Add exception {} to {calendar_id}", exception.date)
            }
            Edit::SetDefaultCalendar { calendar_id } => {
                format!("Use {calendar_id} as default calendar")
            }
            Edit::AddResource { resource } => format!("Add resource {}", resource.id),
            Edit::Indent { task_id } => format!("Indent task {task_id}"),
            Edit::Outdent { task_id } => format!("Outdent task {task_id}"),
            Edit::SetProjectStart { date } => format!("Set project start to {date}"),
            Edit::SetProjectEnd { date: Some(date) } => format!("Set project end to {date}"),
            Edit::SetProjectEnd { date: None } => "Clear project end".to_string(),
            Edit::CaptureBaseline => "Capture baseline".to_string(),
        }
    }

    pub fn apply(&self, snapshot: &mut ProjectSnapshot) -> Result<(), ScheduleError> {
        match self {
            Edit::AddTask { task } => add_task(snapshot, task),
            Edit::RemoveTask { task_id } => remove_task(snapshot, *task_id),
            Edit::RenameTask { task_id, name } => {
                leaf_or_summary_mut(snapshot, *task_id)?.name = name.clone();
                Ok(())
            }
            Edit::SetDuration {
                task_id,
                duration_days,
            } => update_leaf(snapshot, *task_id, |task| {
                task.duration_days = *duration_days;
            }),
            Edit::SetMilestone {
                task_id,
                is_milestone,
            } => update_leaf(snapshot, *task_id, |task| {
                task.is_milestone = *is_milestone;
                if *is_milestone {
                    task.duration_days = 0;
                }
            }),
            Edit::SetPercentComplete {
                task_id,
                percent_complete,
            } => update_leaf(snapshot, *task_id, |task| {
                task.percent_complete = *percent_complete;
            }),
            Edit::SetConstraint {
                task_id,
                constraint,
            } => update_leaf(snapshot, *task_id, |task| {
                task.constraint = *constraint;
            }),
            Edit::SetTaskCalendar {
                task_id,
                calendar_id,
            } => {
                if let Some(calendar_id) = calendar_id {
                    if !snapshot.calendars.contains(calendar_id) {
                        return Err(ScheduleError::UnresolvedCalendarReference {
                            owner: CalendarOwner::Task(*task_id),
                            calendar_id: calendar_id.clone(),
                        });
                    }
                }
                leaf_or_summary_mut(snapshot, *task_id)?.calendar_id = calendar_id.clone();
                Ok(())
            }
            Edit::SetNotes { task_id, notes } => {
                leaf_or_summary_mut(snapshot, *task_id)?.notes = notes.clone();
                Ok(())
            }
            Edit::AssignResource {
                task_id,
                allocation,
            } => {
                if snapshot.resource(&allocation.resource_id).is_none() {
                    return Err(ScheduleError::UnresolvedResourceReference {
                        task_id: *task_id,
                        resource_id: allocation.resource_id.clone(),
                    });
                }
                update_leaf(snapshot, *task_id, |task| {
                    task.resource_allocations
                        .retain(|a| a.resource_id != allocation.resource_id);
                    task.resource_allocations.push(allocation.clone());
                })
            }
            Edit::AddDependency { dependency } => add_dependency(snapshot, dependency),
            Edit::RemoveDependency {
                predecessor_id,
                successor_id,
            } => {
                let before = snapshot.dependencies.len();
                snapshot.dependencies.retain(|d| {
                    !(d.predecessor_id == *predecessor_id && d.successor_id == *successor_id)
                });
                if snapshot.dependencies.len() == before {
                    return Err(ScheduleError::MalformedDependency {
                        predecessor: *predecessor_id,
                        successor: *successor_id,
                        defect: DependencyDefect::NotLinked,
                    });
                }
                Ok(())
            }
            Edit::AddCalendar {
                calendar_id,
                calendar,
            } => {
                if snapshot.calendars.contains(calendar_id) {
                    return Err(ScheduleError::InvalidCalendar {
                        calendar_id: calendar_id.clone(),
                        reason: "a calendar with this id already exists".to_string(),
                    });
                }
                snapshot.calendars.insert(calendar_id.clone(), calendar.clone());
                Ok(())
            }
            Edit::RemoveCalendar { calendar_id } => remove_calendar(snapshot, calendar_id),
            Edit::SetCalendarWorkingDays {
                calendar_id,
                working_days,
            } => calendar_mut(snapshot, calendar_id)?
                .set_working_days(working_days)
                .map_err(|err| ScheduleError::InvalidCalendar {
                    calendar_id: calendar_id.clone(),
                    reason: err.to_string(),
                }),
            Edit::AddCalendarException {
                calendar_id,
                exception,
            } => {
                calendar_mut(snapshot, calendar_id)?.add_exception(exception.clone());
                Ok(())
            }
            Edit::SetDefaultCalendar { calendar_id } => {
                snapshot.calendars.set_default(calendar_id)
            }
            Edit::AddResource { resource } => {
                if snapshot.resource(&resource.id).is_some() {
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
                snapshot.resources.push(resource.clone());
                Ok(())
            }
            Edit::Indent { task_id } => wbs::indent(&mut snapshot.tasks, *task_id),
            Edit::Outdent { task_id } => wbs::outdent(&mut snapshot.tasks, *task_id),
            Edit::SetProjectStart { date } => {
                check_project_dates(*date, snapshot.metadata.project_end_date)?;
                snapshot.metadata.project_start_date = *date;
                Ok(())
            }
            Edit::SetProjectEnd { date } => {
                check_project_dates(snapshot.metadata.project_start_date, *date)?;
                snapshot.metadata.project_end_date = *date;
                Ok(())
            }
            Edit::CaptureBaseline => {
                capture_baseline(snapshot);
                Ok(())
            }
        }
    }
}

fn check_project_dates(start: NaiveDate, end: Option<NaiveDate>) -> Result<(), ScheduleError> {
    match end {
        Some(end) if end < start => Err(ScheduleError::ProjectEndBeforeStart { start, end }),
        _ => Ok(()),
    }
}

fn leaf_or_summary_mut(
    snapshot: &mut ProjectSnapshot,
    task_id: TaskId,
) -> Result<&mut Task, ScheduleError> {
    snapshot
        .task_mut(task_id)
        .ok_or(ScheduleError::UnknownTask(task_id))
}

/// Apply `change` to a non-summary task and re-check it.
fn update_leaf<F>(snapshot: &mut ProjectSnapshot, task_id: TaskId, change: F) -> Result<(), ScheduleError>
where
    F: FnOnce(&mut Task),
{
    let tree = WbsTree::from_tasks(&snapshot.tasks)?;
    let task = leaf_or_summary_mut(snapshot, task_id)?;
    if wbs::is_summary(task, &tree) {
        return Err(ScheduleError::InvalidTask(format!(
            "task {task_id} is a summary; its schedule fields are derived"
        )));
    }
    change(task);
    validate_task(task)
}

fn calendar_mut<'s>(
    snapshot: &'s mut ProjectSnapshot,
    calendar_id: &str,
) -> Result<&'s mut WorkCalendar, ScheduleError> {
    snapshot
        .calendars
        .get_mut(calendar_id)
        .ok_or_else(|| ScheduleError::UnknownCalendar(calendar_id.to_string()))
}

fn add_task(snapshot: &mut ProjectSnapshot, task: &Task) -> Result<(), ScheduleError> {
    if snapshot.contains_task(task.id) {
        return Err(ScheduleError::DuplicateTask(task.id));
    }
    validate_task(task)?;
    if let Some(calendar_id) = &task.calendar_id {
        if !snapshot.calendars.contains(calendar_id) {
            return Err(ScheduleError::UnresolvedCalendarReference {
                owner: CalendarOwner::Task(task.id),
                calendar_id: calendar_id.clone(),
            });
        }
    }
    for allocation in &task.resource_allocations {
        if snapshot.resource(&allocation.resource_id).is_none() {
            return Err(ScheduleError::UnresolvedResourceReference {
                task_id: task.id,
                resource_id: allocation.resource_id.clone(),
            });
        }
    }

    let task = task.structural();
    let position = match task.parent_id {
        None => snapshot.tasks.len(),
        Some(parent_id) => {
            let tree = WbsTree::from_tasks(&snapshot.tasks)?;
            if !snapshot.contains_task(parent_id) {
                return Err(ScheduleError::InvalidWbs(format!(
                    "task {} has unknown parent {}",
                    task.id, parent_id
                )));
            }
            let subtree: HashSet<TaskId> = tree.subtree(parent_id).into_iter().collect();
            let last = snapshot
                .tasks
                .iter()
                .rposition(|t| subtree.contains(&t.id))
                .unwrap_or(snapshot.tasks.len().saturating_sub(1));
            if let Some(parent) = snapshot.task_mut(parent_id) {
                wbs::mark_summary(parent);
            }
            last + 1
        }
    };
    snapshot.tasks.insert(position, task);
    wbs::normalize_order(&mut snapshot.tasks)
}

fn remove_task(snapshot: &mut ProjectSnapshot, task_id: TaskId) -> Result<(), ScheduleError> {
    let tree = WbsTree::from_tasks(&snapshot.tasks)?;
    if !snapshot.contains_task(task_id) {
        return Err(ScheduleError::UnknownTask(task_id));
    }
    let doomed: HashSet<TaskId> = tree.subtree(task_id).into_iter().collect();
    snapshot.tasks.retain(|t| !doomed.contains(&t.id));
    snapshot
        .dependencies
        .retain(|d| !doomed.contains(&d.predecessor_id) && !doomed.contains(&d.successor_id));

    if let Some(parent_id) = tree.parent(task_id) {
        let orphaned = !snapshot.tasks.iter().any(|t| t.parent_id == Some(parent_id));
        if orphaned {
            if let Some(parent) = snapshot.task_mut(parent_id) {
                parent.is_summary = false;
            }
        }
    }
    Ok(())
}

fn add_dependency(snapshot: &mut ProjectSnapshot, dependency: &Dependency) -> Result<(), ScheduleError> {
    let known: HashSet<TaskId> = snapshot.tasks.iter().map(|t| t.id).collect();
    validate_dependency(dependency, &known)?;
    let linked = snapshot.dependencies.iter().any(|d| {
        d.predecessor_id == dependency.predecessor_id && d.successor_id == dependency.successor_id
    });
    if linked {
        return Err(ScheduleError::MalformedDependency {
            predecessor: dependency.predecessor_id,
            successor: dependency.successor_id,
            defect: DependencyDefect::Duplicate,
        });
    }
    snapshot.dependencies.push(dependency.clone());
    Ok(())
}

fn remove_calendar(snapshot: &mut ProjectSnapshot, calendar_id: &str) -> Result<(), ScheduleError> {
    let in_use = |id: &Option<String>| id.as_deref() == Some(calendar_id);
    if let Some(task) = snapshot.tasks.iter().find(|t| in_use(&t.calendar_id)) {
        return Err(ScheduleError::CalendarInUse {
            calendar_id: calendar_id.to_string(),
            owner: CalendarOwner::Task(task.id),
        });
    }
    if let Some(resource) = snapshot.resources.iter().find(|r| in_use(&r.calendar_id)) {
        return Err(ScheduleError::CalendarInUse {
            calendar_id: calendar_id.to_string(),
            owner: CalendarOwner::Resource(resource.id.clone()),
        });
    }
    snapshot.calendars.remove(calendar_id)?;
    Ok(())
}

/// Leaves that have never been scheduled keep whatever baseline they had.
fn capture_baseline(snapshot: &mut ProjectSnapshot) {
    let summaries: HashSet<TaskId> = snapshot
        .tasks
        .iter()
        .filter_map(|t| t.parent_id)
        .chain(snapshot.tasks.iter().filter(|t| t.is_summary).map(|t| t.id))
        .collect();
    for task in snapshot.tasks.iter_mut() {
        if summaries.contains(&task.id) {
            continue;
        }
        if let (Some(start), Some(finish)) = (task.early_start, task.early_finish) {
            task.baseline_start = Some(start);
            task.baseline_finish = Some(finish);
            task.baseline_duration_days = Some(task.duration_days);
        }
    }
}
