use crate::task::TaskId;
use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;

/// Who holds a calendar reference that could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarOwner {
    Task(TaskId),
    Resource(String),
    Project,
}

impl fmt::Display for CalendarOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalendarOwner::Task(id) => write!(f, "task {id}"),
            CalendarOwner::Resource(id) => write!(f, "resource '{id}'"),
            CalendarOwner::Project => write!(f, "project default"),
        }
    }
}

/// Why a dependency record cannot enter the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyDefect {
    SelfReference,
    UnknownPredecessor,
    UnknownSuccessor,
    Duplicate,
    NotLinked,
    LagOutOfRange,
}

impl fmt::Display for DependencyDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DependencyDefect::SelfReference => "a task cannot depend on itself",
            DependencyDefect::UnknownPredecessor => "predecessor does not exist",
            DependencyDefect::UnknownSuccessor => "successor does not exist",
            DependencyDefect::Duplicate => "the tasks are already linked",
            DependencyDefect::NotLinked => "the tasks are not linked",
            DependencyDefect::LagOutOfRange => "lag is out of range",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("circular dependency among tasks [{}]", join_ids(.task_ids))]
    CircularDependency { task_ids: Vec<TaskId> },

    #[error("{owner} references unknown calendar '{calendar_id}'")]
    UnresolvedCalendarReference {
        owner: CalendarOwner,
        calendar_id: String,
    },

    #[error("task {task_id} references unknown resource '{resource_id}'")]
    UnresolvedResourceReference {
        task_id: TaskId,
        resource_id: String,
    },

    #[error("malformed dependency {predecessor} -> {successor}: {defect}")]
    MalformedDependency {
        predecessor: TaskId,
        successor: TaskId,
        defect: DependencyDefect,
    },

    #[error("task {0} not found")]
    UnknownTask(TaskId),

    #[error("duplicate task id {0}")]
    DuplicateTask(TaskId),

    #[error("{0}")]
    InvalidTask(String),

    #[error("calendar '{0}' not found")]
    UnknownCalendar(String),

    #[error("calendar '{calendar_id}' is still used by {owner}")]
    CalendarInUse {
        calendar_id: String,
        owner: CalendarOwner,
    },

    #[error("invalid calendar '{calendar_id}': {reason}")]
    InvalidCalendar { calendar_id: String, reason: String },

    #[error("duplicate resource id '{0}'")]
    DuplicateResource(String),

    #[error("invalid wbs structure: {0}")]
    InvalidWbs(String),

    #[error("project start date {start} must be on or before project end date {end}")]
    ProjectEndBeforeStart { start: NaiveDate, end: NaiveDate },
}

impl ScheduleError {
    /// Task ids implicated by the failure, for highlighting.
    pub fn task_ids(&self) -> Vec<TaskId> {
        match self {
            ScheduleError::CircularDependency { task_ids } => task_ids.clone(),
            ScheduleError::UnresolvedCalendarReference {
                owner: CalendarOwner::Task(id),
                ..
            } => vec![*id],
            ScheduleError::UnresolvedResourceReference { task_id, .. } => vec![*task_id],
            ScheduleError::MalformedDependency {
                predecessor,
                successor,
                ..
            } => vec![*predecessor, *successor],
            ScheduleError::UnknownTask(id) | ScheduleError::DuplicateTask(id) => vec![*id],
            _ => Vec::new(),
        }
    }
}

fn join_ids(ids: &[TaskId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
