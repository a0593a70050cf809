pub mod calculations;
pub mod calendar;
pub mod dependency;
pub mod edit;
pub mod engine;
pub mod error;
pub mod graph;
pub mod history;
pub mod metadata;
pub mod project;
pub mod resource;
pub mod schedule;
pub mod snapshot;
pub mod table;
pub mod task;
pub mod validation;
pub mod wbs;

pub use calendar::{CalendarException, CalendarSet, ExceptionKind, WorkCalendar, WorkCalendarConfig};
pub use dependency::{Dependency, DependencyType};
pub use edit::Edit;
pub use engine::recompute;
pub use error::{CalendarOwner, DependencyDefect, ScheduleError};
pub use metadata::ScheduleMetadata;
pub use project::{EditBatch, Project};
pub use resource::{Resource, ResourceAllocation};
pub use schedule::{RefreshSummary, Schedule, ScheduleWarning, TaskSchedule};
pub use snapshot::ProjectSnapshot;
pub use table::schedule_frame;
pub use task::{Task, TaskConstraint, TaskId};
pub use wbs::WbsTree;
