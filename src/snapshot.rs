use crate::calendar::{CalendarSet, WorkCalendar};
use crate::dependency::Dependency;
use crate::error::{CalendarOwner, ScheduleError};
use crate::metadata::ScheduleMetadata;
use crate::resource::Resource;
use crate::task::{Task, TaskId};
use serde::{Deserialize, Serialize};

/// Everything one recompute reads. Sibling order in the WBS is the order of
/// `tasks`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    #[serde(default)]
    pub metadata: ScheduleMetadata,
    #[serde(default)]
    pub calendars: CalendarSet,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

impl ProjectSnapshot {
    pub fn new(metadata: ScheduleMetadata) -> Self {
        Self {
            metadata,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn task(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn task_mut(&mut self, task_id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }

    pub fn contains_task(&self, task_id: TaskId) -> bool {
        self.task(task_id).is_some()
    }

    pub fn resource(&self, resource_id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id == resource_id)
    }

    /// Copy without any engine-written fields.
    pub fn structural(&self) -> ProjectSnapshot {
        let mut copy = self.clone();
        for task in &mut copy.tasks {
            task.clear_computed();
        }
        copy
    }

    /// Calendar a task is scheduled on: its own, else the first allocated
    /// resource's, else the project default. A dangling reference is an error,
    /// never a silent fallback.
    pub fn calendar_for(&self, task: &Task) -> Result<&WorkCalendar, ScheduleError> {
        if let Some(calendar_id) = &task.calendar_id {
            return self.calendars.get(calendar_id).ok_or_else(|| {
                ScheduleError::UnresolvedCalendarReference {
                    owner: CalendarOwner::Task(task.id),
                    calendar_id: calendar_id.clone(),
                }
            });
        }
        for allocation in &task.resource_allocations {
            let resource = self.resource(&allocation.resource_id).ok_or_else(|| {
                ScheduleError::UnresolvedResourceReference {
                    task_id: task.id,
                    resource_id: allocation.resource_id.clone(),
                }
            })?;
            if let Some(calendar_id) = &resource.calendar_id {
                return self.calendars.get(calendar_id).ok_or_else(|| {
                    ScheduleError::UnresolvedCalendarReference {
                        owner: CalendarOwner::Resource(resource.id.clone()),
                        calendar_id: calendar_id.clone(),
                    }
                });
            }
        }
        self.calendars.default_calendar()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceAllocation;
    use chrono::Weekday;

    fn six_day_week() -> WorkCalendar {
        WorkCalendar::custom(
            [
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
                Weekday::Sat,
            ],
            [],
        )
        .unwrap()
    }

    #[test]
    fn calendar_lookup_prefers_task_then_resource_then_default() {
        let mut snapshot = ProjectSnapshot::default();
        snapshot.calendars.insert("six", six_day_week());
        snapshot
            .resources
            .push(Resource::new("crew", "Crew").with_calendar("six"));

        let plain = Task::new(1, "plain", 1);
        assert_eq!(
            snapshot.calendar_for(&plain).unwrap(),
            &WorkCalendar::standard()
        );

        let staffed = Task::new(2, "staffed", 1).with_allocation(ResourceAllocation::new("crew", 1.0));
        assert_eq!(snapshot.calendar_for(&staffed).unwrap(), &six_day_week());

        let pinned = Task::new(3, "pinned", 1)
            .with_calendar("standard")
            .with_allocation(ResourceAllocation::new("crew", 1.0));
        assert_eq!(
            snapshot.calendar_for(&pinned).unwrap(),
            &WorkCalendar::standard()
        );
    }

    #[test]
    fn dangling_calendar_reference_is_reported() {
        let snapshot = ProjectSnapshot::default();
        let task = Task::new(4, "night shift", 2).with_calendar("night");
        let err = snapshot.calendar_for(&task).unwrap_err();
        assert_eq!(
            err,
            ScheduleError::UnresolvedCalendarReference {
                owner: CalendarOwner::Task(4),
                calendar_id: "night".into(),
            }
        );
    }

    #[test]
    fn json_round_trip_keeps_structure() {
        let mut snapshot = ProjectSnapshot::default();
        snapshot.tasks.push(Task::new(1, "Design", 3));
        snapshot.tasks.push(Task::milestone(2, "Review"));
        snapshot.dependencies.push(Dependency::finish_to_start(1, 2));
        let json = snapshot.to_json().unwrap();
        let parsed = ProjectSnapshot::from_json(&json).unwrap();
        assert_eq!(parsed, snapshot);
    }
}
