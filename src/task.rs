use crate::resource::ResourceAllocation;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type TaskId = i32;

/// A manually fixed date on a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "date", rename_all = "snake_case")]
pub enum TaskConstraint {
    /// Floor on the earliest start.
    StartNoEarlierThan(NaiveDate),
    /// Pins the start, whatever the predecessors allow.
    MustStartOn(NaiveDate),
    /// Floor on the earliest finish.
    FinishNoEarlierThan(NaiveDate),
    /// Pins the finish, whatever the predecessors allow.
    MustFinishOn(NaiveDate),
}

impl TaskConstraint {
    pub fn date(&self) -> NaiveDate {
        match *self {
            TaskConstraint::StartNoEarlierThan(date)
            | TaskConstraint::MustStartOn(date)
            | TaskConstraint::FinishNoEarlierThan(date)
            | TaskConstraint::MustFinishOn(date) => date,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            TaskConstraint::StartNoEarlierThan(_) => "SNET",
            TaskConstraint::MustStartOn(_) => "MSO",
            TaskConstraint::FinishNoEarlierThan(_) => "FNET",
            TaskConstraint::MustFinishOn(_) => "MFO",
        }
    }

    pub fn is_pin(&self) -> bool {
        matches!(
            self,
            TaskConstraint::MustStartOn(_) | TaskConstraint::MustFinishOn(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    /// Working days. Ignored for summaries, always 0 for milestones.
    #[serde(default)]
    pub duration_days: i64,
    #[serde(default)]
    pub is_milestone: bool,
    #[serde(default)]
    pub is_summary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<TaskConstraint>,
    /// Fraction complete in `0.0..=1.0`. Derived for summaries.
    #[serde(default)]
    pub percent_complete: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_allocations: Vec<ResourceAllocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_finish: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_duration_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    // Written only by the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub early_start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub early_finish: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub late_start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub late_finish: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_float: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_critical: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wbs_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_variance_days: Option<i64>,
}

impl Task {
    pub fn new(id: TaskId, name: impl Into<String>, duration_days: i64) -> Self {
        Self {
            id,
            name: name.into(),
            duration_days,
            is_milestone: false,
            is_summary: false,
            parent_id: None,
            calendar_id: None,
            constraint: None,
            percent_complete: 0.0,
            resource_allocations: Vec::new(),
            baseline_start: None,
            baseline_finish: None,
            baseline_duration_days: None,
            notes: None,
            early_start: None,
            early_finish: None,
            late_start: None,
            late_finish: None,
            total_float: None,
            is_critical: None,
            wbs_code: None,
            schedule_variance_days: None,
        }
    }

    pub fn milestone(id: TaskId, name: impl Into<String>) -> Self {
        Self {
            is_milestone: true,
            ..Self::new(id, name, 0)
        }
    }

    pub fn summary(id: TaskId, name: impl Into<String>) -> Self {
        Self {
            is_summary: true,
            ..Self::new(id, name, 0)
        }
    }

    pub fn with_parent(mut self, parent_id: TaskId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_calendar(mut self, calendar_id: impl Into<String>) -> Self {
        self.calendar_id = Some(calendar_id.into());
        self
    }

    pub fn with_constraint(mut self, constraint: TaskConstraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    pub fn with_percent_complete(mut self, percent_complete: f64) -> Self {
        self.percent_complete = percent_complete;
        self
    }

    pub fn with_allocation(mut self, allocation: ResourceAllocation) -> Self {
        self.resource_allocations.push(allocation);
        self
    }

    /// Milestones and zero-length tasks start and finish on the same day.
    pub fn is_zero_duration(&self) -> bool {
        self.is_milestone || self.duration_days == 0
    }

    pub fn clear_computed(&mut self) {
        self.early_start = None;
        self.early_finish = None;
        self.late_start = None;
        self.late_finish = None;
        self.total_float = None;
        self.is_critical = None;
        self.wbs_code = None;
        self.schedule_variance_days = None;
    }

    /// Copy of the task carrying only editing-layer fields.
    pub fn structural(&self) -> Task {
        let mut task = self.clone();
        task.clear_computed();
        task
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_kind_flags() {
        let m = Task::milestone(7, "Go live");
        assert!(m.is_milestone && m.is_zero_duration());
        assert_eq!(m.duration_days, 0);

        let s = Task::summary(1, "Phase 1");
        assert!(s.is_summary);

        let t = Task::new(2, "Design", 0);
        assert!(!t.is_milestone);
        assert!(t.is_zero_duration());
    }

    #[test]
    fn structural_copy_drops_computed_fields() {
        let mut t = Task::new(1, "Build", 3);
        t.early_start = NaiveDate::from_ymd_opt(2024, 1, 1);
        t.total_float = Some(2);
        t.wbs_code = Some("1".into());
        let s = t.structural();
        assert_eq!(s.early_start, None);
        assert_eq!(s.total_float, None);
        assert_eq!(s.wbs_code, None);
        assert_eq!(s.duration_days, 3);
    }

    #[test]
    fn constraint_serializes_with_kind_tag() {
        let c = TaskConstraint::MustStartOn(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, r#"{"kind":"must_start_on","date":"2024-02-01"}"#);
        assert_eq!(c.code(), "MSO");
        assert!(c.is_pin());
    }
}
