use serde::{Deserialize, Serialize};

/// A person, crew or piece of equipment. Only its calendar matters to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_id: Option<String>,
}

impl Resource {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            calendar_id: None,
        }
    }

    pub fn with_calendar(mut self, calendar_id: impl Into<String>) -> Self {
        self.calendar_id = Some(calendar_id.into());
        self
    }
}

/// Represents an allocation of a resource to a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceAllocation {
    pub resource_id: String,
    /// Planned share of the resource, 1.0 = full time. Not used for scheduling.
    #[serde(default = "ResourceAllocation::full_time")]
    pub allocation_units: f64,
}

impl ResourceAllocation {
    pub fn new(resource_id: impl Into<String>, allocation_units: f64) -> Self {
        Self {
            resource_id: resource_id.into(),
            allocation_units,
        }
    }

    fn full_time() -> f64 {
        1.0
    }
}
