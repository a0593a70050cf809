use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleMetadata {
    pub project_name: String,
    #[serde(default)]
    pub project_description: String,
    pub project_start_date: NaiveDate,
    /// Fixed project end. When unset the backward pass starts from the latest
    /// early finish of any scheduled task.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_end_date: Option<NaiveDate>,
}

impl ScheduleMetadata {
    pub fn starting(project_start_date: NaiveDate) -> Self {
        Self {
            project_start_date,
            ..Self::default()
        }
    }
}

impl Default for ScheduleMetadata {
    fn default() -> Self {
        Self {
            project_name: "New Project".to_string(),
            project_description: "No description".to_string(),
            project_start_date: NaiveDate::from_ymd_opt(2025, 1, 6)
                .expect("2025-01-06 is a valid date"),
            project_end_date: None,
        }
    }
}
