use crate::task::TaskId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which end of a task a dependency rule reads or constrains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Finish,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyType {
    #[default]
    #[serde(rename = "FS")]
    FinishToStart,
    #[serde(rename = "SS")]
    StartToStart,
    #[serde(rename = "FF")]
    FinishToFinish,
    #[serde(rename = "SF")]
    StartToFinish,
}

impl DependencyType {
    pub const ALL: [DependencyType; 4] = [
        DependencyType::FinishToStart,
        DependencyType::StartToStart,
        DependencyType::FinishToFinish,
        DependencyType::StartToFinish,
    ];

    pub fn code(self) -> &'static str {
        match self {
            DependencyType::FinishToStart => "FS",
            DependencyType::StartToStart => "SS",
            DependencyType::FinishToFinish => "FF",
            DependencyType::StartToFinish => "SF",
        }
    }

    /// `(predecessor anchor, successor anchor)`: the forward pass reads the
    /// first and constrains the second, the backward pass the reverse.
    pub fn anchors(self) -> (Anchor, Anchor) {
        match self {
            DependencyType::FinishToStart => (Anchor::Finish, Anchor::Start),
            DependencyType::StartToStart => (Anchor::Start, Anchor::Start),
            DependencyType::FinishToFinish => (Anchor::Finish, Anchor::Finish),
            DependencyType::StartToFinish => (Anchor::Start, Anchor::Finish),
        }
    }

    /// Working days between the predecessor anchor and the earliest allowed
    /// successor anchor.
    ///
    /// Finish dates are inclusive, so a finish-to-start link moves one extra
    /// day past a predecessor that occupies time. Zero-length predecessors
    /// finish at the start of their day and add nothing.
    pub fn offset(self, lag_days: i64, predecessor_is_zero_duration: bool) -> i64 {
        match self.anchors() {
            (Anchor::Finish, Anchor::Start) if !predecessor_is_zero_duration => {
                lag_days.saturating_add(1)
            }
            _ => lag_days,
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub predecessor_id: TaskId,
    pub successor_id: TaskId,
    #[serde(rename = "type", default)]
    pub dependency_type: DependencyType,
    /// Working days; negative values are leads.
    #[serde(default)]
    pub lag_days: i64,
}

impl Dependency {
    pub fn new(predecessor_id: TaskId, successor_id: TaskId, dependency_type: DependencyType) -> Self {
        Self {
            predecessor_id,
            successor_id,
            dependency_type,
            lag_days: 0,
        }
    }

    pub fn finish_to_start(predecessor_id: TaskId, successor_id: TaskId) -> Self {
        Self::new(predecessor_id, successor_id, DependencyType::FinishToStart)
    }

    pub fn with_lag(mut self, lag_days: i64) -> Self {
        self.lag_days = lag_days;
        self
    }

    /// Label in the `3FS+2d` form shown next to a successor.
    pub fn label(&self) -> String {
        let lag = match self.lag_days {
            0 => String::new(),
            lag if lag > 0 => format!("+{lag}d"),
            lag => format!("{lag}d"),
        };
        format!("{}{}{}", self.predecessor_id, self.dependency_type, lag)
    }

    pub fn links(&self, a: TaskId, b: TaskId) -> bool {
        (self.predecessor_id == a && self.successor_id == b)
            || (self.predecessor_id == b && self.successor_id == a)
    }

    pub fn touches(&self, task_id: TaskId) -> bool {
        self.predecessor_id == task_id || self.successor_id == task_id
    }
}
