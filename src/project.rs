use crate::edit::Edit;
use crate::engine;
use crate::error::ScheduleError;
use crate::history::{EditCommand, History};
use crate::metadata::ScheduleMetadata;
use crate::schedule::Schedule;
use crate::snapshot::ProjectSnapshot;
use crate::task::{Task, TaskId};
use tracing::{debug, warn};

/// Edits applied together: all of them or none.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditBatch {
    label: Option<String>,
    edits: Vec<Edit>,
}

impl EditBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(edit: Edit) -> Self {
        Self {
            label: None,
            edits: vec![edit],
        }
    }

    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            edits: Vec::new(),
        }
    }

    pub fn with(mut self, edit: Edit) -> Self {
        self.edits.push(edit);
        self
    }

    pub fn push(&mut self, edit: Edit) {
        self.edits.push(edit);
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    /// Explicit label, else the single edit's own label.
    pub fn label(&self) -> String {
        match (&self.label, self.edits.as_slice()) {
            (Some(label), _) => label.clone(),
            (None, [edit]) => edit.label(),
            (None, edits) => format!("{} edits", edits.len()),
        }
    }
}

impl FromIterator<Edit> for EditBatch {
    fn from_iter<I: IntoIterator<Item = Edit>>(iter: I) -> Self {
        Self {
            label: None,
            edits: iter.into_iter().collect(),
        }
    }
}

/// The editing-layer store around the engine: owns the snapshot, applies
/// batches, keeps undo/redo history and the last published schedule.
#[derive(Debug, Clone, Default)]
pub struct Project {
    snapshot: ProjectSnapshot,
    history: History,
    schedule: Option<Schedule>,
    last_error: Option<ScheduleError>,
}

impl Project {
    pub fn new(metadata: ScheduleMetadata) -> Self {
        Self::from_snapshot(ProjectSnapshot::new(metadata))
    }

    pub fn from_snapshot(snapshot: ProjectSnapshot) -> Self {
        Self {
            snapshot,
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> &ProjectSnapshot {
        &self.snapshot
    }

    pub fn tasks(&self) -> &[Task] {
        &self.snapshot.tasks
    }

    pub fn task(&self, task_id: TaskId) -> Option<&Task> {
        self.snapshot.task(task_id)
    }

    /// Last successfully computed schedule, possibly older than the snapshot.
    pub fn schedule(&self) -> Option<&Schedule> {
        self.schedule.as_ref()
    }

    /// Failure of the most recent recompute, cleared by the next success.
    pub fn last_error(&self) -> Option<&ScheduleError> {
        self.last_error.as_ref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Apply every edit in order to a working copy and keep it only when
    /// all succeed. Does not recompute.
    pub fn apply(&mut self, batch: EditBatch) -> Result<(), ScheduleError> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut working = self.snapshot.clone();
        for edit in batch.edits() {
            if let Err(err) = edit.apply(&mut working) {
                warn!(edit = %edit.label(), error = %err, "edit rejected, batch discarded");
                return Err(err);
            }
        }
        let label = batch.label();
        debug!(%label, edits = batch.edits().len(), "batch applied");
        self.history.record(EditCommand {
            label,
            before: self.snapshot.structural(),
            after: working.structural(),
        });
        self.snapshot = working;
        Ok(())
    }

    pub fn apply_edit(&mut self, edit: Edit) -> Result<(), ScheduleError> {
        self.apply(EditBatch::single(edit))
    }

    /// Run the engine on the current snapshot. On success the schedule is
    /// published and written onto the tasks; on failure the previous
    /// schedule stays visible and the error is kept in `last_error`.
    pub fn recompute(&mut self) -> Result<&Schedule, ScheduleError> {
        match engine::recompute(&self.snapshot) {
            Ok(schedule) => {
                schedule.apply_to(&mut self.snapshot.tasks);
                self.last_error = None;
                Ok(self.schedule.insert(schedule))
            }
            Err(err) => {
                warn!(error = %err, "recompute failed, keeping previous schedule");
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Restore the structure from before the latest batch. Returns `false`
    /// when there is nothing to undo. The schedule is not recomputed.
    pub fn undo(&mut self) -> bool {
        let Some(before) = self.history.undo() else {
            return false;
        };
        self.snapshot = before.clone();
        self.reapply_schedule();
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(after) = self.history.redo() else {
            return false;
        };
        self.snapshot = after.clone();
        self.reapply_schedule();
        true
    }

    fn reapply_schedule(&mut self) {
        if let Some(schedule) = &self.schedule {
            schedule.apply_to(&mut self.snapshot.tasks);
        }
    }
}
