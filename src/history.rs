use crate::snapshot::ProjectSnapshot;
use std::collections::VecDeque;

pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// One applied batch: the structure before and after it.
#[derive(Debug, Clone, PartialEq)]
pub struct EditCommand {
    pub label: String,
    pub before: ProjectSnapshot,
    pub after: ProjectSnapshot,
}

/// Undo/redo stacks. Recording a new command clears the redo stack; the
/// oldest commands fall off once `limit` is reached.
#[derive(Debug, Clone)]
pub struct History {
    undo: VecDeque<EditCommand>,
    redo: Vec<EditCommand>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn record(&mut self, command: EditCommand) {
        self.redo.clear();
        if self.undo.len() == self.limit {
            self.undo.pop_front();
        }
        self.undo.push_back(command);
    }

    /// Moves the latest command to the redo stack and returns the structure to restore.
    pub fn undo(&mut self) -> Option<&ProjectSnapshot> {
        let command = self.undo.pop_back()?;
        self.redo.push(command);
        self.redo.last().map(|c| &c.before)
    }

    pub fn redo(&mut self) -> Option<&ProjectSnapshot> {
        let command = self.redo.pop()?;
        self.undo.push_back(command);
        self.undo.back().map(|c| &c.after)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_label(&self) -> Option<&str> {
        self.undo.back().map(|c| c.label.as_str())
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.redo.last().map(|c| c.label.as_str())
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
