//! Work breakdown structure: the task forest, its numbering, and the
//! indent/outdent edits that reshape it.
//!
//! The tree is an arena keyed by task id. Each task names its parent, each
//! parent keeps its children in snapshot order, so both directions can be
//! walked without shared ownership.

use crate::error::ScheduleError;
use crate::task::{Task, TaskId};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WbsTree {
    roots: Vec<TaskId>,
    children: HashMap<TaskId, Vec<TaskId>>,
    parents: HashMap<TaskId, TaskId>,
}

impl WbsTree {
    pub fn from_tasks(tasks: &[Task]) -> Result<Self, ScheduleError> {
        let mut known: HashSet<TaskId> = HashSet::with_capacity(tasks.len());
        for task in tasks {
            if !known.insert(task.id) {
                return Err(ScheduleError::DuplicateTask(task.id));
            }
        }

        let mut tree = WbsTree::default();
        for task in tasks {
            tree.children.entry(task.id).or_default();
        }
        for task in tasks {
            match task.parent_id {
                None => tree.roots.push(task.id),
                Some(parent) if parent == task.id => {
                    return Err(ScheduleError::InvalidWbs(format!(
                        "task {} is its own parent",
                        task.id
                    )));
                }
                Some(parent) if !known.contains(&parent) => {
                    return Err(ScheduleError::InvalidWbs(format!(
                        "task {} has unknown parent {}",
                        task.id, parent
                    )));
                }
                Some(parent) => {
                    tree.children.entry(parent).or_default().push(task.id);
                    tree.parents.insert(task.id, parent);
                }
            }
        }

        // Tasks on a parent loop are unreachable from any root.
        let reachable: HashSet<TaskId> = tree.display_order().into_iter().collect();
        if let Some(stuck) = tasks.iter().find(|t| !reachable.contains(&t.id)) {
            return Err(ScheduleError::InvalidWbs(format!(
                "parent chain of task {} loops back on itself",
                stuck.id
            )));
        }
        Ok(tree)
    }

    pub fn roots(&self) -> &[TaskId] {
        &self.roots
    }

    pub fn children(&self, task_id: TaskId) -> &[TaskId] {
        self.children
            .get(&task_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn parent(&self, task_id: TaskId) -> Option<TaskId> {
        self.parents.get(&task_id).copied()
    }

    pub fn has_children(&self, task_id: TaskId) -> bool {
        !self.children(task_id).is_empty()
    }

    /// Children of the same parent (or the roots), in order, including the task.
    pub fn siblings(&self, task_id: TaskId) -> &[TaskId] {
        match self.parent(task_id) {
            Some(parent) => self.children(parent),
            None => &self.roots,
        }
    }

    /// 0 for top-level tasks.
    pub fn depth(&self, task_id: TaskId) -> usize {
        let mut depth = 0;
        let mut current = task_id;
        while let Some(parent) = self.parent(current) {
            depth += 1;
            current = parent;
        }
        depth
    }

    /// Parents before children, siblings in order: the outline as displayed.
    pub fn display_order(&self) -> Vec<TaskId> {
        let mut out = Vec::with_capacity(self.children.len());
        let mut stack: Vec<TaskId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev());
        }
        out
    }

    /// Children before parents, deepest first.
    pub fn post_order(&self) -> Vec<TaskId> {
        let mut out = Vec::with_capacity(self.children.len());
        for &root in &self.roots {
            self.visit_post(root, &mut out);
        }
        out
    }

    fn visit_post(&self, task_id: TaskId, out: &mut Vec<TaskId>) {
        for &child in self.children(task_id) {
            self.visit_post(child, out);
        }
        out.push(task_id);
    }

    /// The task and everything below it.
    pub fn subtree(&self, task_id: TaskId) -> Vec<TaskId> {
        let mut out = Vec::new();
        let mut stack = vec![task_id];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev());
        }
        out
    }

    /// Outline numbers such as `1`, `1.2`, `1.2.1`.
    pub fn wbs_codes(&self) -> HashMap<TaskId, String> {
        let mut codes = HashMap::with_capacity(self.children.len());
        self.number(&self.roots, None, &mut codes);
        codes
    }

    fn number(&self, ids: &[TaskId], prefix: Option<&str>, codes: &mut HashMap<TaskId, String>) {
        for (position, &id) in ids.iter().enumerate() {
            let code = match prefix {
                Some(prefix) => format!("{prefix}.{}", position + 1),
                None => (position + 1).to_string(),
            };
            self.number(self.children(id), Some(&code), codes);
            codes.insert(id, code);
        }
    }
}

/// A task is scheduled as a summary when flagged or when it has children.
pub fn is_summary(task: &Task, tree: &WbsTree) -> bool {
    task.is_summary || tree.has_children(task.id)
}

/// Turn a task into a summary. A summary spans its children, so it can no
/// longer be a milestone.
pub fn mark_summary(task: &mut Task) {
    task.is_summary = true;
    task.is_milestone = false;
}

fn task_mut(tasks: &mut [Task], task_id: TaskId) -> Result<&mut Task, ScheduleError> {
    tasks
        .iter_mut()
        .find(|t| t.id == task_id)
        .ok_or(ScheduleError::UnknownTask(task_id))
}

/// Reorder `tasks` into display order so vector order and sibling order agree.
pub fn normalize_order(tasks: &mut [Task]) -> Result<(), ScheduleError> {
    let tree = WbsTree::from_tasks(tasks)?;
    let position: HashMap<TaskId, usize> = tree
        .display_order()
        .into_iter()
        .enumerate()
        .map(|(idx, id)| (id, idx))
        .collect();
    tasks.sort_by_key(|t| position.get(&t.id).copied().unwrap_or(usize::MAX));
    Ok(())
}

/// Make the task the last child of its previous sibling. Its subtree moves
/// with it and the new parent becomes a summary.
pub fn indent(tasks: &mut [Task], task_id: TaskId) -> Result<(), ScheduleError> {
    normalize_order(tasks)?;
    let tree = WbsTree::from_tasks(tasks)?;
    if !tree.children.contains_key(&task_id) {
        return Err(ScheduleError::UnknownTask(task_id));
    }
    let siblings = tree.siblings(task_id);
    let position = siblings.iter().position(|&id| id == task_id).unwrap_or(0);
    if position == 0 {
        return Err(ScheduleError::InvalidWbs(format!(
            "task {task_id} has no previous sibling to indent under"
        )));
    }
    let new_parent = siblings[position - 1];

    task_mut(tasks, task_id)?.parent_id = Some(new_parent);
    mark_summary(task_mut(tasks, new_parent)?);
    normalize_order(tasks)
}

/// Move the task up one level, directly after its old parent. Siblings that
/// followed it become its children, as in an outline editor.
pub fn outdent(tasks: &mut [Task], task_id: TaskId) -> Result<(), ScheduleError> {
    normalize_order(tasks)?;
    let tree = WbsTree::from_tasks(tasks)?;
    if !tree.children.contains_key(&task_id) {
        return Err(ScheduleError::UnknownTask(task_id));
    }
    let parent = tree.parent(task_id).ok_or_else(|| {
        ScheduleError::InvalidWbs(format!("task {task_id} is already at the top level"))
    })?;
    let siblings = tree.children(parent);
    let position = siblings.iter().position(|&id| id == task_id).unwrap_or(0);
    let followers = siblings[position + 1..].to_vec();
    let had_children = tree.has_children(task_id);

    task_mut(tasks, task_id)?.parent_id = tree.parent(parent);
    for follower in &followers {
        task_mut(tasks, *follower)?.parent_id = Some(task_id);
    }
    if had_children || !followers.is_empty() {
        mark_summary(task_mut(tasks, task_id)?);
    }
    if position == 0 {
        task_mut(tasks, parent)?.is_summary = false;
    }
    normalize_order(tasks)
}
