use crate::calendar::WorkCalendar;
use crate::dependency::{Dependency, DependencyType};
use crate::error::ScheduleError;
use crate::schedule::ScheduleWarning;
use crate::task::{TaskConstraint, TaskId};
use chrono::NaiveDate;
use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, VecDeque};
use tracing::warn;

/// A schedulable (non-summary) task as the passes see it.
#[derive(Debug, Clone, Copy)]
pub struct TaskNode<'a> {
    pub task_id: TaskId,
    pub duration_days: i64,
    pub constraint: Option<TaskConstraint>,
    pub calendar: &'a WorkCalendar,
}

impl<'a> TaskNode<'a> {
    pub fn is_zero_duration(&self) -> bool {
        self.duration_days == 0
    }

    /// Finish date of a task starting on `start`, both days included.
    pub fn finish_from_start(&self, start: NaiveDate) -> NaiveDate {
        self.calendar
            .add_working_days(start, self.duration_days.saturating_sub(1).max(0))
    }

    pub fn start_from_finish(&self, finish: NaiveDate) -> NaiveDate {
        self.calendar
            .add_working_days(finish, -self.duration_days.saturating_sub(1).max(0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub dependency_type: DependencyType,
    pub lag_days: i64,
}

/// Precedence graph over leaf tasks. Node indices follow snapshot order.
pub struct DependencyGraph<'a> {
    pub graph: DiGraph<TaskNode<'a>, Link>,
    pub id_to_index: HashMap<TaskId, NodeIndex>,
}

impl<'a> DependencyGraph<'a> {
    /// Build from already validated inputs. A dependency with an endpoint
    /// outside `nodes` touches a summary task and is skipped with a warning.
    pub fn build(
        nodes: Vec<TaskNode<'a>>,
        dependencies: &[Dependency],
    ) -> (Self, Vec<ScheduleWarning>) {
        let mut graph: DiGraph<TaskNode<'a>, Link> =
            DiGraph::with_capacity(nodes.len(), dependencies.len());
        let mut id_to_index: HashMap<TaskId, NodeIndex> = HashMap::with_capacity(nodes.len());
        let mut warnings = Vec::new();

        for node in nodes {
            let task_id = node.task_id;
            let node_ix = graph.add_node(node);
            id_to_index.insert(task_id, node_ix);
        }

        // Edges: pred -> succ
        for dependency in dependencies {
            match (
                id_to_index.get(&dependency.predecessor_id),
                id_to_index.get(&dependency.successor_id),
            ) {
                (Some(&u), Some(&v)) => {
                    graph.add_edge(
                        u,
                        v,
                        Link {
                            dependency_type: dependency.dependency_type,
                            lag_days: dependency.lag_days,
                        },
                    );
                }
                _ => {
                    warn!(
                        predecessor = dependency.predecessor_id,
                        successor = dependency.successor_id,
                        "ignoring dependency on a summary task"
                    );
                    warnings.push(ScheduleWarning::SummaryDependencyIgnored {
                        predecessor: dependency.predecessor_id,
                        successor: dependency.successor_id,
                    });
                }
            }
        }

        (Self { graph, id_to_index }, warnings)
    }

    pub fn node(&self, node_ix: NodeIndex) -> &TaskNode<'a> {
        &self.graph[node_ix]
    }

    pub fn index_of(&self, task_id: TaskId) -> Option<NodeIndex> {
        self.id_to_index.get(&task_id).copied()
    }

    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_terminal(&self, node_ix: NodeIndex) -> bool {
        self.graph
            .edges_directed(node_ix, Direction::Outgoing)
            .next()
            .is_none()
    }

    /// Kahn's algorithm. Among tasks that are ready at the same time the one
    /// earlier in the snapshot goes first, so the order is reproducible.
    pub fn topological_order(&self) -> Result<Vec<NodeIndex>, ScheduleError> {
        let mut in_degree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|ix| self.graph.edges_directed(ix, Direction::Incoming).count())
            .collect();
        let mut queue: VecDeque<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|ix| in_degree[ix.index()] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.graph.node_count());

        while let Some(node_ix) = queue.pop_front() {
            order.push(node_ix);
            let mut successors: Vec<NodeIndex> = self
                .graph
                .edges_directed(node_ix, Direction::Outgoing)
                .map(|edge| edge.target())
                .collect();
            successors.sort();
            for succ_ix in successors {
                in_degree[succ_ix.index()] -= 1;
                if in_degree[succ_ix.index()] == 0 {
                    queue.push_back(succ_ix);
                }
            }
        }

        if order.len() < self.graph.node_count() {
            let task_ids = self.cycle_members();
            warn!(?task_ids, "dependency cycle detected");
            return Err(ScheduleError::CircularDependency { task_ids });
        }
        Ok(order)
    }

    /// Ids of every task sitting on a cycle, ascending.
    pub fn cycle_members(&self) -> Vec<TaskId> {
        let mut members: Vec<TaskId> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|&ix| self.graph.contains_edge(ix, ix))
            })
            .flatten()
            .map(|ix| self.graph[ix].task_id)
            .collect();
        members.sort_unstable();
        members.dedup();
        members
    }
}
