use crate::dependency::Anchor;
use crate::graph::DependencyGraph;
use crate::task::TaskConstraint;
use chrono::NaiveDate;
use petgraph::Direction;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EarlyDates {
    pub start: NaiveDate,
    pub finish: NaiveDate,
}

#[derive(Debug, Clone, Default)]
pub struct ForwardPassResult {
    pub dates: HashMap<NodeIndex, EarlyDates>,
    /// Incoming edges whose candidate equals the successor's earliest start.
    pub driving: HashSet<EdgeIndex>,
}

pub struct ForwardPass<'g, 'a> {
    dag: &'g DependencyGraph<'a>,
}

impl<'g, 'a> ForwardPass<'g, 'a> {
    pub fn new(dag: &'g DependencyGraph<'a>) -> Self {
        Self { dag }
    }

    /// `order` must be a topological order of the graph.
    pub fn execute(&self, order: &[NodeIndex], project_start: NaiveDate) -> ForwardPassResult {
        let mut result = ForwardPassResult {
            dates: HashMap::with_capacity(order.len()),
            driving: HashSet::new(),
        };

        for &node_ix in order {
            let node = self.dag.node(node_ix);
            let calendar = node.calendar;
            let mut start = calendar.align_forward(project_start);
            let mut candidates = Vec::new();

            for edge in self.dag.graph.edges_directed(node_ix, Direction::Incoming) {
                let Some(pred_dates) = result.dates.get(&edge.source()) else {
                    continue;
                };
                let pred = self.dag.node(edge.source());
                let link = edge.weight();
                let (pred_anchor, succ_anchor) = link.dependency_type.anchors();
                let from = match pred_anchor {
                    Anchor::Start => pred_dates.start,
                    Anchor::Finish => pred_dates.finish,
                };
                let offset = link
                    .dependency_type
                    .offset(link.lag_days, pred.is_zero_duration());
                let anchored = calendar.align_forward(calendar.add_working_days(from, offset));
                let candidate = match succ_anchor {
                    Anchor::Start => anchored,
                    Anchor::Finish => node.start_from_finish(anchored),
                };
                candidates.push((edge.id(), candidate));
                start = start.max(candidate);
            }

            match node.constraint {
                Some(TaskConstraint::StartNoEarlierThan(date)) => {
                    start = start.max(calendar.align_forward(date));
                }
                Some(TaskConstraint::FinishNoEarlierThan(date)) => {
                    start = start.max(node.start_from_finish(calendar.align_forward(date)));
                }
                Some(TaskConstraint::MustStartOn(date)) => {
                    start = calendar.align_forward(date);
                }
                Some(TaskConstraint::MustFinishOn(date)) => {
                    start = node.start_from_finish(calendar.align_forward(date));
                }
                None => {}
            }

            for (edge_ix, candidate) in candidates {
                if candidate == start {
                    result.driving.insert(edge_ix);
                }
            }

            let finish = node.finish_from_start(start);
            trace!(task_id = node.task_id, %start, %finish, "early dates");
            result.dates.insert(node_ix, EarlyDates { start, finish });
        }

        result
    }
}
