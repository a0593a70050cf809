use crate::dependency::Anchor;
use crate::graph::DependencyGraph;
use crate::task::TaskConstraint;
use chrono::NaiveDate;
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LateDates {
    pub start: NaiveDate,
    pub finish: NaiveDate,
}

pub struct BackwardPass<'g, 'a> {
    dag: &'g DependencyGraph<'a>,
}

impl<'g, 'a> BackwardPass<'g, 'a> {
    pub fn new(dag: &'g DependencyGraph<'a>) -> Self {
        Self { dag }
    }

    /// Walks `order` (a topological order) in reverse. Every late finish is
    /// capped by `project_end`, successors tighten it further.
    pub fn execute(
        &self,
        order: &[NodeIndex],
        project_end: NaiveDate,
    ) -> HashMap<NodeIndex, LateDates> {
        let mut late: HashMap<NodeIndex, LateDates> = HashMap::with_capacity(order.len());

        for &node_ix in order.iter().rev() {
            let node = self.dag.node(node_ix);
            let calendar = node.calendar;
            let mut finish = calendar.align_backward(project_end);

            for edge in self.dag.graph.edges_directed(node_ix, Direction::Outgoing) {
                let Some(succ_late) = late.get(&edge.target()) else {
                    continue;
                };
                let link = edge.weight();
                let (pred_anchor, succ_anchor) = link.dependency_type.anchors();
                let from = match succ_anchor {
                    Anchor::Start => succ_late.start,
                    Anchor::Finish => succ_late.finish,
                };
                let offset = link
                    .dependency_type
                    .offset(link.lag_days, node.is_zero_duration());
                let anchored =
                    calendar.align_backward(calendar.add_working_days(from, offset.saturating_neg()));
                let candidate = match pred_anchor {
                    Anchor::Finish => anchored,
                    Anchor::Start => node.finish_from_start(anchored),
                };
                finish = finish.min(candidate);
            }

            match node.constraint {
                Some(TaskConstraint::MustStartOn(date)) => {
                    finish = finish.min(node.finish_from_start(calendar.align_forward(date)));
                }
                Some(TaskConstraint::MustFinishOn(date)) => {
                    finish = finish.min(calendar.align_forward(date));
                }
                _ => {}
            }

            let start = node.start_from_finish(finish);
            trace!(task_id = node.task_id, %start, %finish, "late dates");
            late.insert(node_ix, LateDates { start, finish });
        }

        late
    }
}
