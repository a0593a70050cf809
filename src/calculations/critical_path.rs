use crate::calculations::backward_pass::LateDates;
use crate::calculations::forward_pass::ForwardPassResult;
use crate::graph::DependencyGraph;
use crate::schedule::ScheduleWarning;
use crate::task::TaskId;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet};
use tracing::warn;

#[derive(Debug, Clone, Default)]
pub struct CriticalPathAnalysis {
    pub total_float: HashMap<NodeIndex, i64>,
    pub critical: HashSet<NodeIndex>,
    /// `(predecessor, successor)` pairs, in edge insertion order.
    pub critical_dependencies: Vec<(TaskId, TaskId)>,
    pub paths: Vec<Vec<TaskId>>,
    pub warnings: Vec<ScheduleWarning>,
}

pub struct CriticalPathIdentifier<'g, 'a> {
    dag: &'g DependencyGraph<'a>,
}

impl<'g, 'a> CriticalPathIdentifier<'g, 'a> {
    pub fn new(dag: &'g DependencyGraph<'a>) -> Self {
        Self { dag }
    }

    pub fn analyze(
        &self,
        order: &[NodeIndex],
        early: &ForwardPassResult,
        late: &HashMap<NodeIndex, LateDates>,
    ) -> CriticalPathAnalysis {
        let mut analysis = CriticalPathAnalysis::default();

        for &node_ix in order {
            let (Some(e), Some(l)) = (early.dates.get(&node_ix), late.get(&node_ix)) else {
                continue;
            };
            let node = self.dag.node(node_ix);
            let float = node.calendar.working_days_between(e.start, l.start);
            if float < 0 {
                warn!(task_id = node.task_id, float, "negative float");
                analysis.warnings.push(ScheduleWarning::InfeasibleConstraint {
                    task_id: node.task_id,
                    total_float: float,
                });
            }
            if float <= 0 {
                analysis.critical.insert(node_ix);
            }
            analysis.total_float.insert(node_ix, float);
        }

        // Driving links between two critical tasks form the path edges.
        let mut adjacency: HashMap<NodeIndex, Vec<NodeIndex>> = HashMap::new();
        for edge in self.dag.graph.edge_references() {
            let (u, v) = (edge.source(), edge.target());
            if early.driving.contains(&edge.id())
                && analysis.critical.contains(&u)
                && analysis.critical.contains(&v)
            {
                analysis
                    .critical_dependencies
                    .push((self.dag.node(u).task_id, self.dag.node(v).task_id));
                adjacency.entry(u).or_default().push(v);
                adjacency.entry(v).or_default().push(u);
            }
        }

        let rank: HashMap<NodeIndex, usize> =
            order.iter().enumerate().map(|(idx, &ix)| (ix, idx)).collect();
        let mut seen: HashSet<NodeIndex> = HashSet::new();
        let mut components: Vec<Vec<NodeIndex>> = Vec::new();
        for &node_ix in order {
            if !analysis.critical.contains(&node_ix) || !seen.insert(node_ix) {
                continue;
            }
            let mut component = vec![node_ix];
            let mut stack = vec![node_ix];
            while let Some(current) = stack.pop() {
                for &next in adjacency.get(&current).map(Vec::as_slice).unwrap_or(&[]) {
                    if seen.insert(next) {
                        component.push(next);
                        stack.push(next);
                    }
                }
            }
            component.sort_by_key(|ix| rank.get(ix).copied().unwrap_or(usize::MAX));
            components.push(component);
        }

        // Components arrive ordered by their first task's position; a stable
        // sort by earliest start keeps that as the tie-break.
        components.sort_by_key(|component| early.dates.get(&component[0]).map(|d| d.start));
        analysis.paths = components
            .into_iter()
            .map(|component| {
                component
                    .into_iter()
                    .map(|ix| self.dag.node(ix).task_id)
                    .collect()
            })
            .collect();

        analysis
    }
}
