//! Successor generation with idle-processor symmetry reduction.

use crate::graph::TaskGraph;
use crate::models::NodeId;
use crate::schedule::Schedule;

/// Produces the children of a search-tree node.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleGenerator;

impl ScheduleGenerator {
    /// One child per (ready node, candidate processor) pair, ready nodes in ID
    /// order and processors ascending. Empty iff `schedule` is complete.
    pub fn generate(&self, schedule: &Schedule, graph: &TaskGraph) -> Vec<Schedule> {
        let ready = self.ready_nodes(schedule, graph);
        let processors = schedule.candidate_processors();

        let mut children = Vec::with_capacity(ready.len() * processors.len());
        for node in ready {
            for processor in processors.clone() {
                children.push(schedule.with_task(graph, processor, node));
            }
        }
        children
    }

    /// Unscheduled nodes whose parents are all scheduled.
    pub fn ready_nodes(&self, schedule: &Schedule, graph: &TaskGraph) -> Vec<NodeId> {
        graph
            .nodes()
            .iter()
            .map(|node| node.id)
            .filter(|&id| schedule.is_ready(graph, id))
            .collect()
    }
}
