//! Greedy list scheduling, used as the initial upper bound.

use crate::graph::TaskGraph;
use crate::schedule::Schedule;

use super::generator::ScheduleGenerator;

/// Build a complete schedule greedily.
///
/// Repeatedly takes the ready node with the largest bottom level (lowest ID on
/// ties) and places it on the candidate processor where it can start
/// earliest (lowest index on ties). Uses the same candidate processors as the
/// search, so the result is a leaf of the search tree.
pub fn list_schedule(graph: &TaskGraph, processor_count: usize) -> Schedule {
    let generator = ScheduleGenerator;
    let mut schedule = Schedule::new(processor_count);

    while !schedule.is_complete(graph) {
        let ready = generator.ready_nodes(&schedule, graph);
        let Some(node) = ready
            .into_iter()
            .max_by(|&a, &b| {
                graph
                    .bottom_level(a)
                    .cmp(&graph.bottom_level(b))
                    .then(b.cmp(&a))
            })
        else {
            break;
        };

        let Some(processor) = schedule
            .candidate_processors()
            .min_by_key(|&processor| (schedule.earliest_start(graph, processor, node), processor))
        else {
            break;
        };

        schedule.schedule_task(graph, processor, node);
    }

    schedule
}
