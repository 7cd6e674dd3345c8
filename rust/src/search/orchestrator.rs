//! Sequential branch-and-bound depth-first search.

use std::time::Instant;

use crate::graph::TaskGraph;
use crate::schedule::{CostEstimatedSchedule, Schedule};
use crate::{log_changes, log_debug};

use super::bound::SearchMonitor;
use super::estimator::EstimatorSet;
use super::generator::ScheduleGenerator;

/// Depth-first branch and bound over the implicit schedule tree.
///
/// With a fanout threshold set, the search stops descending once few enough
/// nodes remain and collects the surviving successors as a frontier for the
/// parallel units. Without one it runs every subtree to its leaves.
pub struct DfsSearch<'a> {
    graph: &'a TaskGraph,
    estimators: &'a EstimatorSet,
    monitor: &'a SearchMonitor,
    generator: ScheduleGenerator,
    fanout_threshold: Option<usize>,
    deadline: Option<Instant>,
    verbosity: u8,
    frontier: Vec<CostEstimatedSchedule>,
    expanded: u64,
    pruned: u64,
}

impl<'a> DfsSearch<'a> {
    pub fn new(
        graph: &'a TaskGraph,
        estimators: &'a EstimatorSet,
        monitor: &'a SearchMonitor,
    ) -> Self {
        Self {
            graph,
            estimators,
            monitor,
            generator: ScheduleGenerator,
            fanout_threshold: None,
            deadline: None,
            verbosity: 0,
            frontier: Vec::new(),
            expanded: 0,
            pruned: 0,
        }
    }

    /// Cut the search and collect a frontier once at most `threshold` nodes
    /// remain unscheduled.
    pub fn with_fanout(mut self, threshold: usize) -> Self {
        self.fanout_threshold = Some(threshold);
        self
    }

    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Best complete schedule found below `schedule`, if any survives pruning.
    ///
    /// Leaves update the shared bound. Successors whose estimate is not
    /// strictly below the bound are discarded, so an alternate schedule that
    /// only ties the best known cost is never returned.
    pub fn search(&mut self, schedule: &Schedule) -> Option<Schedule> {
        let mut best = None;
        self.descend(schedule, &mut best);
        best
    }

    /// Leaves are copied into `best` only when they beat it.
    fn descend(&mut self, schedule: &Schedule, best: &mut Option<Schedule>) {
        if self.expired() {
            return;
        }
        self.expanded += 1;

        let successors = self.generator.generate(schedule, self.graph);
        if successors.is_empty() {
            let cost = schedule.end_time();
            if self.monitor.bound().improve(schedule) {
                log_changes!(self.verbosity, "New best makespan: {}", cost);
            }
            if best.as_ref().map_or(true, |current| cost < current.end_time()) {
                *best = Some(schedule.clone());
            }
            return;
        }

        let generated = successors.len();
        let bound = self.monitor.bound().current();
        let mut ranked: Vec<CostEstimatedSchedule> = successors
            .into_iter()
            .filter_map(|successor| {
                let estimate = self.estimators.estimate(&successor, self.graph);
                (estimate < bound).then(|| CostEstimatedSchedule::new(successor, estimate))
            })
            .collect();
        self.pruned += (generated - ranked.len()) as u64;

        log_debug!(
            self.verbosity,
            "Depth {}: {} of {} successors below bound {}",
            schedule.scheduled_count(),
            ranked.len(),
            generated,
            bound
        );

        if ranked.is_empty() {
            return;
        }

        // stable: equal estimates keep generation order
        ranked.sort();

        let remaining = self.graph.node_count() - schedule.scheduled_count();
        if let Some(threshold) = self.fanout_threshold {
            if remaining <= threshold {
                self.frontier.extend(ranked);
                return;
            }
        }

        for candidate in ranked {
            // the bound may have dropped while earlier siblings were searched
            if candidate.estimate() >= self.monitor.bound().current() {
                self.pruned += 1;
                continue;
            }
            self.descend(candidate.schedule(), best);
        }
    }

    /// Frontier schedules collected so far, in the order they were cut.
    pub fn frontier(&self) -> &[CostEstimatedSchedule] {
        &self.frontier
    }

    /// Flush work counters into the monitor and hand over the frontier.
    pub fn finish(self) -> Vec<CostEstimatedSchedule> {
        self.monitor.record_work(self.expanded, self.pruned);
        self.frontier
    }

    pub fn expanded(&self) -> u64 {
        self.expanded
    }

    pub fn pruned(&self) -> u64 {
        self.pruned
    }

    fn expired(&self) -> bool {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.monitor.mark_timed_out();
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EstimatorSelection;
    use crate::models::{Cost, NodeId};
    use std::collections::BTreeSet;

    fn diamond() -> TaskGraph {
        TaskGraph::builder()
            .add_node("a", 2)
            .add_node("b", 2)
            .add_node("c", 2)
            .add_node("d", 2)
            .add_link("a", "b", 1)
            .add_link("a", "c", 1)
            .add_link("b", "d", 1)
            .add_link("c", "d", 1)
            .build()
            .unwrap()
    }

    fn wide() -> TaskGraph {
        TaskGraph::builder()
            .add_node("a", 3)
            .add_node("b", 2)
            .add_node("c", 4)
            .add_node("d", 1)
            .add_node("e", 2)
            .add_link("a", "c", 2)
            .add_link("b", "c", 1)
            .add_link("b", "d", 3)
            .add_link("c", "e", 1)
            .add_link("d", "e", 2)
            .build()
            .unwrap()
    }

    type LeafKey = Vec<(NodeId, usize, Cost)>;

    fn leaf_key(schedule: &Schedule) -> LeafKey {
        schedule
            .tasks()
            .iter()
            .map(|t| (t.node(), t.processor(), t.start()))
            .collect()
    }

    /// Every leaf below `schedule`, without any pruning.
    fn enumerate_leaves(graph: &TaskGraph, schedule: &Schedule, out: &mut Vec<LeafKey>) {
        let children = ScheduleGenerator.generate(schedule, graph);
        if children.is_empty() {
            out.push(leaf_key(schedule));
            return;
        }
        for child in &children {
            enumerate_leaves(graph, child, out);
        }
    }

    #[test]
    fn test_full_search_finds_diamond_optimum() {
        let graph = diamond();
        let estimators = EstimatorSet::default();
        let monitor = SearchMonitor::new();

        let mut search = DfsSearch::new(&graph, &estimators, &monitor);
        let best = search.search(&Schedule::new(2)).unwrap();

        assert_eq!(best.end_time(), 7);
        assert!(best.is_complete(&graph));
        assert_eq!(monitor.bound().current(), 7);
        assert!(search.finish().is_empty());
        assert!(monitor.snapshot().expanded > 0);
    }

    #[test]
    fn test_fanout_collects_instead_of_descending() {
        let graph = diamond();
        let estimators = EstimatorSet::default();
        let monitor = SearchMonitor::new();

        let mut search = DfsSearch::new(&graph, &estimators, &monitor).with_fanout(10);
        assert!(search.search(&Schedule::new(2)).is_none());

        // only "a" is ready on the single offered processor
        let frontier = search.finish();
        assert_eq!(frontier.len(), 1);
        assert_eq!(frontier[0].schedule().scheduled_count(), 1);
        assert_eq!(monitor.bound().current(), Cost::MAX);
    }

    #[test]
    fn test_frontier_is_sorted_per_parent() {
        let graph = wide();
        let estimators = EstimatorSet::default();
        let monitor = SearchMonitor::new();

        let mut search = DfsSearch::new(&graph, &estimators, &monitor).with_fanout(10);
        search.search(&Schedule::new(2));
        let estimates: Vec<Cost> = search.frontier().iter().map(|c| c.estimate()).collect();

        let mut sorted = estimates.clone();
        sorted.sort();
        assert_eq!(estimates, sorted);
    }

    #[test]
    fn test_frontier_partitions_all_leaves() {
        let graph = wide();
        let estimators = EstimatorSet::default();
        let monitor = SearchMonitor::new();
        let root = Schedule::new(3);

        // cut two levels down: remaining 5 > 3, remaining 4 > 3, remaining 3 cuts
        let mut search = DfsSearch::new(&graph, &estimators, &monitor).with_fanout(3);
        search.search(&root);
        let frontier = search.finish();
        assert!(frontier.iter().all(|c| c.schedule().scheduled_count() == 3));

        let mut from_root = Vec::new();
        enumerate_leaves(&graph, &root, &mut from_root);

        let mut from_frontier = Vec::new();
        for cut in &frontier {
            enumerate_leaves(&graph, cut.schedule(), &mut from_frontier);
        }

        // no leaf twice, none omitted
        assert_eq!(from_frontier.len(), from_root.len());
        let root_set: BTreeSet<LeafKey> = from_root.into_iter().collect();
        let frontier_set: BTreeSet<LeafKey> = from_frontier.iter().cloned().collect();
        assert_eq!(frontier_set.len(), from_frontier.len());
        assert_eq!(frontier_set, root_set);
    }

    #[test]
    fn test_bound_prunes_everything_when_already_optimal() {
        let graph = diamond();
        let estimators = EstimatorSet::default();
        let monitor = SearchMonitor::new();

        let mut optimal = Schedule::new(2);
        for (processor, name) in [(0, "a"), (0, "b"), (1, "c"), (1, "d")] {
            optimal.schedule_task(&graph, processor, graph.node_id(name).unwrap());
        }
        monitor.bound().improve(&optimal);

        let mut search = DfsSearch::new(&graph, &estimators, &monitor);
        assert!(search.search(&Schedule::new(2)).is_none());
        assert!(search.pruned() > 0);
    }

    #[test]
    fn test_single_estimator_reaches_same_optimum() {
        let graph = wide();
        let monitor_all = SearchMonitor::new();
        let all = EstimatorSet::default();
        let best_all = DfsSearch::new(&graph, &all, &monitor_all)
            .search(&Schedule::new(2))
            .unwrap();

        let monitor_one = SearchMonitor::new();
        let one = EstimatorSet::from_selection(&EstimatorSelection {
            partial_makespan: true,
            ..EstimatorSelection::none()
        });
        let mut search_one = DfsSearch::new(&graph, &one, &monitor_one);
        let best_one = search_one.search(&Schedule::new(2)).unwrap();

        assert_eq!(best_all.end_time(), best_one.end_time());
    }

    #[test]
    fn test_leaf_kept_only_when_it_beats_subtree_best() {
        let graph = TaskGraph::builder()
            .add_node("a", 2)
            .add_node("b", 3)
            .build()
            .unwrap();
        let estimators = EstimatorSet::default();
        let monitor = SearchMonitor::new();

        let mut done = Schedule::new(2);
        done.schedule_task(&graph, 0, graph.node_id("a").unwrap());
        done.schedule_task(&graph, 1, graph.node_id("b").unwrap());
        assert_eq!(done.end_time(), 3);

        let mut search = DfsSearch::new(&graph, &estimators, &monitor);
        let mut best = None;
        search.descend(&done, &mut best);
        assert_eq!(best.as_ref().map(|s| s.end_time()), Some(3));

        // a worse leaf leaves the kept schedule untouched
        let mut serial = Schedule::new(2);
        serial.schedule_task(&graph, 0, graph.node_id("a").unwrap());
        serial.schedule_task(&graph, 0, graph.node_id("b").unwrap());
        search.descend(&serial, &mut best);
        let kept = best.unwrap();
        assert_eq!(kept.end_time(), 3);
        assert_eq!(leaf_key(&kept), leaf_key(&done));
        assert_eq!(monitor.bound().current(), 3);
    }

    #[test]
    fn test_expired_deadline_stops_immediately() {
        let graph = diamond();
        let estimators = EstimatorSet::default();
        let monitor = SearchMonitor::new();

        let mut search = DfsSearch::new(&graph, &estimators, &monitor)
            .with_deadline(Some(Instant::now()));
        assert!(search.search(&Schedule::new(2)).is_none());
        assert!(monitor.timed_out());
        assert_eq!(search.expanded(), 0);
    }
}
