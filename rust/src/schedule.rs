//! Partial and complete schedules, the states of the search tree.

use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::ops::Range;

use crate::graph::TaskGraph;
use crate::models::{Cost, NodeId, Task};

/// An as-early-as-possible assignment of some (or all) graph nodes to processors.
///
/// Schedules grow by copy-on-branch: a child is a [`Schedule::branch`] of its
/// parent plus one [`Schedule::schedule_task`] call. A schedule that has been
/// branched from is never mutated again, so siblings never observe each other.
///
/// Processors are only ever filled in index order, so the processors holding
/// tasks are always `0..processors_in_use`.
#[derive(Clone, Debug)]
pub struct Schedule {
    processor_count: usize,
    /// Tasks in insertion order.
    tasks: Vec<Task>,
    /// Scheduled node -> index into `tasks`.
    placements: FxHashMap<NodeId, usize>,
    /// End time of the last task on each processor (0 when idle).
    processor_ends: Vec<Cost>,
    processors_in_use: usize,
    last_task: Option<Task>,
}

impl Schedule {
    /// Create an empty schedule over `processor_count` identical processors.
    pub fn new(processor_count: usize) -> Self {
        Self {
            processor_count,
            tasks: Vec::new(),
            placements: FxHashMap::default(),
            processor_ends: vec![0; processor_count],
            processors_in_use: 0,
            last_task: None,
        }
    }

    /// Copy this schedule so the copy can be extended independently.
    ///
    /// Hot path during search: every successor starts as a branch.
    pub fn branch(&self) -> Self {
        let mut placements =
            FxHashMap::with_capacity_and_hasher(self.placements.len() + 1, Default::default());
        placements.extend(self.placements.iter().map(|(&node, &index)| (node, index)));

        let mut tasks = Vec::with_capacity(self.tasks.len() + 1);
        tasks.extend_from_slice(&self.tasks);

        Self {
            processor_count: self.processor_count,
            tasks,
            placements,
            processor_ends: self.processor_ends.clone(),
            processors_in_use: self.processors_in_use,
            last_task: self.last_task,
        }
    }

    /// Branch and append `node` on `processor` in one step.
    pub fn with_task(&self, graph: &TaskGraph, processor: usize, node: NodeId) -> Self {
        let mut child = self.branch();
        child.schedule_task(graph, processor, node);
        child
    }

    /// Append `node` on `processor` at its earliest feasible start time.
    ///
    /// Only call this on a fresh branch that no other search state refers to.
    pub fn schedule_task(&mut self, graph: &TaskGraph, processor: usize, node: NodeId) -> Task {
        debug_assert!(processor < self.processor_count);
        debug_assert!(!self.is_scheduled(node));

        let start = self.earliest_start(graph, processor, node);
        let task = Task::new(graph.node(node), processor, start);

        if processor >= self.processors_in_use {
            self.processors_in_use = (processor + 1).min(self.processor_count);
        }
        self.processor_ends[processor] = task.end();
        self.placements.insert(node, self.tasks.len());
        self.tasks.push(task);
        self.last_task = Some(task);

        task
    }

    /// Earliest time `node` could start on `processor` given what is already
    /// scheduled: after every scheduled parent's data arrives and after the
    /// processor's last task ends.
    pub fn earliest_start(&self, graph: &TaskGraph, processor: usize, node: NodeId) -> Cost {
        let data_ready = graph
            .incoming_links(node)
            .iter()
            .filter_map(|link| {
                let parent = self.task_for(link.origin)?;
                Some(parent.end() + link.delay_between(parent.processor(), processor))
            })
            .max()
            .unwrap_or(0);

        data_ready.max(self.processor_ends[processor])
    }

    /// Makespan if complete, partial completion time otherwise (0 when empty).
    pub fn end_time(&self) -> Cost {
        self.processor_ends.iter().copied().max().unwrap_or(0)
    }

    pub fn is_complete(&self, graph: &TaskGraph) -> bool {
        self.tasks.len() == graph.node_count()
    }

    /// Unscheduled and every parent already scheduled.
    pub fn is_ready(&self, graph: &TaskGraph, node: NodeId) -> bool {
        !self.is_scheduled(node)
            && graph
                .incoming_links(node)
                .iter()
                .all(|link| self.is_scheduled(link.origin))
    }

    #[inline]
    pub fn is_scheduled(&self, node: NodeId) -> bool {
        self.placements.contains_key(&node)
    }

    pub fn task_for(&self, node: NodeId) -> Option<&Task> {
        self.placements.get(&node).map(|&index| &self.tasks[index])
    }

    /// Tasks in the order they were scheduled.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn scheduled_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn processor_count(&self) -> usize {
        self.processor_count
    }

    /// End of the last task on `processor`, 0 if it is idle.
    pub fn processor_end(&self, processor: usize) -> Cost {
        self.processor_ends[processor]
    }

    /// Highest processor index holding a task, `None` while empty.
    pub fn highest_processor_used(&self) -> Option<usize> {
        self.processors_in_use.checked_sub(1)
    }

    /// Processors a new task may go to: every processor in use plus at most
    /// one idle processor. Idle processors are interchangeable, so offering
    /// more than one only duplicates states.
    pub fn candidate_processors(&self) -> Range<usize> {
        0..(self.processors_in_use + 1).min(self.processor_count)
    }

    pub fn last_task(&self) -> Option<&Task> {
        self.last_task.as_ref()
    }

    /// Sum of the costs of all scheduled nodes.
    pub fn scheduled_work(&self) -> u64 {
        self.tasks.iter().map(|task| task.duration() as u64).sum()
    }
}

/// A candidate successor ranked by its lower-bound estimate.
///
/// Ordering and equality look at the estimate only.
#[derive(Clone, Debug)]
pub struct CostEstimatedSchedule {
    schedule: Schedule,
    estimate: Cost,
}

impl CostEstimatedSchedule {
    pub fn new(schedule: Schedule, estimate: Cost) -> Self {
        Self { schedule, estimate }
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn estimate(&self) -> Cost {
        self.estimate
    }

    pub fn into_schedule(self) -> Schedule {
        self.schedule
    }
}

impl PartialEq for CostEstimatedSchedule {
    fn eq(&self, other: &Self) -> bool {
        self.estimate == other.estimate
    }
}

impl Eq for CostEstimatedSchedule {}

impl PartialOrd for CostEstimatedSchedule {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CostEstimatedSchedule {
    fn cmp(&self, other: &Self) -> Ordering {
        self.estimate.cmp(&other.estimate)
    }
}
