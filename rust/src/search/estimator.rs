//! Admissible lower bounds on the makespan reachable from a partial schedule.

use std::fmt;

use crate::config::EstimatorSelection;
use crate::graph::TaskGraph;
use crate::models::Cost;
use crate::schedule::Schedule;

/// A lower bound on the best makespan of any completion of a schedule.
///
/// Implementations must never exceed the true optimum reachable from the
/// schedule they are given; pruning is unsound otherwise.
pub trait CostEstimator: Send + Sync {
    fn name(&self) -> &'static str;

    fn estimate(&self, schedule: &Schedule, graph: &TaskGraph) -> Cost;
}

/// The schedule's current completion time.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartialMakespan;

impl CostEstimator for PartialMakespan {
    fn name(&self) -> &'static str {
        "partial_makespan"
    }

    fn estimate(&self, schedule: &Schedule, _graph: &TaskGraph) -> Cost {
        schedule.end_time()
    }
}

/// Longest remaining computation chain.
///
/// Scheduled tasks contribute `start + bottom level`. Ready nodes contribute
/// their earliest possible start over all processors (data arrival with
/// transfer costs, processor availability) plus their bottom level. Every
/// other unscheduled node sits below one of these, so its chain is covered.
#[derive(Debug, Clone, Copy, Default)]
pub struct CriticalPath;

impl CostEstimator for CriticalPath {
    fn name(&self) -> &'static str {
        "critical_path"
    }

    fn estimate(&self, schedule: &Schedule, graph: &TaskGraph) -> Cost {
        let scheduled = schedule
            .tasks()
            .iter()
            .map(|task| task.start() + graph.bottom_level(task.node()))
            .max()
            .unwrap_or(0);

        let ready = graph
            .nodes()
            .iter()
            .filter(|node| schedule.is_ready(graph, node.id))
            .map(|node| {
                // idle processors beyond the candidates behave like the first idle one
                let earliest = schedule
                    .candidate_processors()
                    .map(|processor| schedule.earliest_start(graph, processor, node.id))
                    .min()
                    .unwrap_or(0);
                earliest + graph.bottom_level(node.id)
            })
            .max()
            .unwrap_or(0);

        scheduled.max(ready)
    }
}

/// Work already committed on each processor plus all remaining work, divided
/// evenly over the processors and rounded up.
///
/// A schedule without processors estimates to 0. [`OptimalScheduler`] rejects
/// that configuration before searching; the case only arises when the
/// estimator is called directly.
///
/// [`OptimalScheduler`]: crate::search::OptimalScheduler
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadBalance;

impl CostEstimator for LoadBalance {
    fn name(&self) -> &'static str {
        "load_balance"
    }

    fn estimate(&self, schedule: &Schedule, graph: &TaskGraph) -> Cost {
        let processors = schedule.processor_count() as u64;
        if processors == 0 {
            return 0;
        }
        let committed: u64 = (0..schedule.processor_count())
            .map(|processor| schedule.processor_end(processor) as u64)
            .sum();
        let remaining = graph.total_work() as u64 - schedule.scheduled_work();

        (committed + remaining).div_ceil(processors) as Cost
    }
}

/// The registered estimators, combined by maximum.
///
/// A maximum of admissible bounds is itself admissible and at least as tight
/// as any member.
pub struct EstimatorSet {
    estimators: Vec<Box<dyn CostEstimator>>,
}

impl EstimatorSet {
    pub fn empty() -> Self {
        Self {
            estimators: Vec::new(),
        }
    }

    /// Build from a selection. An empty selection falls back to
    /// [`PartialMakespan`] so the set is never empty.
    pub fn from_selection(selection: &EstimatorSelection) -> Self {
        let mut set = Self::empty();
        if selection.partial_makespan || selection.is_empty() {
            set.register(Box::new(PartialMakespan));
        }
        if selection.critical_path {
            set.register(Box::new(CriticalPath));
        }
        if selection.load_balance {
            set.register(Box::new(LoadBalance));
        }
        set
    }

    pub fn register(&mut self, estimator: Box<dyn CostEstimator>) {
        self.estimators.push(estimator);
    }

    pub fn with(mut self, estimator: Box<dyn CostEstimator>) -> Self {
        self.register(estimator);
        self
    }

    /// Maximum over every registered estimator (0 when none are registered).
    pub fn estimate(&self, schedule: &Schedule, graph: &TaskGraph) -> Cost {
        self.estimators
            .iter()
            .map(|estimator| estimator.estimate(schedule, graph))
            .max()
            .unwrap_or(0)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.estimators.iter().map(|e| e.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.estimators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.estimators.is_empty()
    }
}

impl Default for EstimatorSet {
    fn default() -> Self {
        Self::from_selection(&EstimatorSelection::all())
    }
}

impl fmt::Debug for EstimatorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
