//! Branch-and-bound search for a minimum-makespan schedule.
//!
//! A sequential depth-first phase expands the tree from the empty schedule
//! until few nodes remain, collecting the surviving partial schedules as a
//! frontier. Each frontier schedule then becomes an independent unit searched
//! to completion on a thread pool, all units pruning against one shared bound.

mod bound;
mod dispatcher;
mod estimator;
mod generator;
mod greedy;
mod orchestrator;

use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

use crate::config::SearchConfig;
use crate::graph::TaskGraph;
use crate::logging::level_name;
use crate::models::Cost;
use crate::schedule::Schedule;
use crate::{log_changes, log_checks};

pub use bound::{SearchMonitor, SearchSnapshot, SharedBound};
pub use dispatcher::Dispatcher;
pub use estimator::{CostEstimator, CriticalPath, EstimatorSet, LoadBalance, PartialMakespan};
pub use generator::ScheduleGenerator;
pub use greedy::list_schedule;
pub use orchestrator::DfsSearch;

/// A parallel unit that did not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerFailure {
    /// Index of the unit's schedule in the frontier.
    pub unit: usize,
    pub message: String,
}

impl fmt::Display for WorkerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit {}: {}", self.unit, self.message)
    }
}

/// Errors that can occur during an optimal-schedule search.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Processor count must be positive, got {0}")]
    InvalidProcessorCount(usize),
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),
    #[error("{} search unit(s) failed: {}", failed.len(), join_failures(failed))]
    WorkerFailed { failed: Vec<WorkerFailure> },
}

fn join_failures(failed: &[WorkerFailure]) -> String {
    failed
        .iter()
        .map(|failure| failure.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Outcome of [`OptimalScheduler::run`].
#[derive(Clone, Debug)]
pub struct SearchResult {
    pub schedule: Schedule,
    pub cost: Cost,
    /// False only when the time limit expired before the search finished.
    pub optimal: bool,
    pub frontier_size: usize,
    pub expanded: u64,
    pub pruned: u64,
}

/// Finds a minimum-makespan schedule for a task graph.
pub struct OptimalScheduler {
    config: SearchConfig,
    estimators: EstimatorSet,
    monitor: Arc<SearchMonitor>,
}

impl OptimalScheduler {
    /// Create a scheduler using the estimators selected in `config`.
    pub fn new(config: SearchConfig) -> Self {
        let estimators = EstimatorSet::from_selection(&config.estimators);
        Self::with_estimators(config, estimators)
    }

    /// Create a scheduler with an explicit estimator set.
    pub fn with_estimators(config: SearchConfig, estimators: EstimatorSet) -> Self {
        Self {
            config,
            estimators,
            monitor: Arc::new(SearchMonitor::new()),
        }
    }

    /// Live view of the search; may be read from another thread during [`run`](Self::run).
    pub fn monitor(&self) -> Arc<SearchMonitor> {
        Arc::clone(&self.monitor)
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Run the full search.
    ///
    /// # Returns
    /// * `Ok(SearchResult)` with the best schedule found
    /// * `Err(SearchError::WorkerFailed)` if any parallel unit failed
    pub fn run(&self, graph: &TaskGraph) -> Result<SearchResult, SearchError> {
        let processor_count = self.config.processor_count;
        if processor_count == 0 {
            return Err(SearchError::InvalidProcessorCount(processor_count));
        }

        let verbosity = self.config.verbosity;
        let monitor = self.monitor.as_ref();
        monitor.reset();
        let deadline = self.config.time_limit.map(|limit| Instant::now() + limit);

        log_changes!(
            verbosity,
            "Scheduling {} nodes on {} processors (estimators {:?}, logging {})",
            graph.node_count(),
            processor_count,
            self.estimators.names(),
            level_name(verbosity)
        );

        if self.config.seed_with_list_schedule {
            let seed = list_schedule(graph, processor_count);
            monitor.bound().improve(&seed);
            log_changes!(verbosity, "Initial bound from list schedule: {}", seed.end_time());
        }

        // Sequential phase: expand until the fanout threshold, collecting the frontier.
        let mut sequential = DfsSearch::new(graph, &self.estimators, monitor)
            .with_fanout(self.config.fanout_threshold)
            .with_deadline(deadline)
            .with_verbosity(verbosity);
        let sequential_best = sequential.search(&Schedule::new(processor_count));
        let frontier = sequential.finish();
        monitor.set_frontier_size(frontier.len());
        log_checks!(verbosity, "Sequential phase produced {} frontier schedules", frontier.len());

        // Parallel phase: one unit per frontier schedule.
        let parallel_best = Dispatcher::new(graph, &self.estimators, monitor)
            .with_parallelism(self.config.parallelism)
            .with_deadline(deadline)
            .with_verbosity(verbosity)
            .dispatch(&frontier)?;

        let seeded = monitor.bound().best().map(|(_, schedule)| schedule);
        let best = [sequential_best, parallel_best, seeded]
            .into_iter()
            .flatten()
            .min_by_key(|schedule| schedule.end_time());

        let timed_out = monitor.timed_out();
        // only reachable after a timeout with no seed: fall back to the greedy answer
        let schedule = best.unwrap_or_else(|| list_schedule(graph, processor_count));
        let cost = schedule.end_time();
        let snapshot = monitor.snapshot();

        log_changes!(
            verbosity,
            "Search finished: makespan {}{} ({} expanded, {} pruned)",
            cost,
            if timed_out { " (time limit reached)" } else { "" },
            snapshot.expanded,
            snapshot.pruned
        );

        Ok(SearchResult {
            schedule,
            cost,
            optimal: !timed_out,
            frontier_size: frontier.len(),
            expanded: snapshot.expanded,
            pruned: snapshot.pruned,
        })
    }
}

/// Compute a minimum-makespan schedule of `graph` on `processor_count`
/// identical processors with the default configuration.
pub fn compute_optimal_schedule(
    graph: &TaskGraph,
    processor_count: usize,
) -> Result<Schedule, SearchError> {
    OptimalScheduler::new(SearchConfig::new(processor_count))
        .run(graph)
        .map(|result| result.schedule)
}
