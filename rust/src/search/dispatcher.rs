//! Parallel sub-searches over the frontier.

use rayon::prelude::*;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use crate::graph::TaskGraph;
use crate::schedule::{CostEstimatedSchedule, Schedule};
use crate::{log_checks, log_debug};

use super::bound::SearchMonitor;
use super::estimator::EstimatorSet;
use super::orchestrator::DfsSearch;
use super::{SearchError, WorkerFailure};

/// Runs one independent sub-search per frontier schedule on a bounded pool.
pub struct Dispatcher<'a> {
    graph: &'a TaskGraph,
    estimators: &'a EstimatorSet,
    monitor: &'a SearchMonitor,
    parallelism: Option<usize>,
    deadline: Option<Instant>,
    verbosity: u8,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        graph: &'a TaskGraph,
        estimators: &'a EstimatorSet,
        monitor: &'a SearchMonitor,
    ) -> Self {
        Self {
            graph,
            estimators,
            monitor,
            parallelism: None,
            deadline: None,
            verbosity: 0,
        }
    }

    pub fn with_parallelism(mut self, parallelism: Option<usize>) -> Self {
        self.parallelism = parallelism;
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

    /// Search every frontier schedule to completion and return the cheapest
    /// complete schedule any unit found.
    ///
    /// Blocks until every unit has finished. If any unit fails, the whole
    /// dispatch fails and names the failed units; a partial answer could
    /// miss the optimum.
    pub fn dispatch(
        &self,
        frontier: &[CostEstimatedSchedule],
    ) -> Result<Option<Schedule>, SearchError> {
        if frontier.is_empty() {
            return Ok(None);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.parallelism.unwrap_or(0))
            .thread_name(|index| format!("optsched-unit-{}", index))
            .build()
            .map_err(|e| SearchError::ThreadPool(e.to_string()))?;

        log_checks!(
            self.verbosity,
            "Dispatching {} units on {} threads",
            frontier.len(),
            pool.current_num_threads()
        );

        let outcomes: Vec<Result<Option<Schedule>, WorkerFailure>> = pool.install(|| {
            frontier
                .par_iter()
                .enumerate()
                .map(|(unit, root)| self.run_unit(unit, root))
                .collect()
        });

        let mut failed = Vec::new();
        let mut best: Option<Schedule> = None;
        for outcome in outcomes {
            match outcome {
                Ok(Some(found)) => {
                    if best
                        .as_ref()
                        .map_or(true, |current| found.end_time() < current.end_time())
                    {
                        best = Some(found);
                    }
                }
                Ok(None) => {}
                Err(failure) => failed.push(failure),
            }
        }

        if !failed.is_empty() {
            return Err(SearchError::WorkerFailed { failed });
        }

        Ok(best)
    }

    fn run_unit(
        &self,
        unit: usize,
        root: &CostEstimatedSchedule,
    ) -> Result<Option<Schedule>, WorkerFailure> {
        self.monitor.unit_started();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            // no longer competitive: another unit already found something at least as good
            if root.estimate() >= self.monitor.bound().current() {
                log_debug!(
                    self.verbosity,
                    "Unit {} skipped (estimate {})",
                    unit,
                    root.estimate()
                );
                return None;
            }

            let mut search = DfsSearch::new(self.graph, self.estimators, self.monitor)
                .with_deadline(self.deadline)
                .with_verbosity(self.verbosity);
            let found = search.search(root.schedule());
            search.finish();
            found
        }));

        self.monitor.unit_finished();

        outcome.map_err(|payload| WorkerFailure {
            unit,
            message: panic_message(payload.as_ref()),
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
