//! Configuration types for the optimal scheduler.

use std::time::Duration;

/// Remaining-node count at or below which the sequential search stops
/// descending and hands successors to the parallel units.
pub const DEFAULT_FANOUT_THRESHOLD: usize = 10;

/// Which lower-bound estimators are registered for a search.
///
/// Every variant is admissible; disabling some only affects search time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EstimatorSelection {
    /// Current partial makespan.
    pub partial_makespan: bool,
    /// Critical-path remaining work, accounting for transfer costs.
    pub critical_path: bool,
    /// Total committed plus remaining work spread over all processors.
    pub load_balance: bool,
}

impl EstimatorSelection {
    pub fn all() -> Self {
        Self {
            partial_makespan: true,
            critical_path: true,
            load_balance: true,
        }
    }

    pub fn none() -> Self {
        Self {
            partial_makespan: false,
            critical_path: false,
            load_balance: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.partial_makespan || self.critical_path || self.load_balance)
    }
}

impl Default for EstimatorSelection {
    fn default() -> Self {
        Self::all()
    }
}

/// Configuration for one optimal-schedule search.
#[derive(Clone, Debug)]
pub struct SearchConfig {
    /// Number of identical processors.
    pub processor_count: usize,
    /// See [`DEFAULT_FANOUT_THRESHOLD`].
    pub fanout_threshold: usize,
    /// Worker threads for the parallel phase (None = hardware concurrency).
    pub parallelism: Option<usize>,
    /// Stop searching after this long and return the best schedule found so far.
    pub time_limit: Option<Duration>,
    /// Install a greedy list schedule as the initial upper bound.
    pub seed_with_list_schedule: bool,
    /// Registered lower-bound estimators.
    pub estimators: EstimatorSelection,
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    pub verbosity: u8,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            processor_count: 1,
            fanout_threshold: DEFAULT_FANOUT_THRESHOLD,
            parallelism: None,
            time_limit: None,
            seed_with_list_schedule: true,
            estimators: EstimatorSelection::all(),
            verbosity: 0,
        }
    }
}

impl SearchConfig {
    pub fn new(processor_count: usize) -> Self {
        Self {
            processor_count,
            ..Self::default()
        }
    }

    pub fn with_fanout_threshold(mut self, fanout_threshold: usize) -> Self {
        self.fanout_threshold = fanout_threshold;
        self
    }

    pub fn with_parallelism(mut self, threads: usize) -> Self {
        self.parallelism = Some(threads);
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_seed(mut self, seed_with_list_schedule: bool) -> Self {
        self.seed_with_list_schedule = seed_with_list_schedule;
        self
    }

    pub fn with_estimators(mut self, estimators: EstimatorSelection) -> Self {
        self.estimators = estimators;
        self
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }
}
