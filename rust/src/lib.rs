//! Optimal scheduling of precedence-constrained tasks on identical processors.
//!
//! Given a weighted task DAG where moving data between processors costs a
//! transfer delay, finds a schedule of minimum makespan by branch and bound:
//! a sequential depth-first phase cuts the search tree into independent
//! subtrees which are then searched in parallel against one shared bound.
//!
//! ```
//! use optsched::{compute_optimal_schedule, TaskGraph};
//!
//! let graph = TaskGraph::builder()
//!     .add_node("a", 2)
//!     .add_node("b", 3)
//!     .add_link("a", "b", 1)
//!     .build()
//!     .unwrap();
//! let schedule = compute_optimal_schedule(&graph, 2).unwrap();
//! assert_eq!(schedule.end_time(), 5);
//! ```

pub mod config;
pub mod graph;
mod interner;
pub mod logging;
pub mod models;
pub mod schedule;
pub mod search;

#[cfg(feature = "python")]
mod python;

pub use config::{EstimatorSelection, SearchConfig, DEFAULT_FANOUT_THRESHOLD};
pub use graph::{GraphError, TaskGraph, TaskGraphBuilder};
pub use models::{Cost, Link, Node, NodeId, Task};
pub use schedule::{CostEstimatedSchedule, Schedule};
pub use search::{
    compute_optimal_schedule, CostEstimator, EstimatorSet, OptimalScheduler, SearchError,
    SearchMonitor, SearchResult, SearchSnapshot, WorkerFailure,
};
