//! Python bindings for the optimal scheduler.

use pyo3::prelude::*;

use crate::config::SearchConfig;
use crate::graph::TaskGraph;
use crate::search::OptimalScheduler;

/// Compute a minimum-makespan schedule.
///
/// # Arguments
/// * `nodes` - List of (name, cost) pairs
/// * `links` - List of (origin, destination, transfer_cost) triples
/// * `processor_count` - Number of identical processors
/// * `fanout_threshold` - Remaining-node count at which parallel units take over
/// * `verbosity` - 0=silent, 1=changes, 2=checks, 3=debug
///
/// # Returns
/// * (makespan, [(name, processor, start)]) in scheduling order
///
/// # Raises
/// * ValueError if the graph is invalid or processor_count is 0
/// * RuntimeError if a parallel search unit failed
#[pyfunction]
#[pyo3(signature = (nodes, links, processor_count, fanout_threshold=10, verbosity=0))]
fn compute_optimal_schedule(
    nodes: Vec<(String, u32)>,
    links: Vec<(String, String, u32)>,
    processor_count: usize,
    fanout_threshold: usize,
    verbosity: u8,
) -> PyResult<(u32, Vec<(String, usize, u32)>)> {
    let mut builder = TaskGraph::builder();
    for (name, cost) in &nodes {
        builder.add_node(name, *cost);
    }
    for (origin, destination, transfer_cost) in &links {
        builder.add_link(origin, destination, *transfer_cost);
    }
    let graph = builder
        .build()
        .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))?;

    if processor_count == 0 {
        return Err(pyo3::exceptions::PyValueError::new_err(
            "processor_count must be positive",
        ));
    }

    let config = SearchConfig::new(processor_count)
        .with_fanout_threshold(fanout_threshold)
        .with_verbosity(verbosity);
    let result = OptimalScheduler::new(config)
        .run(&graph)
        .map_err(|e| pyo3::exceptions::PyRuntimeError::new_err(e.to_string()))?;

    let tasks = result
        .schedule
        .tasks()
        .iter()
        .map(|task| {
            (
                graph.node_name(task.node()).to_string(),
                task.processor(),
                task.start(),
            )
        })
        .collect();

    Ok((result.cost, tasks))
}

/// The optsched Python module.
#[pymodule]
fn optsched(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(compute_optimal_schedule, m)?)?;
    Ok(())
}
