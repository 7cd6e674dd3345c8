use optsched::search::ScheduleGenerator;
use optsched::{
    compute_optimal_schedule, Cost, EstimatorSelection, OptimalScheduler, Schedule, SearchConfig,
    TaskGraph,
};
use std::sync::atomic::{AtomicBool, Ordering};

fn chain() -> TaskGraph {
    TaskGraph::builder()
        .add_node("A", 1)
        .add_node("B", 1)
        .add_node("C", 1)
        .add_link("A", "B", 0)
        .add_link("B", "C", 0)
        .build()
        .unwrap()
}

fn pair() -> TaskGraph {
    TaskGraph::builder()
        .add_node("A", 5)
        .add_node("B", 5)
        .build()
        .unwrap()
}

fn diamond() -> TaskGraph {
    TaskGraph::builder()
        .add_node("A", 2)
        .add_node("B", 2)
        .add_node("C", 2)
        .add_node("D", 2)
        .add_link("A", "B", 1)
        .add_link("A", "C", 1)
        .add_link("B", "D", 1)
        .add_link("C", "D", 1)
        .build()
        .unwrap()
}

/// Seven nodes, an independent root and mixed transfer costs.
fn mixed() -> TaskGraph {
    TaskGraph::builder()
        .add_node("a", 2)
        .add_node("b", 3)
        .add_node("c", 3)
        .add_node("d", 2)
        .add_node("e", 4)
        .add_node("f", 1)
        .add_node("g", 2)
        .add_link("a", "b", 1)
        .add_link("a", "c", 2)
        .add_link("b", "d", 2)
        .add_link("c", "d", 1)
        .add_link("c", "e", 3)
        .add_link("d", "g", 1)
        .add_link("e", "g", 2)
        .add_link("f", "g", 1)
        .build()
        .unwrap()
}

/// Twelve nodes so the sequential phase descends before cutting.
fn layered() -> TaskGraph {
    let mut builder = TaskGraph::builder();
    let costs = [3, 2, 4, 1, 2, 3, 2, 1, 3, 2, 2, 1];
    for (i, cost) in costs.iter().enumerate() {
        builder.add_node(&format!("t{}", i), *cost);
    }
    for (origin, destination, transfer) in [
        (0, 3, 2),
        (0, 4, 1),
        (1, 4, 3),
        (1, 5, 1),
        (2, 5, 2),
        (3, 6, 1),
        (4, 7, 2),
        (5, 7, 1),
        (5, 8, 2),
        (6, 9, 1),
        (7, 9, 3),
        (8, 10, 1),
        (9, 11, 2),
        (10, 11, 1),
    ] {
        builder.add_link(
            &format!("t{}", origin),
            &format!("t{}", destination),
            transfer,
        );
    }
    builder.build().unwrap()
}

/// Exhaustive minimum over every leaf the generator can reach.
fn brute_force(graph: &TaskGraph, processors: usize) -> Cost {
    fn walk(graph: &TaskGraph, schedule: &Schedule) -> Cost {
        let children = ScheduleGenerator.generate(schedule, graph);
        if children.is_empty() {
            return schedule.end_time();
        }
        children
            .iter()
            .map(|child| walk(graph, child))
            .min()
            .unwrap_or(Cost::MAX)
    }
    walk(graph, &Schedule::new(processors))
}

/// Every start equals the max of parent arrivals and the previous task on
/// the same processor, in scheduling order.
fn assert_as_early_as_possible(graph: &TaskGraph, schedule: &Schedule) {
    let tasks = schedule.tasks();
    for (index, task) in tasks.iter().enumerate() {
        let earlier = &tasks[..index];

        let data_ready = graph
            .incoming_links(task.node())
            .iter()
            .map(|link| {
                let parent = earlier
                    .iter()
                    .find(|t| t.node() == link.origin)
                    .expect("parent scheduled before child");
                let transfer = if parent.processor() == task.processor() {
                    0
                } else {
                    link.transfer_cost
                };
                parent.end() + transfer
            })
            .max()
            .unwrap_or(0);
        let processor_free = earlier
            .iter()
            .filter(|t| t.processor() == task.processor())
            .map(|t| t.end())
            .last()
            .unwrap_or(0);

        assert_eq!(task.start(), data_ready.max(processor_free));
    }

    let mut nodes: Vec<_> = tasks.iter().map(|t| t.node()).collect();
    nodes.sort();
    nodes.dedup();
    assert_eq!(nodes.len(), graph.node_count());
}

#[test]
fn test_linear_chain_single_processor() {
    let graph = chain();
    let schedule = compute_optimal_schedule(&graph, 1).unwrap();

    assert_eq!(schedule.end_time(), 3);
    for (name, start) in [("A", 0), ("B", 1), ("C", 2)] {
        let task = schedule.task_for(graph.node_id(name).unwrap()).unwrap();
        assert_eq!(task.processor(), 0);
        assert_eq!((task.start(), task.end()), (start, start + 1));
    }
}

#[test]
fn test_independent_pair_two_processors() {
    let graph = pair();
    let schedule = compute_optimal_schedule(&graph, 2).unwrap();

    assert_eq!(schedule.end_time(), 5);
    let a = schedule.task_for(graph.node_id("A").unwrap()).unwrap();
    let b = schedule.task_for(graph.node_id("B").unwrap()).unwrap();
    assert_ne!(a.processor(), b.processor());
    assert_eq!((a.start(), b.start()), (0, 0));
}

#[test]
fn test_diamond_with_communication_cost() {
    let graph = diamond();
    let schedule = compute_optimal_schedule(&graph, 2).unwrap();

    assert_eq!(schedule.end_time(), 7);
    assert_as_early_as_possible(&graph, &schedule);
}

#[test]
fn test_matches_exhaustive_search() {
    let graph = mixed();
    for processors in 1..=3 {
        let expected = brute_force(&graph, processors);
        let schedule = compute_optimal_schedule(&graph, processors).unwrap();

        assert_eq!(schedule.end_time(), expected, "processors = {}", processors);
        assert_as_early_as_possible(&graph, &schedule);
    }
}

#[test]
fn test_more_processors_never_hurt() {
    let graph = layered();
    let costs: Vec<Cost> = (1..=3)
        .map(|p| compute_optimal_schedule(&graph, p).unwrap().end_time())
        .collect();

    assert_eq!(costs[0], graph.total_work()); // one processor: no transfers, no idle time
    assert!(costs[1] <= costs[0]);
    assert!(costs[2] <= costs[1]);
}

#[test]
fn test_optimum_independent_of_parallelism_and_cut_depth() {
    let graph = layered();
    let reference = compute_optimal_schedule(&graph, 2).unwrap().end_time();

    for threads in [1, 2, 4] {
        for threshold in [0, 3, 10, 100] {
            let config = SearchConfig::new(2)
                .with_parallelism(threads)
                .with_fanout_threshold(threshold);
            let result = OptimalScheduler::new(config).run(&graph).unwrap();

            assert_eq!(
                result.cost, reference,
                "threads = {}, threshold = {}",
                threads, threshold
            );
            assert!(result.optimal);
            assert_as_early_as_possible(&graph, &result.schedule);
        }
    }
}

#[test]
fn test_optimum_independent_of_estimator_subset() {
    let graph = mixed();
    let reference = brute_force(&graph, 2);

    for mask in 1..8u8 {
        let selection = EstimatorSelection {
            partial_makespan: mask & 1 != 0,
            critical_path: mask & 2 != 0,
            load_balance: mask & 4 != 0,
        };
        for seed in [true, false] {
            let config = SearchConfig::new(2)
                .with_estimators(selection)
                .with_seed(seed)
                .with_fanout_threshold(4);
            let result = OptimalScheduler::new(config).run(&graph).unwrap();
            assert_eq!(result.cost, reference, "{:?}, seed = {}", selection, seed);
        }
    }
}

#[test]
fn test_parallel_phase_runs_frontier() {
    let graph = layered();
    let config = SearchConfig::new(3).with_fanout_threshold(10);
    let result = OptimalScheduler::new(config).run(&graph).unwrap();

    assert!(result.frontier_size > 0);
    assert!(result.schedule.is_complete(&graph));
}

#[test]
fn test_monitor_readable_from_another_thread() {
    let graph = layered();
    let config = SearchConfig::new(2)
        .with_parallelism(2)
        .with_fanout_threshold(6);
    let scheduler = OptimalScheduler::new(config);
    let monitor = scheduler.monitor();
    let finished = AtomicBool::new(false);

    let (result, reads) = std::thread::scope(|scope| {
        let watcher = scope.spawn(|| {
            let mut reads = 0usize;
            loop {
                // checked before reading so the last read follows the run
                let done = finished.load(Ordering::Acquire);
                let snapshot = monitor.snapshot();
                match (snapshot.best_cost, &snapshot.best_schedule) {
                    (Some(cost), Some(best)) => assert_eq!(best.end_time(), cost),
                    (None, None) => {}
                    other => panic!("best cost and schedule disagree: {:?}", other),
                }
                assert!(snapshot.active_units <= snapshot.frontier_size);
                reads += 1;
                if done {
                    return reads;
                }
                std::thread::yield_now();
            }
        });
        let result = scheduler.run(&graph).unwrap();
        finished.store(true, Ordering::Release);
        (result, watcher.join().unwrap())
    });

    assert!(reads > 0);
    let snapshot = monitor.snapshot();
    assert_eq!(snapshot.best_cost, Some(result.cost));
    assert_eq!(snapshot.active_units, 0);
    assert_eq!(snapshot.frontier_size, result.frontier_size);
}
