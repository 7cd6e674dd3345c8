//! Immutable task graph and its validating builder.

use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use thiserror::Error;

use crate::interner::NodeInterner;
use crate::models::{Cost, Link, Node, NodeId};

/// Reasons a graph description is rejected before any search starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Duplicate node: {0}")]
    DuplicateNode(String),
    #[error("Link references unknown node: {0}")]
    UnknownNode(String),
    #[error("Node {0} must have a positive cost")]
    NonPositiveCost(String),
    #[error("Node {0} depends on itself")]
    SelfLoop(String),
    #[error("Duplicate link: {0} -> {1}")]
    DuplicateLink(String, String),
    #[error("Circular dependency detected in task graph")]
    CircularDependency,
    #[error("Total node and transfer cost {0} exceeds the largest representable time")]
    CostOverflow(u64),
}

/// Directed acyclic graph of weighted tasks.
///
/// Built once through [`TaskGraphBuilder`] and shared read-only by every
/// search unit. All per-node lookups are direct vector indexing by [`NodeId`].
#[derive(Debug, Clone)]
pub struct TaskGraph {
    nodes: Vec<Node>,
    incoming: Vec<Vec<Link>>,
    outgoing: Vec<Vec<Link>>,
    names: NodeInterner,
    topo_order: Vec<NodeId>,
    /// Longest computation-only path from each node to a sink, node included.
    bottom_levels: Vec<Cost>,
    total_work: Cost,
}

impl TaskGraph {
    pub fn builder() -> TaskGraphBuilder {
        TaskGraphBuilder::default()
    }

    /// All nodes, ordered by ID.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id as usize]
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node by name.
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.names.get(name)
    }

    pub fn node_name(&self, id: NodeId) -> &str {
        self.names.resolve(id).unwrap_or_default()
    }

    /// Links ending at `id`.
    #[inline]
    pub fn incoming_links(&self, id: NodeId) -> &[Link] {
        &self.incoming[id as usize]
    }

    /// Links starting at `id`.
    #[inline]
    pub fn outgoing_links(&self, id: NodeId) -> &[Link] {
        &self.outgoing[id as usize]
    }

    /// Node IDs such that every origin precedes its destinations.
    pub fn topological_order(&self) -> &[NodeId] {
        &self.topo_order
    }

    /// Length of the longest path from `id` to any sink, counting node costs
    /// only. Transfer costs are excluded since a whole chain may share a
    /// processor.
    #[inline]
    pub fn bottom_level(&self, id: NodeId) -> Cost {
        self.bottom_levels[id as usize]
    }

    /// Sum of all node costs.
    pub fn total_work(&self) -> Cost {
        self.total_work
    }
}

/// Collects named nodes and links, then validates them into a [`TaskGraph`].
#[derive(Debug, Clone, Default)]
pub struct TaskGraphBuilder {
    nodes: Vec<(String, Cost)>,
    links: Vec<(String, String, Cost)>,
}

impl TaskGraphBuilder {
    pub fn add_node(&mut self, name: &str, cost: Cost) -> &mut Self {
        self.nodes.push((name.to_string(), cost));
        self
    }

    pub fn add_link(&mut self, origin: &str, destination: &str, transfer_cost: Cost) -> &mut Self {
        self.links
            .push((origin.to_string(), destination.to_string(), transfer_cost));
        self
    }

    /// Validate and freeze the graph.
    ///
    /// # Returns
    /// * `Err(GraphError)` on duplicate or zero-cost nodes, dangling, self or
    ///   duplicate links, a cycle, or costs whose total does not fit a [`Cost`]
    pub fn build(&self) -> Result<TaskGraph, GraphError> {
        let mut names = NodeInterner::with_capacity(self.nodes.len());
        let mut nodes = Vec::with_capacity(self.nodes.len());

        for (name, cost) in &self.nodes {
            let Some(id) = names.insert(name) else {
                return Err(GraphError::DuplicateNode(name.clone()));
            };
            if *cost == 0 {
                return Err(GraphError::NonPositiveCost(name.clone()));
            }
            nodes.push(Node { id, cost: *cost });
        }

        let n = nodes.len();
        let mut incoming: Vec<Vec<Link>> = vec![Vec::new(); n];
        let mut outgoing: Vec<Vec<Link>> = vec![Vec::new(); n];
        let mut seen: FxHashSet<(NodeId, NodeId)> = FxHashSet::default();

        for (origin_name, destination_name, transfer_cost) in &self.links {
            let origin = names
                .get(origin_name)
                .ok_or_else(|| GraphError::UnknownNode(origin_name.clone()))?;
            let destination = names
                .get(destination_name)
                .ok_or_else(|| GraphError::UnknownNode(destination_name.clone()))?;

            if origin == destination {
                return Err(GraphError::SelfLoop(origin_name.clone()));
            }
            if !seen.insert((origin, destination)) {
                return Err(GraphError::DuplicateLink(
                    origin_name.clone(),
                    destination_name.clone(),
                ));
            }

            let link = Link {
                origin,
                destination,
                transfer_cost: *transfer_cost,
            };
            incoming[destination as usize].push(link);
            outgoing[origin as usize].push(link);
        }

        let total_work = check_cost_range(&nodes, &outgoing)?;
        let topo_order = topological_sort(&incoming, &outgoing)?;
        let bottom_levels = compute_bottom_levels(&nodes, &outgoing, &topo_order);

        Ok(TaskGraph {
            nodes,
            incoming,
            outgoing,
            names,
            topo_order,
            bottom_levels,
            total_work,
        })
    }
}

/// Sum of node costs, provided every node and transfer cost together fit in
/// a [`Cost`].
///
/// Any start or end time a schedule can produce follows a chain of distinct
/// tasks and links, so it never exceeds that combined sum. Bottom levels are
/// bounded by the node sum alone.
fn check_cost_range(nodes: &[Node], outgoing: &[Vec<Link>]) -> Result<Cost, GraphError> {
    let work: u64 = nodes.iter().map(|node| u64::from(node.cost)).sum();
    let transfers: u64 = outgoing
        .iter()
        .flatten()
        .map(|link| u64::from(link.transfer_cost))
        .sum();
    let total = work + transfers;

    if total > u64::from(Cost::MAX) {
        return Err(GraphError::CostOverflow(total));
    }
    Ok(work as Cost)
}

/// Kahn's algorithm over dense IDs; lower IDs are released first.
fn topological_sort(
    incoming: &[Vec<Link>],
    outgoing: &[Vec<Link>],
) -> Result<Vec<NodeId>, GraphError> {
    let mut in_degree: Vec<usize> = incoming.iter().map(|links| links.len()).collect();

    let mut queue: VecDeque<NodeId> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, &degree)| degree == 0)
        .map(|(id, _)| id as NodeId)
        .collect();

    let mut order = Vec::with_capacity(incoming.len());

    while let Some(id) = queue.pop_front() {
        order.push(id);
        for link in &outgoing[id as usize] {
            let degree = &mut in_degree[link.destination as usize];
            *degree -= 1;
            if *degree == 0 {
                queue.push_back(link.destination);
            }
        }
    }

    if order.len() != incoming.len() {
        return Err(GraphError::CircularDependency);
    }

    Ok(order)
}

fn compute_bottom_levels(
    nodes: &[Node],
    outgoing: &[Vec<Link>],
    topo_order: &[NodeId],
) -> Vec<Cost> {
    let mut levels = vec![0; nodes.len()];
    for &id in topo_order.iter().rev() {
        let tail = outgoing[id as usize]
            .iter()
            .map(|link| levels[link.destination as usize])
            .max()
            .unwrap_or(0);
        levels[id as usize] = nodes[id as usize].cost + tail;
    }
    levels
}
