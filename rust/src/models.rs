//! Core data types for the scheduling system.

/// Dense integer identity of a node within its [`TaskGraph`](crate::graph::TaskGraph).
pub type NodeId = u32;

/// Execution cost, transfer cost and time values share one integer unit.
pub type Cost = u32;

/// A unit of work in the task graph.
///
/// The display name lives in the graph; see
/// [`TaskGraph::node_name`](crate::graph::TaskGraph::node_name).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    /// Execution time on any processor (always positive in a built graph).
    pub cost: Cost,
}

/// A weighted dependency edge between two nodes.
///
/// The destination cannot start on a processor other than the origin's before
/// `origin end + transfer_cost`. On the same processor the transfer is free.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Link {
    pub origin: NodeId,
    pub destination: NodeId,
    pub transfer_cost: Cost,
}

impl Link {
    /// Delay the destination pays after the origin ends, given both processors.
    #[inline]
    pub fn delay_between(&self, origin_processor: usize, destination_processor: usize) -> Cost {
        if origin_processor == destination_processor {
            0
        } else {
            self.transfer_cost
        }
    }
}

/// A node placed on a processor at a fixed start time.
///
/// Tasks are immutable once created; the end time is derived from the node cost.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Task {
    node: NodeId,
    processor: usize,
    start: Cost,
    end: Cost,
}

impl Task {
    /// `start + node.cost` must fit a [`Cost`], which holds for every start
    /// time a validated graph can produce.
    pub fn new(node: &Node, processor: usize, start: Cost) -> Self {
        Self {
            node: node.id,
            processor,
            start,
            end: start + node.cost,
        }
    }

    #[inline]
    pub fn node(&self) -> NodeId {
        self.node
    }

    #[inline]
    pub fn processor(&self) -> usize {
        self.processor
    }

    #[inline]
    pub fn start(&self) -> Cost {
        self.start
    }

    #[inline]
    pub fn end(&self) -> Cost {
        self.end
    }

    /// Execution time of the placed node.
    #[inline]
    pub fn duration(&self) -> Cost {
        self.end - self.start
    }
}
