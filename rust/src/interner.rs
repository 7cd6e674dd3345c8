//! Node name interning.
//!
//! Graph descriptions refer to nodes by name; the search works on dense
//! integer IDs so per-node data can live in plain vectors.

use rustc_hash::FxHashMap;

use crate::models::NodeId;

/// Bidirectional mapping between node names and dense [`NodeId`]s.
///
/// IDs are assigned in insertion order starting at zero.
#[derive(Debug, Clone, Default)]
pub struct NodeInterner {
    to_id: FxHashMap<String, NodeId>,
    names: Vec<String>,
}

impl NodeInterner {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            to_id: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            names: Vec::with_capacity(capacity),
        }
    }

    /// Register a new name. Returns `None` if the name is already taken.
    pub fn insert(&mut self, name: &str) -> Option<NodeId> {
        if self.to_id.contains_key(name) {
            return None;
        }
        let id = self.names.len() as NodeId;
        self.names.push(name.to_string());
        self.to_id.insert(name.to_string(), id);
        Some(id)
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.to_id.get(name).copied()
    }

    #[inline]
    pub fn resolve(&self, id: NodeId) -> Option<&str> {
        self.names.get(id as usize).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
