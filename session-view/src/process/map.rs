//! Process map: the arena that owns every node of a session.
//!
//! Nodes refer to each other by [`ProcessId`]; the map is the only owner.
//! This keeps the parent ↔ children relation free of reference cycles and
//! lets any component hold a `&ProcessMap` while walking the tree.
//!
//! The session root (its leader) is created with the map and never removed,
//! so [`ProcessMap::root`] is always available. No node is ever removed.

use std::collections::HashMap;

use super::node::ProcessNode;
use crate::domain::ProcessId;

/// Registry of all process nodes in one session.
#[derive(Debug)]
pub struct ProcessMap {
    root: ProcessId,
    nodes: HashMap<ProcessId, ProcessNode>,
    /// Snapshot version, bumped once per applied batch
    version: u64,
}

impl ProcessMap {
    /// Create a map holding only an empty root node.
    #[must_use]
    pub fn new(root: ProcessId) -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(root.clone(), ProcessNode::new(root.clone()));
        Self { root, nodes, version: 0 }
    }

    #[must_use]
    pub fn root_id(&self) -> &ProcessId {
        &self.root
    }

    /// The session root.
    ///
    /// # Panics
    ///
    /// Never in practice: the root is inserted on construction and nodes are
    /// never removed.
    #[must_use]
    pub fn root(&self) -> &ProcessNode {
        self.nodes.get(&self.root).expect("root node is inserted on construction and never removed")
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ProcessNode> {
        self.nodes.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Current snapshot version. Changes whenever a batch is applied.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Iterate over all nodes in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &ProcessNode> {
        self.nodes.values()
    }

    /// Walk parent links upward from `id`, excluding `id` itself.
    ///
    /// The walk is bounded by the number of nodes, so it terminates even if
    /// links were ever corrupted into a cycle.
    pub fn ancestors<'a>(&'a self, id: &ProcessId) -> Ancestors<'a> {
        let next = self.nodes.get(id).and_then(|node| node.parent.as_ref());
        Ancestors { map: self, next, remaining: self.nodes.len() }
    }

    // Mutation is reserved for the tree builder and the search/expand pass.

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut ProcessNode> {
        self.nodes.get_mut(id)
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut ProcessNode> {
        self.nodes.values_mut()
    }

    /// Get the node for `id`, creating it if needed. Returns `true` when created.
    pub(crate) fn get_or_create(&mut self, id: &ProcessId) -> (&mut ProcessNode, bool) {
        let mut created = false;
        let node = self.nodes.entry(id.clone()).or_insert_with(|| {
            created = true;
            ProcessNode::new(id.clone())
        });
        (node, created)
    }

    pub(crate) fn bump_version(&mut self) {
        self.version += 1;
    }
}

/// Iterator over a node's ancestors, nearest first.
pub struct Ancestors<'a> {
    map: &'a ProcessMap,
    next: Option<&'a ProcessId>,
    remaining: usize,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a ProcessNode;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let node = self.map.get(self.next?.as_str())?;
        self.next = node.parent.as_ref();
        Some(node)
    }
}
