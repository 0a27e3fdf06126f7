//! mapping::pending
//!
//! Instances created but not yet placed in a container.

use std::collections::HashMap;

use crate::core::types::NodeId;

#[derive(Debug, Clone)]
struct PendingEntry {
    resource: String,
    seq: u64,
}

/// Unrooted instances and the resource each one was created for.
///
/// Owned by a single mapping session. Entries come back out of
/// [`PendingSet::drain`] in creation order.
#[derive(Debug, Default)]
pub struct PendingSet {
    entries: HashMap<NodeId, PendingEntry>,
    next_seq: u64,
}

impl PendingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `node` as unrooted in `resource`.
    pub fn insert(&mut self, node: NodeId, resource: impl Into<String>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(
            node,
            PendingEntry {
                resource: resource.into(),
                seq,
            },
        );
    }

    /// Forget `node`. Returns whether it was pending.
    pub fn remove(&mut self, node: &NodeId) -> bool {
        self.entries.remove(node).is_some()
    }

    pub fn contains(&self, node: &NodeId) -> bool {
        self.entries.contains_key(node)
    }

    /// Resource `node` was created for, if it is still pending.
    pub fn resource_of(&self, node: &NodeId) -> Option<&str> {
        self.entries.get(node).map(|e| e.resource.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct resources of the pending entries, in order of first creation.
    pub fn resources(&self) -> Vec<String> {
        let mut entries: Vec<&PendingEntry> = self.entries.values().collect();
        entries.sort_by_key(|entry| entry.seq);
        let mut resources: Vec<String> = Vec::new();
        for entry in entries {
            if !resources.contains(&entry.resource) {
                resources.push(entry.resource.clone());
            }
        }
        resources
    }

    /// Remove every entry, returning `(node, resource)` pairs in creation order.
    pub fn drain(&mut self) -> Vec<(NodeId, String)> {
        let mut entries: Vec<(NodeId, PendingEntry)> = self.entries.drain().collect();
        entries.sort_by_key(|(_, entry)| entry.seq);
        entries
            .into_iter()
            .map(|(node, entry)| (node, entry.resource))
            .collect()
    }
}
