//! store::memory
//!
//! In-memory property graph.
//!
//! # Design
//!
//! Nodes and edges live in ordered maps so that snapshots serialize
//! deterministically. Each node keeps its incident edge ids in insertion
//! order, which is the order [`GraphStore::edges`] reports.
//!
//! The whole graph serializes with serde; [`MemoryGraph::save_json`] and
//! [`MemoryGraph::load_json`] persist it as a JSON document.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{EdgeRecord, GraphStore, StoreError};
use crate::core::types::{Direction, EdgeId, NodeId, Value};

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Stored node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct NodeData {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    properties: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    out_edges: Vec<EdgeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    in_edges: Vec<EdgeId>,
}

/// Stored edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EdgeData {
    from: NodeId,
    label: String,
    to: NodeId,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    properties: BTreeMap<String, Value>,
}

/// key -> value -> nodes
type IndexData = BTreeMap<String, BTreeMap<String, Vec<NodeId>>>;

/// In-memory graph store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryGraph {
    nodes: BTreeMap<NodeId, NodeData>,
    edges: BTreeMap<EdgeId, EdgeData>,
    indexes: BTreeMap<String, IndexData>,
    next_edge_id: u64,
}

impl MemoryGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// All node ids, in id order.
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    /// Number of edges carrying `label`.
    pub fn count_edges_labeled(&self, label: &str) -> usize {
        self.edges.values().filter(|e| e.label == label).count()
    }

    /// Write the graph to `path` as JSON.
    ///
    /// The document is written to a temporary sibling file first and then
    /// renamed over `path`.
    pub fn save_json(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err(path))?;
        }

        let contents = serde_json::to_vec_pretty(self)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let temp_path = path.with_extension("json.tmp");
        let mut file = fs::File::create(&temp_path).map_err(io_err(&temp_path))?;
        file.write_all(&contents).map_err(io_err(&temp_path))?;
        file.sync_all().map_err(io_err(&temp_path))?;
        fs::rename(&temp_path, path).map_err(io_err(path))?;

        tracing::debug!(path = %path.display(), nodes = self.nodes.len(), edges = self.edges.len(), "Saved graph");
        Ok(())
    }

    /// Read a graph previously written by [`MemoryGraph::save_json`].
    pub fn load_json(path: &Path) -> Result<Self, StoreError> {
        let contents = fs::read(path).map_err(io_err(path))?;
        let graph: MemoryGraph = serde_json::from_slice(&contents)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        tracing::debug!(path = %path.display(), nodes = graph.nodes.len(), edges = graph.edges.len(), "Loaded graph");
        Ok(graph)
    }

    fn node_data(&self, id: &NodeId) -> Result<&NodeData, StoreError> {
        self.nodes
            .get(id)
            .ok_or_else(|| StoreError::NodeNotFound(id.clone()))
    }

    fn node_data_mut(&mut self, id: &NodeId) -> Result<&mut NodeData, StoreError> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| StoreError::NodeNotFound(id.clone()))
    }

    fn edge_data(&self, edge: EdgeId) -> Result<&EdgeData, StoreError> {
        self.edges.get(&edge).ok_or(StoreError::EdgeNotFound(edge))
    }

    fn edge_data_mut(&mut self, edge: EdgeId) -> Result<&mut EdgeData, StoreError> {
        self.edges.get_mut(&edge).ok_or(StoreError::EdgeNotFound(edge))
    }
}

impl GraphStore for MemoryGraph {
    fn add_node(&mut self, id: Option<NodeId>) -> Result<NodeId, StoreError> {
        let id = id.unwrap_or_else(NodeId::generate);
        if self.nodes.contains_key(&id) {
            return Err(StoreError::DuplicateNode(id));
        }
        self.nodes.insert(id.clone(), NodeData::default());
        Ok(id)
    }

    fn remove_node(&mut self, id: &NodeId) -> Result<(), StoreError> {
        let data = self.node_data(id)?;
        let mut incident: Vec<EdgeId> = data.out_edges.clone();
        incident.extend(data.in_edges.iter().copied());
        incident.sort();
        incident.dedup();

        for edge in incident {
            self.remove_edge(edge)?;
        }
        self.nodes.remove(id);

        for keys in self.indexes.values_mut() {
            for values in keys.values_mut() {
                for nodes in values.values_mut() {
                    nodes.retain(|n| n != id);
                }
            }
        }
        Ok(())
    }

    fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    fn add_edge(&mut self, from: &NodeId, label: &str, to: &NodeId) -> Result<EdgeId, StoreError> {
        self.node_data(to)?;
        let edge = EdgeId::new(self.next_edge_id);
        self.node_data_mut(from)?.out_edges.push(edge);
        self.node_data_mut(to)?.in_edges.push(edge);
        self.next_edge_id += 1;

        self.edges.insert(
            edge,
            EdgeData {
                from: from.clone(),
                label: label.to_string(),
                to: to.clone(),
                properties: BTreeMap::new(),
            },
        );
        Ok(edge)
    }

    fn remove_edge(&mut self, edge: EdgeId) -> Result<(), StoreError> {
        let data = self
            .edges
            .remove(&edge)
            .ok_or(StoreError::EdgeNotFound(edge))?;

        if let Some(from) = self.nodes.get_mut(&data.from) {
            from.out_edges.retain(|e| *e != edge);
        }
        if let Some(to) = self.nodes.get_mut(&data.to) {
            to.in_edges.retain(|e| *e != edge);
        }
        Ok(())
    }

    fn edge(&self, edge: EdgeId) -> Result<EdgeRecord, StoreError> {
        let data = self.edge_data(edge)?;
        Ok(EdgeRecord {
            from: data.from.clone(),
            label: data.label.clone(),
            to: data.to.clone(),
        })
    }

    fn edges(
        &self,
        node: &NodeId,
        direction: Direction,
        label: &str,
    ) -> Result<Vec<EdgeId>, StoreError> {
        let data = self.node_data(node)?;
        let incident = match direction {
            Direction::Out => &data.out_edges,
            Direction::In => &data.in_edges,
        };
        Ok(incident
            .iter()
            .copied()
            .filter(|e| self.edges.get(e).is_some_and(|d| d.label == label))
            .collect())
    }

    fn node_property(&self, node: &NodeId, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.node_data(node)?.properties.get(key).cloned())
    }

    fn set_node_property(
        &mut self,
        node: &NodeId,
        key: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        self.node_data_mut(node)?
            .properties
            .insert(key.to_string(), value);
        Ok(())
    }

    fn remove_node_property(
        &mut self,
        node: &NodeId,
        key: &str,
    ) -> Result<Option<Value>, StoreError> {
        Ok(self.node_data_mut(node)?.properties.remove(key))
    }

    fn edge_property(&self, edge: EdgeId, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.edge_data(edge)?.properties.get(key).cloned())
    }

    fn set_edge_property(&mut self, edge: EdgeId, key: &str, value: Value) -> Result<(), StoreError> {
        self.edge_data_mut(edge)?
            .properties
            .insert(key.to_string(), value);
        Ok(())
    }

    fn remove_edge_property(
        &mut self,
        edge: EdgeId,
        key: &str,
    ) -> Result<Option<Value>, StoreError> {
        Ok(self.edge_data_mut(edge)?.properties.remove(key))
    }

    fn create_index(&mut self, index: &str) {
        self.indexes.entry(index.to_string()).or_default();
    }

    fn has_index(&self, index: &str) -> bool {
        self.indexes.contains_key(index)
    }

    fn index_put(
        &mut self,
        index: &str,
        key: &str,
        value: &str,
        node: &NodeId,
    ) -> Result<(), StoreError> {
        self.node_data(node)?;
        let entries = self
            .indexes
            .get_mut(index)
            .ok_or_else(|| StoreError::UnknownIndex(index.to_string()))?
            .entry(key.to_string())
            .or_default()
            .entry(value.to_string())
            .or_default();
        if !entries.contains(node) {
            entries.push(node.clone());
        }
        Ok(())
    }

    fn index_get(&self, index: &str, key: &str, value: &str) -> Result<Vec<NodeId>, StoreError> {
        let index_data = self
            .indexes
            .get(index)
            .ok_or_else(|| StoreError::UnknownIndex(index.to_string()))?;
        Ok(index_data
            .get(key)
            .and_then(|values| values.get(value))
            .cloned()
            .unwrap_or_default())
    }
}
