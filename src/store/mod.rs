//! store
//!
//! Single interface for all graph store operations.
//!
//! # Architecture
//!
//! The mapping never touches a concrete graph database. Everything it needs
//! goes through [`GraphStore`]: nodes with string-keyed properties, labeled
//! directed edges with properties, and a property-value index for exact-match
//! lookup of nodes.
//!
//! [`MemoryGraph`] is the bundled implementation. Other backends implement the
//! same trait.
//!
//! # Visibility
//!
//! Every mutation must be visible to subsequent reads through the same store
//! value. Durability and commit boundaries belong to the backend.
//!
//! # Example
//!
//! ```
//! use modelgraph::core::types::{Direction, Value};
//! use modelgraph::store::{GraphStore, MemoryGraph};
//!
//! let mut graph = MemoryGraph::new();
//! let a = graph.add_node(None).unwrap();
//! let b = graph.add_node(None).unwrap();
//!
//! let edge = graph.add_edge(&a, "knows", &b).unwrap();
//! graph.set_edge_property(edge, "since", Value::Int(2016)).unwrap();
//!
//! let out = graph.edges(&a, Direction::Out, "knows").unwrap();
//! assert_eq!(out, vec![edge]);
//! assert_eq!(graph.edge(edge).unwrap().to, b);
//! ```

pub mod memory;

pub use memory::MemoryGraph;

use std::path::PathBuf;

use thiserror::Error;

use crate::core::types::{Direction, EdgeId, NodeId, Value};

/// Errors from graph store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The node does not exist.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// The edge does not exist.
    #[error("edge not found: {0}")]
    EdgeNotFound(EdgeId),

    /// A node with the requested id already exists.
    #[error("node already exists: {0}")]
    DuplicateNode(NodeId),

    /// The index has not been created.
    #[error("index not found: {0}")]
    UnknownIndex(String),

    /// Failed to read or write a persisted graph.
    #[error("failed to access graph file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to encode or decode a persisted graph.
    #[error("failed to serialize graph: {0}")]
    Serialization(String),
}

/// Endpoints and label of an edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeRecord {
    /// Tail of the edge.
    pub from: NodeId,
    /// Edge label.
    pub label: String,
    /// Head of the edge.
    pub to: NodeId,
}

/// Primitive operations of a directed property graph.
///
/// All operations are synchronous. Implementations are not required to be
/// safe for concurrent mutation; callers serialize access.
pub trait GraphStore {
    /// Add a node.
    ///
    /// Uses `id` when given, otherwise the store generates one.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateNode` if `id` is already taken.
    fn add_node(&mut self, id: Option<NodeId>) -> Result<NodeId, StoreError>;

    /// Remove a node together with its incident edges and index entries.
    fn remove_node(&mut self, id: &NodeId) -> Result<(), StoreError>;

    /// Whether the node exists.
    fn contains_node(&self, id: &NodeId) -> bool;

    /// Add a labeled edge `from -> to`.
    fn add_edge(&mut self, from: &NodeId, label: &str, to: &NodeId) -> Result<EdgeId, StoreError>;

    /// Remove an edge.
    fn remove_edge(&mut self, edge: EdgeId) -> Result<(), StoreError>;

    /// Endpoints and label of an edge.
    fn edge(&self, edge: EdgeId) -> Result<EdgeRecord, StoreError>;

    /// Edges with `label` incident to `node` in `direction`, in insertion order.
    fn edges(
        &self,
        node: &NodeId,
        direction: Direction,
        label: &str,
    ) -> Result<Vec<EdgeId>, StoreError>;

    /// Read a node property.
    fn node_property(&self, node: &NodeId, key: &str) -> Result<Option<Value>, StoreError>;

    /// Write a node property, replacing any previous value.
    fn set_node_property(&mut self, node: &NodeId, key: &str, value: Value)
        -> Result<(), StoreError>;

    /// Remove a node property, returning the previous value.
    fn remove_node_property(&mut self, node: &NodeId, key: &str)
        -> Result<Option<Value>, StoreError>;

    /// Read an edge property.
    fn edge_property(&self, edge: EdgeId, key: &str) -> Result<Option<Value>, StoreError>;

    /// Write an edge property, replacing any previous value.
    fn set_edge_property(&mut self, edge: EdgeId, key: &str, value: Value)
        -> Result<(), StoreError>;

    /// Remove an edge property, returning the previous value.
    fn remove_edge_property(&mut self, edge: EdgeId, key: &str)
        -> Result<Option<Value>, StoreError>;

    /// Create a node index. Creating an existing index is a no-op.
    fn create_index(&mut self, index: &str);

    /// Whether the index exists.
    fn has_index(&self, index: &str) -> bool;

    /// Register `node` under `key = value` in `index`.
    fn index_put(
        &mut self,
        index: &str,
        key: &str,
        value: &str,
        node: &NodeId,
    ) -> Result<(), StoreError>;

    /// Nodes registered under `key = value` in `index`, in insertion order.
    fn index_get(&self, index: &str, key: &str, value: &str) -> Result<Vec<NodeId>, StoreError>;

    /// Nodes adjacent to `node` through `label` edges in `direction`.
    ///
    /// For `Direction::Out` these are the edge heads, for `Direction::In`
    /// the edge tails. Order follows [`GraphStore::edges`].
    fn neighbors(
        &self,
        node: &NodeId,
        direction: Direction,
        label: &str,
    ) -> Result<Vec<NodeId>, StoreError> {
        self.edges(node, direction, label)?
            .into_iter()
            .map(|edge| {
                let record = self.edge(edge)?;
                Ok(match direction {
                    Direction::Out => record.to,
                    Direction::In => record.from,
                })
            })
            .collect()
    }
}
