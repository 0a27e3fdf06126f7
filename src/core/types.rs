//! core::types
//!
//! Strong types for graph and model concepts.
//!
//! # Types
//!
//! - [`NodeId`] - Validated node identifier
//! - [`EdgeId`] - Store-assigned edge identifier
//! - [`Value`] - Scalar or list property value
//! - [`Direction`] - Edge traversal direction
//!
//! # Validation
//!
//! Identifiers are validated at construction time. An empty node id
//! cannot be represented.
//!
//! # Examples
//!
//! ```
//! use modelgraph::core::types::{NodeId, Value};
//!
//! let id = NodeId::new("Package@http://example.org/java").unwrap();
//! assert_eq!(id.as_str(), "Package@http://example.org/java");
//!
//! assert!(NodeId::new("").is_err());
//!
//! let list = Value::from(vec![Value::from("a"), Value::from("b")]);
//! assert_eq!(list.as_list().map(|l| l.len()), Some(2));
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid node id: {0}")]
    InvalidNodeId(String),

    #[error("invalid type name: {0}")]
    InvalidTypeName(String),
}

/// Identifier of a node in the graph.
///
/// Node ids are opaque strings. Stores generate them when the caller does
/// not supply one; metaclass and resource-root nodes use meaningful ids
/// (`<type>@<nsURI>` and the resource name respectively).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId(String);

impl NodeId {
    /// Create a new validated node id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidNodeId` if the id is empty or contains
    /// control characters.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        if id.is_empty() {
            return Err(TypeError::InvalidNodeId("node id cannot be empty".into()));
        }
        if id.chars().any(|c| c.is_ascii_control()) {
            return Err(TypeError::InvalidNodeId(
                "node id cannot contain control characters".into(),
            ));
        }
        Ok(Self(id))
    }

    /// Generate a fresh random node id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Id of the metaclass node for `type_name` declared in `ns_uri`.
    ///
    /// # Example
    ///
    /// ```
    /// use modelgraph::core::types::NodeId;
    ///
    /// let id = NodeId::for_metaclass("Class", "http://example.org/uml").unwrap();
    /// assert_eq!(id.as_str(), "Class@http://example.org/uml");
    /// ```
    pub fn for_metaclass(type_name: &str, ns_uri: &str) -> Result<Self, TypeError> {
        Self::new(format!("{type_name}@{ns_uri}"))
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for NodeId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an edge, assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(u64);

impl EdgeId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Validate a metaclass name.
///
/// Type names end up inside metaclass node ids, so `@` is rejected to keep
/// the `<type>@<nsURI>` form unambiguous.
pub fn validate_type_name(name: &str) -> Result<(), TypeError> {
    if name.is_empty() {
        return Err(TypeError::InvalidTypeName("type name cannot be empty".into()));
    }
    if name.contains('@') {
        return Err(TypeError::InvalidTypeName(format!(
            "type name '{name}' cannot contain '@'"
        )));
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_ascii_control()) {
        return Err(TypeError::InvalidTypeName(format!(
            "type name '{name}' cannot contain whitespace"
        )));
    }
    Ok(())
}

/// Direction of an edge relative to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Edges leaving the node.
    Out,
    /// Edges arriving at the node.
    In,
}

/// Property value stored on nodes and edges.
///
/// Attributes are either scalar or sequence-shaped; `List` carries the
/// latter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
}

impl Value {
    /// Try to get as boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as f64. Integers are widened.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as a list of values.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Whether this value is sequence-shaped.
    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}
