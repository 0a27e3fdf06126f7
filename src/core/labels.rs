//! core::labels
//!
//! Edge labels, property keys, and index names shared with the graph store.
//!
//! These values are persisted; changing any of them makes existing graphs
//! unreadable by the mapping.

/// Name of the index holding metaclass nodes.
pub const METACLASS_INDEX: &str = "metaclasses";

/// Index key under which metaclass nodes are registered.
pub const METACLASS_INDEX_KEY: &str = "name";

/// Label of the edge from an instance to its metaclass.
pub const INSTANCE_OF: &str = "kyanosInstanceOf";

/// Metaclass node property holding the type name.
pub const METACLASS_NAME: &str = "name";

/// Metaclass node property holding the namespace URI.
pub const METACLASS_NS_URI: &str = "nsURI";

/// Label of the edge from a contained node to its container.
pub const CONTAINER: &str = "eContainer";

/// Container edge property naming the containing feature.
pub const CONTAINING_FEATURE: &str = "containingFeature";

/// Label of the edges from a resource root to its top-level elements.
pub const CONTENTS: &str = "eContents";

/// Edge property holding the index of an edge in an ordered feature.
pub const POSITION: &str = "position";

/// Type of resource-root nodes unless configured otherwise.
pub const DEFAULT_ROOT_TYPE: &str = "EObject";

/// Namespace of [`DEFAULT_ROOT_TYPE`].
pub const DEFAULT_ROOT_NAMESPACE: &str = "http://www.eclipse.org/emf/2002/Ecore";

/// Node property key for the size counter of `feature`.
///
/// # Example
///
/// ```
/// use modelgraph::core::labels::size_key;
///
/// assert_eq!(size_key("children"), "children:size");
/// ```
pub fn size_key(feature: &str) -> String {
    format!("{feature}:size")
}
