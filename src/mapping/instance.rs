//! mapping::instance
//!
//! Instance creation and type queries.
//!
//! A new instance is a fresh node with a `kyanosInstanceOf` edge to its
//! metaclass. It starts unrooted: it is recorded in the session's pending set
//! until it receives a container or the session is closed.

use crate::core::labels::{CONTAINER, INSTANCE_OF, METACLASS_NAME};
use crate::core::types::{Direction, NodeId, Value};
use crate::store::GraphStore;

use super::{Diagnostic, MappingError, ModelMapping, Operation};

impl<S: GraphStore> ModelMapping<S> {
    /// Create an instance of `type_name` for the resource `resource`.
    ///
    /// The namespace URI is required to tell apart same-named metaclasses.
    ///
    /// # Errors
    ///
    /// Returns `MappingError::InvalidArgument` if `ns_uri` is missing or
    /// empty, or if `type_name` or `resource` is malformed.
    pub fn create_instance(
        &mut self,
        type_name: &str,
        ns_uri: Option<&str>,
        resource: &str,
    ) -> Result<NodeId, MappingError> {
        let ns_uri = ns_uri.filter(|ns| !ns.is_empty()).ok_or_else(|| {
            MappingError::InvalidArgument(format!(
                "a namespace URI is required to create an instance of '{type_name}'"
            ))
        })?;
        NodeId::new(resource).map_err(|e| {
            MappingError::InvalidArgument(format!("invalid resource name: {e}"))
        })?;

        self.timed(Operation::CreateInstance, |this| {
            let metaclass = this.resolve_or_create_metaclass(type_name, ns_uri)?;
            let node = this.store.add_node(None)?;
            // Not an ordered feature: no position, no size counter.
            this.store.add_edge(&node, INSTANCE_OF, &metaclass)?;
            this.pending.insert(node.clone(), resource);

            tracing::trace!(%node, type_name, resource, "Created instance");
            Ok(node)
        })
    }

    /// Metaclass node of `node`.
    ///
    /// # Errors
    ///
    /// Returns `MappingError::InconsistentState` unless `node` has exactly
    /// one `kyanosInstanceOf` edge.
    pub fn metaclass_of(&self, node: &NodeId) -> Result<NodeId, MappingError> {
        let mut metaclasses = self.store.neighbors(node, Direction::Out, INSTANCE_OF)?;
        match metaclasses.len() {
            1 => Ok(metaclasses.remove(0)),
            0 => Err(MappingError::InconsistentState(format!(
                "cannot find the metaclass of {node}"
            ))),
            n => Err(MappingError::InconsistentState(format!(
                "{node} has {n} metaclasses"
            ))),
        }
    }

    /// Type name of `node`.
    pub fn get_type(&self, node: &NodeId) -> Result<String, MappingError> {
        let metaclass = self.metaclass_of(node)?;
        match self.store.node_property(&metaclass, METACLASS_NAME)? {
            Some(Value::String(name)) => Ok(name),
            _ => Err(MappingError::InconsistentState(format!(
                "metaclass {metaclass} has no name"
            ))),
        }
    }

    /// Whether `node` is a direct instance of `type_name`.
    pub fn is_type_of(&self, node: &NodeId, type_name: &str) -> Result<bool, MappingError> {
        Ok(self.get_type(node)? == type_name)
    }

    /// Whether `node` is an instance of `type_name` or of one of its subtypes.
    ///
    /// Without a metamodel this computes [`Self::is_type_of`] instead and
    /// records a diagnostic.
    pub fn is_kind_of(&self, node: &NodeId, type_name: &str) -> Result<bool, MappingError> {
        let Some(metamodel) = self.options.metamodel.as_deref() else {
            self.diagnose(Diagnostic::UnsupportedOperation {
                operation: "isKindOf",
                fallback: "isTypeOf",
            });
            return self.is_type_of(node, type_name);
        };

        let actual = self.get_type(node)?;
        Ok(actual == type_name
            || metamodel
                .all_supertypes(&actual)
                .iter()
                .any(|t| t == type_name))
    }

    /// Container of `node`, if it has one.
    pub fn get_parent(&self, node: &NodeId) -> Result<Option<NodeId>, MappingError> {
        let parents = self.store.neighbors(node, Direction::Out, CONTAINER)?;
        if parents.len() > 1 {
            return Err(MappingError::InconsistentState(format!(
                "{node} has {} containers",
                parents.len()
            )));
        }
        Ok(parents.into_iter().next())
    }

    /// Whether `node` was created in this session and has not been rooted yet.
    pub fn is_pending(&self, node: &NodeId) -> bool {
        self.pending.contains(node)
    }
}

#[cfg(test)]
mod tests {
    use crate::core::labels::INSTANCE_OF;
    use crate::core::metamodel::Metamodel;
    use crate::core::types::{Direction, NodeId};
    use crate::mapping::{Diagnostic, MappingError, MappingOptions, ModelMapping};
    use crate::store::{GraphStore, MemoryGraph};

    #[test]
    fn create_instance_links_metaclass_and_marks_pending() {
        let mut mapping = ModelMapping::new(MemoryGraph::new());
        let a = mapping.create_instance("Foo", Some("ns1"), "res1").unwrap();

        assert_eq!(mapping.get_type(&a).unwrap(), "Foo");
        assert_eq!(mapping.metaclass_of(&a).unwrap().as_str(), "Foo@ns1");
        assert!(mapping.is_pending(&a));
        assert_eq!(mapping.pending().resource_of(&a), Some("res1"));
        assert_eq!(mapping.get_parent(&a).unwrap(), None);
    }

    #[test]
    fn instances_share_metaclass() {
        let mut mapping = ModelMapping::new(MemoryGraph::new());
        let a = mapping.create_instance("Foo", Some("ns1"), "r").unwrap();
        let b = mapping.create_instance("Foo", Some("ns1"), "r").unwrap();
        assert_eq!(
            mapping.metaclass_of(&a).unwrap(),
            mapping.metaclass_of(&b).unwrap()
        );
        assert_eq!(mapping.all_instances_of_type("Foo").unwrap(), vec![a, b]);
    }

    #[test]
    fn missing_namespace_is_rejected() {
        let mut mapping = ModelMapping::new(MemoryGraph::new());
        assert!(matches!(
            mapping.create_instance("Foo", None, "r"),
            Err(MappingError::InvalidArgument(_))
        ));
        assert!(matches!(
            mapping.create_instance("Foo", Some(""), "r"),
            Err(MappingError::InvalidArgument(_))
        ));
        assert_eq!(mapping.store().node_count(), 0);
    }

    #[test]
    fn empty_resource_name_is_rejected() {
        let mut mapping = ModelMapping::new(MemoryGraph::new());
        assert!(matches!(
            mapping.create_instance("Foo", Some("ns1"), ""),
            Err(MappingError::InvalidArgument(_))
        ));
    }

    #[test]
    fn type_of_untyped_node_is_inconsistent() {
        let mut graph = MemoryGraph::new();
        let orphan = graph.add_node(Some(NodeId::new("orphan").unwrap())).unwrap();
        let mapping = ModelMapping::new(graph);

        assert!(matches!(
            mapping.get_type(&orphan),
            Err(MappingError::InconsistentState(_))
        ));
    }

    #[test]
    fn is_type_of_compares_exact_type() {
        let mut mapping = ModelMapping::new(MemoryGraph::new());
        let a = mapping.create_instance("Foo", Some("ns1"), "r").unwrap();
        assert!(mapping.is_type_of(&a, "Foo").unwrap());
        assert!(!mapping.is_type_of(&a, "Bar").unwrap());
    }

    #[test]
    fn is_kind_of_follows_supertypes() {
        let metamodel = Metamodel::new("shapes", "urn:shapes")
            .with_class("Shape", true, &[])
            .with_class("Polygon", true, &["Shape"])
            .with_class("Square", false, &["Polygon"]);
        let options = MappingOptions::default().with_metamodel(metamodel);
        let mut mapping = ModelMapping::with_options(MemoryGraph::new(), options);
        let sq = mapping.create_instance("Square", Some("urn:shapes"), "r").unwrap();

        assert!(mapping.is_kind_of(&sq, "Square").unwrap());
        assert!(mapping.is_kind_of(&sq, "Shape").unwrap());
        assert!(!mapping.is_kind_of(&sq, "Circle").unwrap());
        assert!(mapping.diagnostics().is_empty());
    }

    #[test]
    fn is_kind_of_without_metamodel_degrades() {
        let mut mapping = ModelMapping::new(MemoryGraph::new());
        let sq = mapping.create_instance("Square", Some("urn:shapes"), "r").unwrap();

        assert!(!mapping.is_kind_of(&sq, "Shape").unwrap());
        assert_eq!(
            mapping.diagnostics(),
            vec![Diagnostic::UnsupportedOperation {
                operation: "isKindOf",
                fallback: "isTypeOf",
            }]
        );
    }

    #[test]
    fn exactly_one_instance_of_edge() {
        let mut mapping = ModelMapping::new(MemoryGraph::new());
        let a = mapping.create_instance("Foo", Some("ns1"), "r").unwrap();
        let edges = mapping
            .store()
            .edges(&a, Direction::Out, INSTANCE_OF)
            .unwrap();
        assert_eq!(edges.len(), 1);
    }
}
