//! mapping::finalize
//!
//! Closing a session.
//!
//! Instances that never received a container would be unreachable from any
//! resource. On close, each one is appended to the `eContents` of the root
//! node of the resource it was created for. A root is an instance of the
//! configured root type whose node id is the resource name, created the
//! first time it is needed.
//!
//! `eContents` edges are ordinary ordered edges. They do not go through
//! containment bookkeeping, so attached instances still report no parent.

use crate::core::labels::{CONTENTS, INSTANCE_OF};
use crate::core::types::{Direction, NodeId};
use crate::store::GraphStore;

use super::{CloseError, MappingError, ModelMapping, Operation};

impl<S: GraphStore> ModelMapping<S> {
    /// Root node of `resource`, if one has been created.
    ///
    /// # Errors
    ///
    /// Returns `MappingError::InconsistentState` if a node with the
    /// resource's id exists but is not an instance of the root type.
    pub fn resource_root(&self, resource: &str) -> Result<Option<NodeId>, MappingError> {
        let id = NodeId::new(resource)?;
        if !self.store.contains_node(&id) {
            return Ok(None);
        }

        let root_type = self.options.root_type.as_str();
        let root_namespace = self.options.root_namespace.as_str();
        let is_root = match self.metaclass(root_type, Some(root_namespace))? {
            Some(metaclass) => self
                .store
                .neighbors(&id, Direction::Out, INSTANCE_OF)?
                .contains(&metaclass),
            None => false,
        };
        if !is_root {
            return Err(MappingError::InconsistentState(format!(
                "node {id} exists but is not a {root_type} resource root"
            )));
        }
        Ok(Some(id))
    }

    /// Attach every unrooted instance to its resource root and end the
    /// session, handing back the store.
    ///
    /// Instances are attached in creation order. Every resource root is
    /// checked before anything is written, so a resource name that clashes
    /// with an existing node fails the close with the graph untouched.
    ///
    /// # Errors
    ///
    /// Returns a [`CloseError`] carrying the store.
    pub fn close(mut self) -> Result<S, CloseError<S>> {
        match self.timed(Operation::Close, Self::attach_pending) {
            Ok(()) => Ok(self.store),
            Err(error) => {
                tracing::warn!(%error, pending = self.pending.len(), "Failed to close mapping session");
                Err(CloseError {
                    error,
                    store: self.store,
                })
            }
        }
    }

    fn attach_pending(&mut self) -> Result<(), MappingError> {
        for resource in self.pending.resources() {
            self.resource_root(&resource)?;
        }

        let pending = self.pending.drain();
        let attached = pending.len();
        for (node, resource) in pending {
            let root = self.resource_root_or_create(&resource)?;
            self.append_edge(&root, CONTENTS, &node)?;
            tracing::trace!(%node, %root, "Attached to resource root");
        }

        tracing::debug!(attached, "Closed mapping session");
        Ok(())
    }

    fn resource_root_or_create(&mut self, resource: &str) -> Result<NodeId, MappingError> {
        if let Some(root) = self.resource_root(resource)? {
            return Ok(root);
        }

        let root_type = self.options.root_type.clone();
        let root_namespace = self.options.root_namespace.clone();
        let metaclass = self.resolve_or_create_metaclass(&root_type, &root_namespace)?;
        let root = self.store.add_node(Some(NodeId::new(resource)?))?;
        self.store.add_edge(&root, INSTANCE_OF, &metaclass)?;

        tracing::debug!(%root, %root_type, "Created resource root");
        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use crate::core::labels::CONTENTS;
    use crate::core::types::{Direction, NodeId};
    use crate::mapping::{MappingError, MappingOptions, ModelMapping};
    use crate::store::{GraphStore, MemoryGraph};

    #[test]
    fn close_attaches_unrooted_instances_in_creation_order() {
        let mut m = ModelMapping::new(MemoryGraph::new());
        let a = m.create_instance("Foo", Some("ns1"), "res1").unwrap();
        let b = m.create_instance("Foo", Some("ns1"), "res1").unwrap();

        let graph = m.close().unwrap();

        let root = NodeId::new("res1").unwrap();
        assert_eq!(graph.neighbors(&root, Direction::Out, CONTENTS).unwrap(), vec![a, b]);
    }

    #[test]
    fn contained_instances_are_not_attached() {
        let mut m = ModelMapping::new(MemoryGraph::new());
        let parent = m.create_instance("P", Some("ns1"), "res1").unwrap();
        let child = m.create_instance("C", Some("ns1"), "res1").unwrap();
        m.set_reference(&parent, "children", None, &child, true)
            .unwrap();

        let graph = m.close().unwrap();

        let root = NodeId::new("res1").unwrap();
        assert_eq!(
            graph.neighbors(&root, Direction::Out, CONTENTS).unwrap(),
            vec![parent]
        );
        assert!(graph.edges(&child, Direction::In, CONTENTS).unwrap().is_empty());
    }

    #[test]
    fn one_root_per_resource() {
        let mut m = ModelMapping::new(MemoryGraph::new());
        let a = m.create_instance("Foo", Some("ns1"), "left").unwrap();
        let b = m.create_instance("Foo", Some("ns1"), "right").unwrap();
        let c = m.create_instance("Foo", Some("ns1"), "left").unwrap();

        let graph = m.close().unwrap();

        let left = NodeId::new("left").unwrap();
        let right = NodeId::new("right").unwrap();
        assert_eq!(graph.neighbors(&left, Direction::Out, CONTENTS).unwrap(), vec![a, c]);
        assert_eq!(graph.neighbors(&right, Direction::Out, CONTENTS).unwrap(), vec![b]);
    }

    #[test]
    fn roots_are_reused_across_sessions() {
        let mut m = ModelMapping::new(MemoryGraph::new());
        let a = m.create_instance("Foo", Some("ns1"), "res1").unwrap();
        let graph = m.close().unwrap();

        let mut m = ModelMapping::new(graph);
        let b = m.create_instance("Foo", Some("ns1"), "res1").unwrap();
        assert!(m.resource_root("res1").unwrap().is_some());
        let graph = m.close().unwrap();

        let root = NodeId::new("res1").unwrap();
        assert_eq!(graph.neighbors(&root, Direction::Out, CONTENTS).unwrap(), vec![a, b]);
    }

    #[test]
    fn root_uses_configured_type() {
        let options = MappingOptions::default().with_root_type("Resource", "urn:res");
        let mut m = ModelMapping::with_options(MemoryGraph::new(), options);
        m.create_instance("Foo", Some("ns1"), "res1").unwrap();
        let graph = m.close().unwrap();

        let m = ModelMapping::new(graph);
        let root = NodeId::new("res1").unwrap();
        assert_eq!(m.get_type(&root).unwrap(), "Resource");
        assert_eq!(m.all_instances_of_type("Resource").unwrap(), vec![root]);
    }

    #[test]
    fn resource_id_clash_fails_without_touching_graph() {
        let mut graph = MemoryGraph::new();
        let clash = graph.add_node(Some(NodeId::new("res1").unwrap())).unwrap();
        let mut m = ModelMapping::new(graph);
        let early = m.create_instance("Foo", Some("ns1"), "ok").unwrap();
        let instances: Vec<NodeId> = (0..5)
            .map(|_| m.create_instance("Foo", Some("ns1"), "res1").unwrap())
            .collect();

        let err = m.close().unwrap_err();

        assert!(matches!(err.error, MappingError::InconsistentState(_)));
        let graph = err.into_store();
        assert!(graph.contains_node(&clash));
        assert_eq!(graph.count_edges_labeled(CONTENTS), 0);
        assert!(!graph.contains_node(&NodeId::new("ok").unwrap()));
        for node in instances.iter().chain([&early]) {
            assert!(graph.contains_node(node));
        }
    }

    #[test]
    fn graph_recovered_from_failed_close_is_reusable() {
        let mut graph = MemoryGraph::new();
        let clash = NodeId::new("res1").unwrap();
        graph.add_node(Some(clash.clone())).unwrap();
        let mut m = ModelMapping::new(graph);
        let a = m.create_instance("Foo", Some("ns1"), "res1").unwrap();

        let mut graph = m.close().unwrap_err().into_store();
        graph.remove_node(&clash).unwrap();

        let mut m = ModelMapping::new(graph);
        assert_eq!(m.get_type(&a).unwrap(), "Foo");
        let b = m.create_instance("Foo", Some("ns1"), "res1").unwrap();
        let graph = m.close().unwrap();
        assert_eq!(
            graph.neighbors(&clash, Direction::Out, CONTENTS).unwrap(),
            vec![b]
        );
    }

    #[test]
    fn close_with_nothing_pending_leaves_graph_alone() {
        let m = ModelMapping::new(MemoryGraph::new());
        let graph = m.close().unwrap();
        assert_eq!(graph.node_count(), 0);
    }
}
