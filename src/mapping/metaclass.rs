//! mapping::metaclass
//!
//! Metaclass registry.
//!
//! # Layout
//!
//! Each metaclass is a node with id `<type>@<nsURI>` carrying `name` and
//! `nsURI` properties, registered in the `metaclasses` index under its name.
//! Instances point at it with a `kyanosInstanceOf` edge.
//!
//! # Name-only Lookup
//!
//! Several namespaces may declare the same type name. Looking a metaclass up
//! by name alone returns the first one registered in the index and records a
//! [`Diagnostic::AmbiguousMetaclass`](super::Diagnostic::AmbiguousMetaclass).
//! Pass a namespace to get an exact match.

use crate::core::labels::{
    INSTANCE_OF, METACLASS_INDEX, METACLASS_INDEX_KEY, METACLASS_NAME, METACLASS_NS_URI,
};
use crate::core::types::{validate_type_name, Direction, NodeId, Value};
use crate::store::GraphStore;

use super::error::index_error;
use super::{Diagnostic, MappingError, ModelMapping, Operation};

impl<S: GraphStore> ModelMapping<S> {
    /// Find the metaclass node for `type_name`.
    ///
    /// With `ns_uri`, only a metaclass declared in that namespace matches.
    /// Without it, the first indexed metaclass with that name is returned.
    ///
    /// # Errors
    ///
    /// Returns `MappingError::InvalidArgument` if the metaclass index is
    /// missing from the store.
    pub fn metaclass(
        &self,
        type_name: &str,
        ns_uri: Option<&str>,
    ) -> Result<Option<NodeId>, MappingError> {
        let candidates = self
            .store
            .index_get(METACLASS_INDEX, METACLASS_INDEX_KEY, type_name)
            .map_err(index_error)?;

        match ns_uri {
            Some(ns_uri) => {
                for candidate in candidates {
                    let stored = self.store.node_property(&candidate, METACLASS_NS_URI)?;
                    if stored.as_ref().and_then(Value::as_str) == Some(ns_uri) {
                        return Ok(Some(candidate));
                    }
                }
                Ok(None)
            }
            None => {
                if candidates.len() > 1 {
                    self.diagnose(Diagnostic::AmbiguousMetaclass {
                        type_name: type_name.to_string(),
                        candidates: candidates.len(),
                        chosen: candidates[0].clone(),
                    });
                }
                Ok(candidates.into_iter().next())
            }
        }
    }

    /// Find the metaclass node for `type_name` in `ns_uri`, creating it if
    /// it does not exist.
    ///
    /// Idempotent: the same pair always yields the same node.
    pub fn resolve_or_create_metaclass(
        &mut self,
        type_name: &str,
        ns_uri: &str,
    ) -> Result<NodeId, MappingError> {
        self.timed(Operation::ResolveMetaclass, |this| {
            validate_type_name(type_name)?;
            if ns_uri.is_empty() {
                return Err(MappingError::InvalidArgument(format!(
                    "namespace URI of '{type_name}' cannot be empty"
                )));
            }

            if let Some(existing) = this.metaclass(type_name, Some(ns_uri))? {
                return Ok(existing);
            }

            let id = NodeId::for_metaclass(type_name, ns_uri)?;
            let node = this.store.add_node(Some(id))?;
            this.store
                .set_node_property(&node, METACLASS_NAME, Value::from(type_name))?;
            this.store
                .set_node_property(&node, METACLASS_NS_URI, Value::from(ns_uri))?;
            this.store
                .index_put(METACLASS_INDEX, METACLASS_INDEX_KEY, type_name, &node)
                .map_err(index_error)?;

            tracing::debug!(%node, type_name, ns_uri, "Created metaclass");
            Ok(node)
        })
    }

    /// Instances whose metaclass is exactly `type_name`, in creation order.
    ///
    /// Returns an empty list for an unknown type.
    pub fn all_instances_of_type(&self, type_name: &str) -> Result<Vec<NodeId>, MappingError> {
        match self.metaclass(type_name, None)? {
            Some(metaclass) => Ok(self
                .store
                .neighbors(&metaclass, Direction::In, INSTANCE_OF)?),
            None => Ok(Vec::new()),
        }
    }

    /// Instances of `type_name` or any of its concrete subtypes, restricted
    /// to the metamodel's namespace.
    ///
    /// Without a metamodel this computes [`Self::all_instances_of_type`]
    /// instead and records a diagnostic.
    ///
    /// # Errors
    ///
    /// Returns `MappingError::InconsistentState` if a metamodel is configured
    /// but does not declare `type_name`.
    pub fn all_instances_of_kind(&self, type_name: &str) -> Result<Vec<NodeId>, MappingError> {
        let Some(metamodel) = self.options.metamodel.as_deref() else {
            self.diagnose(Diagnostic::UnsupportedOperation {
                operation: "allInstancesOfKind",
                fallback: "allInstancesOfType",
            });
            return self.all_instances_of_type(type_name);
        };

        if !metamodel.contains_type(type_name) {
            return Err(MappingError::InconsistentState(format!(
                "metamodel '{}' doesn't declare a class named '{}'",
                metamodel.name(),
                type_name
            )));
        }

        let ns_uri = metamodel.ns_uri();
        let mut result = Vec::new();
        for subtype in metamodel.concrete_subtypes(type_name) {
            if let Some(metaclass) = self.metaclass(&subtype, Some(ns_uri))? {
                result.extend(self.store.neighbors(&metaclass, Direction::In, INSTANCE_OF)?);
            }
        }
        Ok(result)
    }
}
