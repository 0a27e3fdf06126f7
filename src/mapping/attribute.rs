//! mapping::attribute
//!
//! Attribute access with default-value rules.
//!
//! Attributes are node properties keyed by feature name. Reads always return
//! a sequence: a stored list comes back as-is and a scalar is wrapped.
//!
//! Two tables drive the special cases:
//!
//! - Read defaults supply a value for an absent property, but only when a
//!   metamodel is configured
//! - Absent-write rules give the value stored when an attribute is set to
//!   nothing, for features whose meaning depends on explicit presence

use std::collections::BTreeMap;

use crate::core::types::{NodeId, Value};
use crate::store::GraphStore;

use super::{MappingError, ModelMapping, Operation};

/// Feature name to default-value rules for attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeDefaults {
    read: BTreeMap<String, Value>,
    absent_write: BTreeMap<String, Value>,
}

impl AttributeDefaults {
    /// No rules at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The rules for the Ecore metamodel.
    ///
    /// `visibility` and `inheritance` read as `"none"`, `proxy` reads as
    /// `"false"`, and clearing `isAbstract` stores `false`.
    pub fn standard() -> Self {
        Self::empty()
            .with_read_default("visibility", "none")
            .with_read_default("inheritance", "none")
            .with_read_default("proxy", "false")
            .with_absent_write("isAbstract", false)
    }

    pub fn with_read_default(mut self, feature: impl Into<String>, value: impl Into<Value>) -> Self {
        self.read.insert(feature.into(), value.into());
        self
    }

    pub fn with_absent_write(mut self, feature: impl Into<String>, value: impl Into<Value>) -> Self {
        self.absent_write.insert(feature.into(), value.into());
        self
    }

    /// Value read for `feature` when its property is absent.
    pub fn read_default(&self, feature: &str) -> Option<&Value> {
        self.read.get(feature)
    }

    /// Value stored when `feature` is set to nothing.
    pub fn absent_write(&self, feature: &str) -> Option<&Value> {
        self.absent_write.get(feature)
    }

    /// Add rules, replacing existing ones for the same feature.
    pub fn extend(
        &mut self,
        read: impl IntoIterator<Item = (String, Value)>,
        absent_write: impl IntoIterator<Item = (String, Value)>,
    ) {
        self.read.extend(read);
        self.absent_write.extend(absent_write);
    }
}

impl<S: GraphStore> ModelMapping<S> {
    /// Values of attribute `name` on `node`.
    ///
    /// Empty when the property is absent and no default applies.
    pub fn get_attribute(&self, node: &NodeId, name: &str) -> Result<Vec<Value>, MappingError> {
        let value = match self.store.node_property(node, name)? {
            Some(value) => Some(value),
            None if self.options.metamodel.is_some() => {
                self.options.attribute_defaults.read_default(name).cloned()
            }
            None => None,
        };

        Ok(match value {
            Some(Value::List(items)) => items,
            Some(scalar) => vec![scalar],
            None => Vec::new(),
        })
    }

    /// Write attribute `name` on `node`.
    ///
    /// `None` stores the feature's absent-write value if it has one, and
    /// removes the property otherwise.
    pub fn set_attribute(
        &mut self,
        node: &NodeId,
        name: &str,
        value: Option<Value>,
    ) -> Result<(), MappingError> {
        self.timed(Operation::SetAttribute, |this| {
            let value = value.or_else(|| this.options.attribute_defaults.absent_write(name).cloned());
            match value {
                Some(value) => this.store.set_node_property(node, name, value)?,
                None => {
                    this.store.remove_node_property(node, name)?;
                }
            }
            Ok(())
        })
    }
}
