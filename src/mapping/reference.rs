//! mapping::reference
//!
//! References, containment, and ordered edge positions.
//!
//! # Layout
//!
//! Setting feature `F` of node `N` to `T` appends an `F` edge `N -> T` with
//! a `position` property equal to the current size, then bumps the
//! `F:size` counter on `N`. Only appending is supported; there is no
//! positional insert.
//!
//! Containment additionally adds an `eContainer` edge `T -> N` carrying
//! `containingFeature = F`. A node has at most one container: giving it a
//! new one first removes it from the old container's feature.
//!
//! # Opposites
//!
//! For a non-containment reference with an opposite, the inverse edge is
//! appended on the target as well. [`ModelMapping::set_reference`] handles
//! the opposite; [`ModelMapping::set_single_reference`] never does, and the
//! opposite is always written through it, so no call recurses twice.
//!
//! A containment with an opposite stores no inverse edge. Reading the
//! container side with [`ModelMapping::get_reference`] navigates the
//! opposite's incoming edges instead.
//!
//! # Invariants
//!
//! - Positions of the `F` edges of `N` are exactly `0..size`
//! - `F:size` is absent when the feature is empty

use crate::core::labels::{size_key, CONTAINER, CONTAINING_FEATURE, POSITION};
use crate::core::types::{Direction, EdgeId, NodeId, Value};
use crate::store::{GraphStore, StoreError};

use super::{MappingError, ModelMapping, Operation};

impl<S: GraphStore> ModelMapping<S> {
    /// Targets of `feature` on `node`, in position order.
    ///
    /// When `is_container` is set and `opposite` names the containment on the
    /// other side, returns the nodes holding `node` through that feature.
    pub fn get_reference(
        &self,
        node: &NodeId,
        feature: &str,
        opposite: Option<&str>,
        is_container: bool,
    ) -> Result<Vec<NodeId>, MappingError> {
        match opposite.filter(|o| !o.is_empty()) {
            Some(opposite) if is_container => {
                Ok(self.store.neighbors(node, Direction::In, opposite)?)
            }
            _ => self
                .ordered_edges(node, feature)?
                .into_iter()
                .map(|edge| Ok(self.store.edge(edge)?.to))
                .collect(),
        }
    }

    /// Append `to` to `feature` of `from`, keeping `opposite` in sync.
    ///
    /// For a non-containment reference with an opposite, `from` is also
    /// appended to `opposite` of `to`. Returns the new `feature` edge.
    pub fn set_reference(
        &mut self,
        from: &NodeId,
        feature: &str,
        opposite: Option<&str>,
        to: &NodeId,
        is_containment: bool,
    ) -> Result<EdgeId, MappingError> {
        self.require_nodes(&[from, to])?;
        if let Some(opposite) = opposite.filter(|o| !o.is_empty()) {
            if !is_containment {
                self.set_single_reference(to, opposite, from, false)?;
            }
        }
        self.set_single_reference(from, feature, to, is_containment)
    }

    /// Append `to` to `feature` of `from` without touching any opposite.
    pub fn set_single_reference(
        &mut self,
        from: &NodeId,
        feature: &str,
        to: &NodeId,
        is_containment: bool,
    ) -> Result<EdgeId, MappingError> {
        self.timed(Operation::SetReference, |this| {
            if is_containment {
                this.update_containment(from, feature, to)?;
            }
            this.append_edge(from, feature, to)
        })
    }

    /// Remove `to` from `feature` of `from`.
    ///
    /// Edges after the removed one move down one position and the size
    /// counter shrinks by one. For a containment, the `eContainer` edge of
    /// `to` is removed too.
    ///
    /// Returns the removed node, or `None` if `to` was not referenced. In
    /// that case nothing changes.
    pub fn remove_reference(
        &mut self,
        from: &NodeId,
        feature: &str,
        to: &NodeId,
        is_containment: bool,
    ) -> Result<Option<NodeId>, MappingError> {
        self.timed(Operation::RemoveReference, |this| {
            let edges = this.ordered_edges(from, feature)?;

            let mut matched = None;
            for (index, edge) in edges.iter().enumerate() {
                if this.store.edge(*edge)?.to == *to {
                    matched = Some(index);
                    break;
                }
            }
            let Some(index) = matched else {
                tracing::trace!(%from, feature, %to, "Reference to remove not found");
                return Ok(None);
            };

            for (position, edge) in edges.iter().enumerate().skip(index + 1) {
                this.store
                    .set_edge_property(*edge, POSITION, Value::Int(position as i64 - 1))?;
            }

            if is_containment {
                for container in this.store.edges(to, Direction::Out, CONTAINER)? {
                    if this.store.edge(container)?.to == *from {
                        this.store.remove_edge(container)?;
                    }
                }
            }
            this.store.remove_edge(edges[index])?;

            let size = this.size(from, feature)?;
            this.set_size(from, feature, size.saturating_sub(1))?;
            Ok(Some(to.clone()))
        })
    }

    /// Value of the size counter of `feature` on `node`.
    pub fn size(&self, node: &NodeId, feature: &str) -> Result<usize, MappingError> {
        match self.store.node_property(node, &size_key(feature))? {
            None => Ok(0),
            Some(Value::Int(n)) if n >= 0 => Ok(n as usize),
            Some(other) => Err(MappingError::InconsistentState(format!(
                "size of '{feature}' on {node} is {other}"
            ))),
        }
    }

    /// Write the size counter, removing it when `size` is zero.
    fn set_size(&mut self, node: &NodeId, feature: &str, size: usize) -> Result<(), MappingError> {
        let key = size_key(feature);
        if size == 0 {
            self.store.remove_node_property(node, &key)?;
        } else {
            self.store
                .set_node_property(node, &key, Value::Int(size as i64))?;
        }
        Ok(())
    }

    /// Append a positioned `feature` edge and bump the counter.
    pub(super) fn append_edge(
        &mut self,
        from: &NodeId,
        feature: &str,
        to: &NodeId,
    ) -> Result<EdgeId, MappingError> {
        let size = self.size(from, feature)?;
        let edge = self.store.add_edge(from, feature, to)?;
        self.store
            .set_edge_property(edge, POSITION, Value::Int(size as i64))?;
        self.set_size(from, feature, size + 1)?;
        Ok(edge)
    }

    /// Make `from` the only container of `to`, through `feature`.
    fn update_containment(
        &mut self,
        from: &NodeId,
        feature: &str,
        to: &NodeId,
    ) -> Result<(), MappingError> {
        self.timed(Operation::UpdateContainment, |this| {
            // Nothing may be detached unless the new container can be written.
            this.require_nodes(&[from, to])?;

            let current = this.store.edges(to, Direction::Out, CONTAINER)?;
            if let Some(&edge) = current.first() {
                let old_parent = this.store.edge(edge)?.to;
                let old_feature = this.store.edge_property(edge, CONTAINING_FEATURE)?;
                if let Some(Value::String(old_feature)) = old_feature {
                    this.remove_reference(&old_parent, &old_feature, to, true)?;
                }
            }

            // Whatever remove_reference could not attribute to a feature.
            for edge in this.store.edges(to, Direction::Out, CONTAINER)? {
                this.store.remove_edge(edge)?;
            }

            let edge = this.store.add_edge(to, CONTAINER, from)?;
            this.store
                .set_edge_property(edge, CONTAINING_FEATURE, Value::from(feature))?;

            if this.pending.remove(to) {
                tracing::trace!(node = %to, container = %from, "Instance rooted");
            }
            Ok(())
        })
    }

    fn require_nodes(&self, nodes: &[&NodeId]) -> Result<(), MappingError> {
        match nodes.iter().find(|n| !self.store.contains_node(n)) {
            Some(missing) => Err(StoreError::NodeNotFound((*missing).clone()).into()),
            None => Ok(()),
        }
    }

    /// Outgoing `feature` edges of `node`, sorted by position.
    ///
    /// Edges without a position keep their store order after the positioned ones.
    fn ordered_edges(&self, node: &NodeId, feature: &str) -> Result<Vec<EdgeId>, MappingError> {
        let mut keyed = Vec::new();
        for edge in self.store.edges(node, Direction::Out, feature)? {
            let position = self
                .store
                .edge_property(edge, POSITION)?
                .and_then(|v| v.as_int())
                .unwrap_or(i64::MAX);
            keyed.push((position, edge));
        }
        keyed.sort_by_key(|(position, _)| *position);
        Ok(keyed.into_iter().map(|(_, edge)| edge).collect())
    }
}
