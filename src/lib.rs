//! Modelgraph - object models stored as property graphs
//!
//! Modelgraph maps a typed, hierarchical object model onto a directed
//! property graph so that query engines can traverse the model with graph
//! operations: typed instances, attributes, ordered references, and
//! exclusive containment.
//!
//! # Architecture
//!
//! - [`core`] - Domain types, wire labels, metamodel descriptors, configuration
//! - [`store`] - Single interface for primitive graph operations, plus an
//!   in-memory backend
//! - [`mapping`] - Mapping sessions: instances, metaclasses, references,
//!   attributes, and closing
//!
//! # Correctness Invariants
//!
//! 1. Every instance has exactly one metaclass
//! 2. Every instance has at most one container
//! 3. Positions of an ordered feature are contiguous from zero
//! 4. Metaclasses are unique per name and namespace

pub mod core;
pub mod mapping;
pub mod store;
