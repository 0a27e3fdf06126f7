//! core
//!
//! Core domain types, wire constants, metamodel descriptors, and configuration.
//!
//! # Modules
//!
//! - [`types`] - Strong types: NodeId, EdgeId, Value, etc.
//! - [`labels`] - Edge labels and property keys persisted in the graph
//! - [`metamodel`] - Type hierarchy information not stored in the graph
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing
//! - Nothing in this layer touches the graph store

pub mod config;
pub mod labels;
pub mod metamodel;
pub mod types;
