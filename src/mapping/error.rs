//! mapping::error
//!
//! Errors and non-fatal diagnostics produced by the mapping.
//!
//! # Taxonomy
//!
//! Errors abort the operation and are returned to the caller:
//! - [`MappingError::InvalidArgument`] - missing namespace, invalid names,
//!   uninitialized index
//! - [`MappingError::InconsistentState`] - the graph violates a structural
//!   invariant (e.g. an instance without a metaclass)
//!
//! Diagnostics never abort. They are logged and recorded on the session:
//! - [`Diagnostic::UnsupportedOperation`] - kind-based queries without a
//!   metamodel fall back to exact-type semantics
//! - [`Diagnostic::AmbiguousMetaclass`] - name-only metaclass lookup matched
//!   several namespaces and returned the first

use thiserror::Error;

use crate::core::config::ConfigError;
use crate::core::metamodel::MetamodelError;
use crate::core::types::{NodeId, TypeError};
use crate::store::StoreError;

/// Errors from mapping operations.
#[derive(Debug, Error)]
pub enum MappingError {
    /// A caller-supplied argument is missing or malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The graph does not satisfy a structural invariant.
    #[error("inconsistent state: {0}")]
    InconsistentState(String),

    /// The graph store rejected an operation.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The metamodel could not be loaded.
    #[error("metamodel error: {0}")]
    Metamodel(#[from] MetamodelError),

    /// The configuration could not be loaded.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Failure to close a mapping session.
///
/// Carries the store back to the caller so the graph is not lost with the
/// session.
pub struct CloseError<S> {
    /// Why the session could not be closed
    pub error: MappingError,
    /// The store, as left by the failed close
    pub store: S,
}

impl<S> CloseError<S> {
    /// Recover the store.
    pub fn into_store(self) -> S {
        self.store
    }
}

impl<S> std::fmt::Debug for CloseError<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloseError")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<S> std::fmt::Display for CloseError<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to close mapping session: {}", self.error)
    }
}

impl<S> std::error::Error for CloseError<S> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<TypeError> for MappingError {
    fn from(e: TypeError) -> Self {
        MappingError::InvalidArgument(e.to_string())
    }
}

/// Map a store error from index access, reporting a missing index as an
/// uninitialized mapping.
pub(crate) fn index_error(e: StoreError) -> MappingError {
    match e {
        StoreError::UnknownIndex(index) => MappingError::InvalidArgument(format!(
            "index '{index}' is not initialized"
        )),
        other => MappingError::Store(other),
    }
}

/// Degraded-but-successful outcome of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A kind-based operation ran with exact-type semantics because no
    /// metamodel is configured.
    UnsupportedOperation {
        /// Operation that was requested
        operation: &'static str,
        /// Operation that ran instead
        fallback: &'static str,
    },

    /// Several metaclasses share a name; the first indexed one was used.
    AmbiguousMetaclass {
        /// Name that was looked up
        type_name: String,
        /// Number of matching metaclasses
        candidates: usize,
        /// Metaclass that was returned
        chosen: NodeId,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::UnsupportedOperation {
                operation,
                fallback,
            } => write!(
                f,
                "{operation} requires a metamodel, computed {fallback} instead"
            ),
            Diagnostic::AmbiguousMetaclass {
                type_name,
                candidates,
                chosen,
            } => write!(
                f,
                "{candidates} metaclasses named '{type_name}', using {chosen}"
            ),
        }
    }
}
