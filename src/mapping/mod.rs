//! mapping
//!
//! Object model to property graph mapping.
//!
//! # Architecture
//!
//! A [`ModelMapping`] is one mapping session over a [`GraphStore`]. It owns
//! the store, the set of instances still waiting for a container, and the
//! options that govern metamodel-aware behavior. Operations are split by
//! concern:
//!
//! - [`metaclass`] - Metaclass registry: per-type index nodes
//! - [`instance`] - Instance creation and type queries
//! - [`reference`] - References, containment, ordered edge positions
//! - [`attribute`] - Attribute access with default-value rules
//! - [`finalize`] - Attaching unrooted instances to resource roots
//! - [`observer`] - Optional metrics hooks
//!
//! # Graph Layout
//!
//! ```text
//!  instance ──kyanosInstanceOf──▶ metaclass (id "<type>@<nsURI>", indexed by name)
//!  child ──eContainer{containingFeature}──▶ parent
//!  parent ──<feature>{position}──▶ child            parent["<feature>:size"]
//!  resource root ──eContents{position}──▶ top-level instance
//! ```
//!
//! # Invariants
//!
//! - Every instance has exactly one `kyanosInstanceOf` edge
//! - Every instance has at most one `eContainer` edge
//! - The `<feature>` edges of a node carry positions `0..size`, and the size
//!   counter is absent when the feature is empty
//! - Metaclass nodes are unique per (name, nsURI)
//!
//! # Concurrency
//!
//! A session is single-threaded. Every operation runs to completion against
//! the store before returning.
//!
//! # Example
//!
//! ```
//! use modelgraph::mapping::ModelMapping;
//! use modelgraph::store::MemoryGraph;
//!
//! let mut mapping = ModelMapping::new(MemoryGraph::new());
//! let pkg = mapping.create_instance("Package", Some("urn:java"), "model.xmi").unwrap();
//! let class = mapping.create_instance("Class", Some("urn:java"), "model.xmi").unwrap();
//!
//! mapping.set_reference(&pkg, "ownedElements", Some("package"), &class, true).unwrap();
//! assert_eq!(mapping.get_parent(&class).unwrap(), Some(pkg.clone()));
//!
//! // `pkg` has no container, so closing attaches it to the resource root.
//! let graph = mapping.close().unwrap();
//! # let _ = graph;
//! ```

pub mod attribute;
pub mod error;
pub mod finalize;
pub mod instance;
pub mod metaclass;
pub mod observer;
pub mod pending;
pub mod reference;

pub use attribute::AttributeDefaults;
pub use error::{CloseError, Diagnostic, MappingError};
pub use observer::{MappingObserver, Operation, OperationStat, OperationStats};
pub use pending::PendingSet;

use std::cell::RefCell;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::core::config::Config;
use crate::core::labels::{DEFAULT_ROOT_NAMESPACE, DEFAULT_ROOT_TYPE, METACLASS_INDEX};
use crate::core::metamodel::{Metamodel, MetamodelDescriptor};
use crate::core::types::validate_type_name;
use crate::store::GraphStore;

/// Options for a mapping session.
#[derive(Clone)]
pub struct MappingOptions {
    /// Type hierarchy used by kind queries and attribute defaults
    pub metamodel: Option<Arc<dyn MetamodelDescriptor>>,
    /// Attribute default-value rules
    pub attribute_defaults: AttributeDefaults,
    /// Type of resource-root nodes
    pub root_type: String,
    /// Namespace URI of the root type
    pub root_namespace: String,
    /// Receives operation timings
    pub observer: Option<Arc<dyn MappingObserver>>,
}

impl Default for MappingOptions {
    fn default() -> Self {
        Self {
            metamodel: None,
            attribute_defaults: AttributeDefaults::standard(),
            root_type: DEFAULT_ROOT_TYPE.to_string(),
            root_namespace: DEFAULT_ROOT_NAMESPACE.to_string(),
            observer: None,
        }
    }
}

impl std::fmt::Debug for MappingOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappingOptions")
            .field("metamodel", &self.metamodel)
            .field("attribute_defaults", &self.attribute_defaults)
            .field("root_type", &self.root_type)
            .field("root_namespace", &self.root_namespace)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl MappingOptions {
    /// Build options from configuration.
    ///
    /// Loads the configured metamodel file, and adds the configured attribute
    /// rules on top of the standard ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the metamodel file cannot be loaded or the root
    /// type is invalid.
    pub fn from_config(config: &Config) -> Result<Self, MappingError> {
        validate_type_name(config.root_type())?;

        let metamodel = match config.metamodel_path() {
            Some(path) => {
                let metamodel = Metamodel::load(&path)?;
                tracing::debug!(path = %path.display(), name = %metamodel.name, "Loaded metamodel");
                Some(Arc::new(metamodel) as Arc<dyn MetamodelDescriptor>)
            }
            None => None,
        };

        let mut attribute_defaults = AttributeDefaults::standard();
        attribute_defaults.extend(config.read_defaults(), config.absent_write());

        Ok(Self {
            metamodel,
            attribute_defaults,
            root_type: config.root_type().to_string(),
            root_namespace: config.root_namespace().to_string(),
            observer: None,
        })
    }

    /// Load configuration from the usual locations and build options from it.
    ///
    /// `explicit` takes precedence over the search order of [`Config::load`].
    pub fn load(explicit: Option<&Path>) -> Result<Self, MappingError> {
        let config = Config::load(explicit)?;
        Self::from_config(&config)
    }

    /// Use `metamodel` for kind queries and attribute defaults.
    pub fn with_metamodel(mut self, metamodel: impl MetamodelDescriptor + 'static) -> Self {
        self.metamodel = Some(Arc::new(metamodel));
        self
    }

    /// Replace the attribute default rules.
    pub fn with_attribute_defaults(mut self, defaults: AttributeDefaults) -> Self {
        self.attribute_defaults = defaults;
        self
    }

    /// Use `root_type` in `root_namespace` for resource roots.
    pub fn with_root_type(
        mut self,
        root_type: impl Into<String>,
        root_namespace: impl Into<String>,
    ) -> Self {
        self.root_type = root_type.into();
        self.root_namespace = root_namespace.into();
        self
    }

    /// Report operation timings to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn MappingObserver>) -> Self {
        self.observer = Some(observer);
        self
    }
}

/// A mapping session over a graph store.
pub struct ModelMapping<S: GraphStore> {
    store: S,
    options: MappingOptions,
    pending: PendingSet,
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl<S: GraphStore> ModelMapping<S> {
    /// Start a session with default options.
    pub fn new(store: S) -> Self {
        Self::with_options(store, MappingOptions::default())
    }

    /// Start a session.
    ///
    /// Creates the metaclass index in `store` if it does not exist yet.
    pub fn with_options(mut store: S, options: MappingOptions) -> Self {
        if !store.has_index(METACLASS_INDEX) {
            tracing::debug!(index = METACLASS_INDEX, "Creating metaclass index");
            store.create_index(METACLASS_INDEX);
        }
        Self {
            store,
            options,
            pending: PendingSet::new(),
            diagnostics: RefCell::new(Vec::new()),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The session options.
    pub fn options(&self) -> &MappingOptions {
        &self.options
    }

    /// The configured metamodel, if any.
    pub fn metamodel(&self) -> Option<&dyn MetamodelDescriptor> {
        self.options.metamodel.as_deref()
    }

    /// Instances still waiting for a container.
    pub fn pending(&self) -> &PendingSet {
        &self.pending
    }

    /// Distinct diagnostics recorded so far, in first-seen order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Remove and return the recorded diagnostics.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.get_mut().drain(..).collect()
    }

    /// Log and record a diagnostic.
    ///
    /// Each distinct diagnostic is recorded and logged at its own level once;
    /// repeats are only traced.
    fn diagnose(&self, diagnostic: Diagnostic) {
        let mut recorded = self.diagnostics.borrow_mut();
        if recorded.contains(&diagnostic) {
            tracing::trace!(%diagnostic, "Repeated diagnostic");
            return;
        }
        match &diagnostic {
            Diagnostic::UnsupportedOperation { .. } => {
                tracing::warn!(%diagnostic, "Degraded operation")
            }
            Diagnostic::AmbiguousMetaclass { .. } => {
                tracing::debug!(%diagnostic, "Ambiguous metaclass lookup")
            }
        }
        recorded.push(diagnostic);
    }

    /// Run `f`, reporting its duration to the observer.
    fn timed<T>(
        &mut self,
        operation: Operation,
        f: impl FnOnce(&mut Self) -> Result<T, MappingError>,
    ) -> Result<T, MappingError> {
        let start = self.options.observer.as_ref().map(|_| Instant::now());
        let result = f(self);
        if let (Some(observer), Some(start)) = (&self.options.observer, start) {
            observer.record(operation, start.elapsed());
        }
        result
    }
}
