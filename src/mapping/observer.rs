//! mapping::observer
//!
//! Optional metrics hooks.
//!
//! # Design
//!
//! A session reports the wall-clock duration of its operations to an
//! injected [`MappingObserver`]. Nothing is recorded when no observer is
//! set. Nested operations are reported individually (a containment
//! `SetReference` also reports its `UpdateContainment`).
//!
//! [`OperationStats`] is the bundled observer: per-operation call counts and
//! total time, shared through an `Arc` so the caller can read it while the
//! session holds it.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use modelgraph::mapping::{MappingOptions, ModelMapping, Operation, OperationStats};
//! use modelgraph::store::MemoryGraph;
//!
//! let stats = Arc::new(OperationStats::new());
//! let options = MappingOptions::default().with_observer(stats.clone());
//! let mut mapping = ModelMapping::with_options(MemoryGraph::new(), options);
//!
//! mapping.create_instance("Foo", Some("urn:ns"), "res").unwrap();
//! assert_eq!(stats.get(Operation::CreateInstance).count, 1);
//! ```

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

/// Operations reported to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    CreateInstance,
    ResolveMetaclass,
    SetReference,
    RemoveReference,
    UpdateContainment,
    SetAttribute,
    Close,
}

/// Receives operation timings from a mapping session.
pub trait MappingObserver: Send + Sync {
    fn record(&self, operation: Operation, elapsed: Duration);
}

/// Count and cumulative duration of one operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationStat {
    pub count: u64,
    pub total: Duration,
}

/// Observer accumulating [`OperationStat`]s.
#[derive(Debug, Default)]
pub struct OperationStats {
    inner: Mutex<BTreeMap<Operation, OperationStat>>,
}

impl OperationStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stats for one operation (zero if never recorded).
    pub fn get(&self, operation: Operation) -> OperationStat {
        self.lock().get(&operation).copied().unwrap_or_default()
    }

    /// Stats for every recorded operation.
    pub fn snapshot(&self) -> BTreeMap<Operation, OperationStat> {
        self.lock().clone()
    }

    /// Forget everything recorded so far.
    pub fn reset(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<Operation, OperationStat>> {
        // Stats stay usable after a panic in another recorder.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl MappingObserver for OperationStats {
    fn record(&self, operation: Operation, elapsed: Duration) {
        let mut stats = self.lock();
        let entry = stats.entry(operation).or_default();
        entry.count += 1;
        entry.total += elapsed;
    }
}
