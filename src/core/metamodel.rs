//! core::metamodel
//!
//! Metamodel information that the graph does not store.
//!
//! # Overview
//!
//! The graph records which metaclass each instance belongs to, but not the
//! type hierarchy between metaclasses nor which metaclasses are abstract.
//! A [`MetamodelDescriptor`] supplies that information to kind-based lookup
//! and attribute defaulting.
//!
//! [`Metamodel`] is the bundled descriptor. It is plain data and can be
//! loaded from TOML:
//!
//! ```toml
//! name = "java"
//! ns_uri = "http://example.org/java"
//!
//! [classes.NamedElement]
//! abstract = true
//!
//! [classes.ClassDeclaration]
//! supertypes = ["NamedElement"]
//! ```
//!
//! # Invariants
//!
//! - Every declared supertype is itself declared
//! - The supertype relation is acyclic

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{validate_type_name, TypeError};

/// Errors from loading or validating a metamodel.
#[derive(Debug, Error)]
pub enum MetamodelError {
    #[error("failed to read metamodel file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse metamodel: {0}")]
    ParseError(String),

    #[error("class '{class}' declares unknown supertype '{supertype}'")]
    UnknownSupertype { class: String, supertype: String },

    #[error("type hierarchy contains a cycle through '{0}'")]
    Cycle(String),

    #[error(transparent)]
    InvalidTypeName(#[from] TypeError),
}

/// Read access to a type hierarchy.
///
/// Implementors provide the direct relations; the transitive queries have
/// default implementations.
pub trait MetamodelDescriptor: std::fmt::Debug {
    /// Name of the metamodel, used in diagnostics.
    fn name(&self) -> &str;

    /// Namespace URI shared by the metamodel's classes.
    fn ns_uri(&self) -> &str;

    /// Whether `type_name` is a class of this metamodel.
    fn contains_type(&self, type_name: &str) -> bool;

    /// Whether `type_name` is abstract. Unknown types are reported as concrete.
    fn is_abstract(&self, type_name: &str) -> bool;

    /// Direct supertypes of `type_name`.
    fn supertypes(&self, type_name: &str) -> Vec<String>;

    /// Direct subtypes of `type_name`.
    fn subtypes(&self, type_name: &str) -> Vec<String>;

    /// All supertypes of `type_name`, nearest first, without duplicates.
    fn all_supertypes(&self, type_name: &str) -> Vec<String> {
        let mut result = Vec::new();
        let mut seen = HashSet::new();
        let mut queue: VecDeque<String> = self.supertypes(type_name).into();

        while let Some(current) = queue.pop_front() {
            if seen.insert(current.clone()) {
                queue.extend(self.supertypes(&current));
                result.push(current);
            }
        }

        result
    }

    /// Concrete types conforming to `type_name`, including `type_name`
    /// itself when it is concrete.
    ///
    /// Breadth-first from `type_name`, so closer subtypes come first.
    fn concrete_subtypes(&self, type_name: &str) -> Vec<String> {
        let mut result = Vec::new();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([type_name.to_string()]);

        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if !self.is_abstract(&current) {
                result.push(current.clone());
            }
            queue.extend(self.subtypes(&current));
        }

        result
    }
}

/// Declaration of a single class.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ClassDecl {
    /// Abstract classes have no direct instances.
    #[serde(rename = "abstract")]
    pub is_abstract: bool,

    /// Direct supertypes.
    pub supertypes: Vec<String>,
}

/// A metamodel held in memory.
///
/// # Example
///
/// ```
/// use modelgraph::core::metamodel::{Metamodel, MetamodelDescriptor};
///
/// let mm = Metamodel::new("shapes", "http://example.org/shapes")
///     .with_class("Shape", true, &[])
///     .with_class("Circle", false, &["Shape"])
///     .with_class("Square", false, &["Shape"]);
///
/// assert_eq!(mm.concrete_subtypes("Shape"), vec!["Circle", "Square"]);
/// assert_eq!(mm.all_supertypes("Circle"), vec!["Shape"]);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Metamodel {
    /// Metamodel name
    pub name: String,

    /// Namespace URI of the metamodel's classes
    pub ns_uri: String,

    /// Declared classes by name
    #[serde(default)]
    pub classes: BTreeMap<String, ClassDecl>,
}

impl Metamodel {
    /// Create an empty metamodel.
    pub fn new(name: impl Into<String>, ns_uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ns_uri: ns_uri.into(),
            classes: BTreeMap::new(),
        }
    }

    /// Add a class declaration, replacing any previous one with the same name.
    pub fn with_class(mut self, name: &str, is_abstract: bool, supertypes: &[&str]) -> Self {
        self.classes.insert(
            name.to_string(),
            ClassDecl {
                is_abstract,
                supertypes: supertypes.iter().map(|s| s.to_string()).collect(),
            },
        );
        self
    }

    /// Parse and validate a metamodel from TOML.
    pub fn from_toml_str(contents: &str) -> Result<Self, MetamodelError> {
        let metamodel: Metamodel =
            toml::from_str(contents).map_err(|e| MetamodelError::ParseError(e.to_string()))?;
        metamodel.validate()?;
        Ok(metamodel)
    }

    /// Load and validate a metamodel from a TOML file.
    pub fn load(path: &Path) -> Result<Self, MetamodelError> {
        let contents = fs::read_to_string(path).map_err(|e| MetamodelError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Check names, supertype references, and acyclicity.
    pub fn validate(&self) -> Result<(), MetamodelError> {
        for (name, decl) in &self.classes {
            validate_type_name(name)?;
            for supertype in &decl.supertypes {
                if !self.classes.contains_key(supertype) {
                    return Err(MetamodelError::UnknownSupertype {
                        class: name.clone(),
                        supertype: supertype.clone(),
                    });
                }
            }
        }

        if let Some(class) = self.find_cycle() {
            return Err(MetamodelError::Cycle(class));
        }
        Ok(())
    }

    /// Returns `Some(class)` if a supertype cycle passes through that class.
    fn find_cycle(&self) -> Option<String> {
        let mut visited = HashSet::new();
        let mut path = HashSet::new();

        for class in self.classes.keys() {
            if self.has_cycle_from(class, &mut visited, &mut path) {
                return Some(class.clone());
            }
        }
        None
    }

    fn has_cycle_from<'a>(
        &'a self,
        class: &'a str,
        visited: &mut HashSet<&'a str>,
        path: &mut HashSet<&'a str>,
    ) -> bool {
        if path.contains(class) {
            return true;
        }
        if !visited.insert(class) {
            return false;
        }
        path.insert(class);

        if let Some(decl) = self.classes.get(class) {
            for supertype in &decl.supertypes {
                if self.has_cycle_from(supertype, visited, path) {
                    return true;
                }
            }
        }

        path.remove(class);
        false
    }
}

impl MetamodelDescriptor for Metamodel {
    fn name(&self) -> &str {
        &self.name
    }

    fn ns_uri(&self) -> &str {
        &self.ns_uri
    }

    fn contains_type(&self, type_name: &str) -> bool {
        self.classes.contains_key(type_name)
    }

    fn is_abstract(&self, type_name: &str) -> bool {
        self.classes
            .get(type_name)
            .map(|c| c.is_abstract)
            .unwrap_or(false)
    }

    fn supertypes(&self, type_name: &str) -> Vec<String> {
        self.classes
            .get(type_name)
            .map(|c| c.supertypes.clone())
            .unwrap_or_default()
    }

    fn subtypes(&self, type_name: &str) -> Vec<String> {
        self.classes
            .iter()
            .filter(|(_, decl)| decl.supertypes.iter().any(|s| s == type_name))
            .map(|(name, _)| name.clone())
            .collect()
    }
}
