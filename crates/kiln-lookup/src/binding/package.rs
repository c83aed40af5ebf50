//! Package bindings

use super::{PackageId, TypeId};
use crate::names::CompoundName;
use rustc_hash::{FxHashMap, FxHashSet};

/// A package in the package tree rooted at the default package
#[derive(Debug, Clone)]
pub struct PackageBinding {
    /// Fully qualified name; empty for the default package
    pub compound_name: CompoundName,
    /// Parent package, `None` for top-level packages and the default package
    pub parent: Option<PackageId>,
    pub(crate) known_packages: FxHashMap<String, PackageId>,
    pub(crate) known_types: FxHashMap<String, TypeId>,
    /// Simple names already known not to be types of this package
    pub(crate) missing_types: FxHashSet<String>,
}

impl PackageBinding {
    pub(crate) fn new(compound_name: CompoundName, parent: Option<PackageId>) -> Self {
        PackageBinding {
            compound_name,
            parent,
            known_packages: FxHashMap::default(),
            known_types: FxHashMap::default(),
            missing_types: FxHashSet::default(),
        }
    }

    /// Default (unnamed) package
    pub fn is_default(&self) -> bool {
        self.compound_name.is_empty()
    }

    /// Subpackage registered under a simple name
    pub fn known_package(&self, name: &str) -> Option<PackageId> {
        self.known_packages.get(name).copied()
    }

    /// Type registered under a simple name (may be a placeholder)
    pub fn known_type(&self, name: &str) -> Option<TypeId> {
        self.known_types.get(name).copied()
    }

    /// Number of registered types
    pub fn type_count(&self) -> usize {
        self.known_types.len()
    }
}
