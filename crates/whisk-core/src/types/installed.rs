//! Installed-environment state.
//!
//! The target environment's package metadata is the source of truth for
//! conflict comparisons; whisk only ever reads it.

use std::collections::HashMap;

use super::name::PackageName;
use super::version::Version;

/// A package currently present in the target environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    /// Name as recorded in the dist-info metadata
    pub name: String,
    pub canonical: PackageName,
    pub version: Version,
    /// Install location, e.g. `venv/lib/python3.11/site-packages`
    pub location: String,
}

impl InstalledPackage {
    pub fn new(name: &str, version: Version, location: String) -> Self {
        Self {
            name: name.to_string(),
            canonical: PackageName::new(name),
            version,
            location,
        }
    }
}

/// Read-only mapping from canonical name to installed package
#[derive(Debug, Clone, Default)]
pub struct EnvironmentState {
    packages: HashMap<PackageName, InstalledPackage>,
}

impl EnvironmentState {
    pub fn new(packages: Vec<InstalledPackage>) -> Self {
        let packages = packages
            .into_iter()
            .map(|pkg| (pkg.canonical.clone(), pkg))
            .collect();
        Self { packages }
    }

    pub fn get(&self, name: &PackageName) -> Option<&InstalledPackage> {
        self.packages.get(name)
    }

    pub fn contains(&self, name: &PackageName) -> bool {
        self.packages.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstalledPackage> {
        self.packages.values()
    }
}
