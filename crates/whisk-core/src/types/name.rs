//! Canonical package names.
//!
//! PyPI treats `Foo_Bar`, `foo-bar` and `foo.bar` as the same project;
//! a PackageName holds the canonical (PEP 503) form and is the key used
//! everywhere packages are compared or deduplicated.

use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};
use std::fmt;

/// Canonicalized package name: lowercase, runs of `-`, `_`, `.`
/// collapsed to a single `-`.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Archive,
    Deserialize,
    Serialize,
    SerdeDeserialize,
    SerdeSerialize,
)]
#[archive(check_bytes)]
pub struct PackageName(String);

impl PackageName {
    /// Canonicalize a raw project name
    pub fn new(raw: &str) -> Self {
        let mut canonical = String::with_capacity(raw.len());
        let mut last_was_sep = false;
        for ch in raw.trim().chars() {
            if ch == '-' || ch == '_' || ch == '.' {
                if !last_was_sep && !canonical.is_empty() {
                    canonical.push('-');
                }
                last_was_sep = true;
            } else {
                canonical.extend(ch.to_lowercase());
                last_was_sep = false;
            }
        }
        // A trailing separator never survives canonicalization
        if canonical.ends_with('-') {
            canonical.pop();
        }
        Self(canonical)
    }

    /// The canonical form as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PackageName {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalization() {
        assert_eq!(PackageName::new("Many_Versions.Package").as_str(), "many-versions-package");
        assert_eq!(PackageName::new("dependant_package").as_str(), "dependant-package");
        assert_eq!(PackageName::new("simple").as_str(), "simple");
        assert_eq!(PackageName::new("a-_-b").as_str(), "a-b");
    }

    #[test]
    fn test_equivalent_spellings_collide() {
        let a = PackageName::new("pure_python_package");
        let b = PackageName::new("Pure-Python.Package");
        assert_eq!(a, b);
    }

    #[test]
    fn test_edge_spellings() {
        assert_eq!(PackageName::new("-leading").as_str(), "leading");
        assert_eq!(PackageName::new("trailing_").as_str(), "trailing");
        assert_eq!(PackageName::new("  spaced  ").as_str(), "spaced");
    }
}
