//! Resolved distribution candidates.

use std::fmt;

use super::name::PackageName;
use super::version::Version;

/// Kind of distribution a requirement resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistKind {
    /// Pre-built wheel already in the local wheel cache
    CachedWheel,
    /// Pre-built wheel from an index (or a direct URL)
    Wheel,
    /// Source distribution; built into a wheel before install
    Sdist,
    /// Editable/local source tree
    Editable,
}

/// A concrete (name, version, location) chosen to satisfy a
/// requirement. Exactly one exists per distinct package name in a
/// resolved graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCandidate {
    /// Project name as declared by the distribution
    pub name: String,
    pub canonical: PackageName,
    pub version: Version,
    /// URL or filesystem path of the distribution
    pub location: String,
    pub kind: DistKind,
}

impl ResolvedCandidate {
    pub fn new(name: &str, version: Version, location: String, kind: DistKind) -> Self {
        Self {
            name: name.to_string(),
            canonical: PackageName::new(name),
            version,
            location,
            kind,
        }
    }

    /// Whether installing this candidate requires a wheel build first
    pub fn needs_build(&self) -> bool {
        matches!(self.kind, DistKind::Sdist)
    }
}

impl fmt::Display for ResolvedCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=={}", self.name, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_candidate_display() {
        let candidate = ResolvedCandidate::new(
            "pure-python-package",
            Version::from_str("0.2.1").unwrap(),
            "https://index/packages/pure_python_package-0.2.1-py3-none-any.whl".to_string(),
            DistKind::Wheel,
        );
        assert_eq!(candidate.to_string(), "pure-python-package==0.2.1");
        assert!(!candidate.needs_build());
    }

    #[test]
    fn test_sdist_needs_build() {
        let candidate = ResolvedCandidate::new(
            "slow-package",
            Version::from_str("1.0").unwrap(),
            "https://index/packages/slow-package-1.0.tar.gz".to_string(),
            DistKind::Sdist,
        );
        assert!(candidate.needs_build());
    }
}
