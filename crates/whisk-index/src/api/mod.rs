//! Package index API response types.
//!
//! The JSON shape follows the PyPI-style per-project endpoint
//! (`{index}/{name}/json`): one document per project listing every
//! release with its files and declared dependencies.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Project metadata response from a package index
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProjectMetadata {
    /// Project name as registered on the index
    pub name: String,
    /// Short description
    pub summary: Option<String>,
    /// All releases, keyed by version string
    pub releases: HashMap<String, ReleaseMetadata>,
}

/// Metadata for a single release of a project
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReleaseMetadata {
    /// Version string
    pub version: String,
    /// Declared dependencies, PEP 508 requirement strings
    #[serde(rename = "requires_dist")]
    pub requires_dist: Option<Vec<String>>,
    /// Downloadable files for this release
    #[serde(default)]
    pub files: Vec<DistFile>,
}

/// One downloadable distribution file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DistFile {
    /// File name, e.g. `pure_python_package-0.2.1-py2.py3-none-any.whl`
    pub filename: String,
    /// Download URL
    pub url: String,
    /// Distribution format
    pub packagetype: PackageType,
    /// Content digests (sha256 preferred)
    #[serde(default)]
    pub digests: Digests,
}

/// Distribution format markers used by PyPI-style indexes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageType {
    BdistWheel,
    Sdist,
    BdistEgg,
}

/// Content digests for a distribution file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Digests {
    pub sha256: Option<String>,
}

impl ProjectMetadata {
    /// Look up a release by its version string
    pub fn release(&self, version: &str) -> Option<&ReleaseMetadata> {
        self.releases.get(version)
    }
}

impl DistFile {
    /// Whether this file is a pre-built wheel
    pub fn is_wheel(&self) -> bool {
        self.packagetype == PackageType::BdistWheel
    }

    /// Whether this file must be built before installing
    pub fn is_source(&self) -> bool {
        matches!(self.packagetype, PackageType::Sdist | PackageType::BdistEgg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_project_document() {
        let raw = serde_json::json!({
            "name": "pure-python-package",
            "summary": "test fixture",
            "releases": {
                "0.2.1": {
                    "version": "0.2.1",
                    "requires_dist": ["implicit_dependency"],
                    "files": [{
                        "filename": "pure_python_package-0.2.1-py2.py3-none-any.whl",
                        "url": "https://index.test/packages/pure_python_package-0.2.1-py2.py3-none-any.whl",
                        "packagetype": "bdist_wheel",
                        "digests": {"sha256": "abc123"}
                    }]
                }
            }
        });

        let project: ProjectMetadata = serde_json::from_value(raw).unwrap();
        assert_eq!(project.name, "pure-python-package");
        let release = project.release("0.2.1").unwrap();
        assert_eq!(release.requires_dist.as_deref(), Some(&["implicit_dependency".to_string()][..]));
        assert!(release.files[0].is_wheel());
        assert!(!release.files[0].is_source());
    }

    #[test]
    fn test_sdist_packagetype() {
        let raw = serde_json::json!({
            "filename": "slow_package-1.0.tar.gz",
            "url": "https://index.test/packages/slow_package-1.0.tar.gz",
            "packagetype": "sdist"
        });
        let file: DistFile = serde_json::from_value(raw).unwrap();
        assert!(file.is_source());
        assert!(file.digests.sha256.is_none());
    }
}
