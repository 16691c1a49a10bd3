//! Distribution metadata introspection.
//!
//! Declared dependencies are read through the `DistInspector` capability
//! rather than by type-checking on source format: one variant reads
//! wheel core metadata, one extracts and reads a source distribution,
//! one reads an editable source tree in place.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use whisk_core::error::WhiskError;
use whisk_core::types::{PackageName, Requirement, Version};

use crate::IndexResult;

/// Capability interface: what a distribution says about itself
pub trait DistInspector {
    /// Authoritative project name and version
    fn project(&self) -> IndexResult<(String, Version)>;

    /// Declared runtime dependencies
    fn declared_dependencies(&self) -> IndexResult<Vec<Requirement>>;
}

/// Core metadata fields shared by every distribution format
#[derive(Debug, Clone)]
struct CoreMetadata {
    name: String,
    version: Version,
    requires: Vec<String>,
}

/// Inspector over wheel `METADATA` text
#[derive(Debug)]
pub struct WheelMetadataInspector {
    metadata: CoreMetadata,
}

impl WheelMetadataInspector {
    /// Parse the core-metadata document found inside a wheel
    pub fn from_text(text: &str) -> IndexResult<Self> {
        Ok(Self {
            metadata: parse_core_metadata(text, "METADATA")?,
        })
    }
}

impl DistInspector for WheelMetadataInspector {
    fn project(&self) -> IndexResult<(String, Version)> {
        Ok((self.metadata.name.clone(), self.metadata.version.clone()))
    }

    fn declared_dependencies(&self) -> IndexResult<Vec<Requirement>> {
        requirements_from_entries(&self.metadata.requires, &[])
    }
}

/// Inspector over an extracted source distribution
#[derive(Debug)]
pub struct SdistInspector {
    metadata: CoreMetadata,
    // Keeps the extraction directory alive for the inspector's lifetime
    _extract_dir: tempfile::TempDir,
}

impl SdistInspector {
    /// Extract an sdist archive and read its build metadata
    pub fn extract(archive: &[u8]) -> IndexResult<Self> {
        let extract_dir = tempfile::tempdir()
            .map_err(|e| WhiskError::io("Failed to create extraction directory".to_string(), e))?;

        whisk_cache::extract_sdist(std::io::Cursor::new(archive), extract_dir.path())?;
        let metadata = read_source_tree(extract_dir.path())?;

        Ok(Self {
            metadata,
            _extract_dir: extract_dir,
        })
    }
}

impl DistInspector for SdistInspector {
    fn project(&self) -> IndexResult<(String, Version)> {
        Ok((self.metadata.name.clone(), self.metadata.version.clone()))
    }

    fn declared_dependencies(&self) -> IndexResult<Vec<Requirement>> {
        requirements_from_entries(&self.metadata.requires, &[])
    }
}

/// Inspector over an editable/local source tree, read in place
#[derive(Debug)]
pub struct EditableInspector {
    root: PathBuf,
}

impl EditableInspector {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }
}

impl DistInspector for EditableInspector {
    fn project(&self) -> IndexResult<(String, Version)> {
        let metadata = read_source_tree(&self.root)?;
        Ok((metadata.name, metadata.version))
    }

    fn declared_dependencies(&self) -> IndexResult<Vec<Requirement>> {
        let metadata = read_source_tree(&self.root)?;
        requirements_from_entries(&metadata.requires, &[])
    }
}

/// Parse one `Requires-Dist`-style entry, honoring `extra == "..."`
/// marker guards. Markers other than extra guards are treated as
/// satisfied. Returns None for entries filtered out by their guard.
pub fn parse_requires_entry(
    entry: &str,
    active_extras: &[String],
) -> IndexResult<Option<Requirement>> {
    let (requirement_part, marker) = match entry.split_once(';') {
        Some((req, marker)) => (req.trim(), Some(marker.trim())),
        None => (entry.trim(), None),
    };

    if requirement_part.is_empty() {
        return Ok(None);
    }

    if let Some(marker) = marker {
        if let Some(required_extra) = extra_guard(marker) {
            let wanted = PackageName::new(&required_extra);
            if !active_extras
                .iter()
                .any(|extra| PackageName::new(extra) == wanted)
            {
                return Ok(None);
            }
        }
    }

    Requirement::parse(requirement_part)
        .map(Some)
        .map_err(|message| WhiskError::RequirementParse {
            file: "<metadata>".to_string(),
            line: 0,
            message,
        })
}

fn requirements_from_entries(
    entries: &[String],
    active_extras: &[String],
) -> IndexResult<Vec<Requirement>> {
    let mut requirements = Vec::new();
    for entry in entries {
        if let Some(requirement) = parse_requires_entry(entry, active_extras)? {
            requirements.push(requirement);
        }
    }
    Ok(requirements)
}

/// Extract the extra name from a marker like `extra == "security"`
fn extra_guard(marker: &str) -> Option<String> {
    let after = marker.split("extra").nth(1)?;
    let after = after.trim_start();
    let after = after.strip_prefix("==")?.trim_start();
    let quote = after.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let rest = &after[1..];
    let end = rest.find(quote)?;
    Some(rest[..end].to_string())
}

/// Parse the RFC 822-style header block of PKG-INFO / METADATA
fn parse_core_metadata(text: &str, source: &str) -> IndexResult<CoreMetadata> {
    let mut name = None;
    let mut version = None;
    let mut requires = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            // Headers end at the first blank line; the description
            // body follows
            break;
        }
        if let Some(value) = line.strip_prefix("Name:") {
            name = Some(value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("Version:") {
            version = Some(value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("Requires-Dist:") {
            requires.push(value.trim().to_string());
        }
    }

    let missing = |field: &str| WhiskError::RequirementParse {
        file: source.to_string(),
        line: 0,
        message: format!("metadata is missing the {} header", field),
    };

    let name = name.ok_or_else(|| missing("Name"))?;
    let version_str = version.ok_or_else(|| missing("Version"))?;
    let version = Version::from_str(&version_str).map_err(|e| WhiskError::RequirementParse {
        file: source.to_string(),
        line: 0,
        message: e.to_string(),
    })?;

    Ok(CoreMetadata {
        name,
        version,
        requires,
    })
}

/// Read PKG-INFO (plus egg-info requires.txt) from a source tree.
/// Sdists wrap their content in a `name-version/` directory; a single
/// wrapping directory is descended into.
fn read_source_tree(root: &Path) -> IndexResult<CoreMetadata> {
    let root = descend_single_dir(root);

    let pkg_info_path = locate_pkg_info(&root).ok_or_else(|| WhiskError::RequirementParse {
        file: root.display().to_string(),
        line: 0,
        message: "no PKG-INFO found in source tree".to_string(),
    })?;

    let text = fs::read_to_string(&pkg_info_path)
        .map_err(|e| WhiskError::io(format!("Failed to read {}", pkg_info_path.display()), e))?;
    let mut metadata = parse_core_metadata(&text, "PKG-INFO")?;

    // Older build metadata declares dependencies in
    // egg-info/requires.txt instead of Requires-Dist headers
    if metadata.requires.is_empty() {
        if let Some(requires_txt) = locate_requires_txt(&root) {
            let text = fs::read_to_string(&requires_txt).map_err(|e| {
                WhiskError::io(format!("Failed to read {}", requires_txt.display()), e)
            })?;
            metadata.requires = parse_requires_txt(&text);
        }
    }

    Ok(metadata)
}

/// Base-section entries of a requires.txt (extras sections excluded)
fn parse_requires_txt(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .take_while(|line| !line.starts_with('['))
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

pub(crate) fn descend_single_dir(root: &Path) -> PathBuf {
    if root.join("PKG-INFO").exists() {
        return root.to_path_buf();
    }
    let entries: Vec<PathBuf> = fs::read_dir(root)
        .into_iter()
        .flatten()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .collect();
    match entries.as_slice() {
        [single] if single.is_dir() => single.clone(),
        _ => root.to_path_buf(),
    }
}

fn locate_pkg_info(root: &Path) -> Option<PathBuf> {
    let direct = root.join("PKG-INFO");
    if direct.exists() {
        return Some(direct);
    }
    egg_info_dir(root).map(|dir| dir.join("PKG-INFO")).filter(|p| p.exists())
}

fn locate_requires_txt(root: &Path) -> Option<PathBuf> {
    egg_info_dir(root)
        .map(|dir| dir.join("requires.txt"))
        .filter(|p| p.exists())
}

fn egg_info_dir(root: &Path) -> Option<PathBuf> {
    fs::read_dir(root)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .find(|path| {
            path.is_dir()
                && path
                    .extension()
                    .map(|ext| ext == "egg-info")
                    .unwrap_or(false)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const METADATA: &str = "\
Metadata-Version: 2.1
Name: dependant_package
Version: 1
Requires-Dist: implicit_dependency
Requires-Dist: many-versions-package
Requires-Dist: pure-python-package>=0.2.1
Requires-Dist: pytest; extra == \"testing\"

A package with dependencies.
";

    #[test]
    fn test_wheel_metadata_inspector() {
        let inspector = WheelMetadataInspector::from_text(METADATA).unwrap();

        let (name, version) = inspector.project().unwrap();
        assert_eq!(name, "dependant_package");
        assert_eq!(version, Version::from_str("1").unwrap());

        let deps = inspector.declared_dependencies().unwrap();
        // The extra-guarded entry is excluded
        assert_eq!(deps.len(), 3);
        assert_eq!(deps[2].display_bare(), "pure-python-package>=0.2.1");
    }

    #[test]
    fn test_requires_entry_extra_guard() {
        let entry = "pytest>=7; extra == \"testing\"";
        assert!(parse_requires_entry(entry, &[]).unwrap().is_none());

        let active = vec!["testing".to_string()];
        let requirement = parse_requires_entry(entry, &active).unwrap().unwrap();
        assert_eq!(requirement.display_bare(), "pytest>=7");
    }

    #[test]
    fn test_requires_entry_other_markers_are_satisfied() {
        let entry = "typing-extensions; python_version < \"3.10\"";
        let requirement = parse_requires_entry(entry, &[]).unwrap().unwrap();
        assert_eq!(requirement.name, "typing-extensions");
    }

    #[test]
    fn test_metadata_missing_headers() {
        assert!(WheelMetadataInspector::from_text("Name: pkg\n").is_err());
        assert!(WheelMetadataInspector::from_text("Version: 1\n").is_err());
    }

    #[test]
    fn test_editable_inspector_reads_tree() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("PKG-INFO"),
            "Name: conflicting_package\nVersion: 1\n",
        )
        .unwrap();
        let egg_info = dir.path().join("conflicting_package.egg-info");
        fs::create_dir(&egg_info).unwrap();
        fs::write(
            egg_info.join("requires.txt"),
            "many_versions_package<2\n\n[testing]\npytest\n",
        )
        .unwrap();

        let inspector = EditableInspector::new(dir.path());
        let (name, version) = inspector.project().unwrap();
        assert_eq!(name, "conflicting_package");
        assert_eq!(version, Version::from_str("1").unwrap());

        let deps = inspector.declared_dependencies().unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].display_bare(), "many_versions_package<2");
    }

    #[test]
    fn test_sdist_inspector_descends_wrapper_dir() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let mut archive = Vec::new();
        {
            let encoder = GzEncoder::new(&mut archive, Compression::default());
            let mut builder = tar::Builder::new(encoder);

            let pkg_info = "Name: slow_package\nVersion: 1.0\nRequires-Dist: helper>=2\n";
            let mut header = tar::Header::new_gnu();
            header.set_path("slow_package-1.0/PKG-INFO").unwrap();
            header.set_size(pkg_info.len() as u64);
            header.set_cksum();
            builder.append(&header, pkg_info.as_bytes()).unwrap();
            builder.finish().unwrap();
        }

        let inspector = SdistInspector::extract(&archive).unwrap();
        let (name, version) = inspector.project().unwrap();
        assert_eq!(name, "slow_package");
        assert_eq!(version, Version::from_str("1.0").unwrap());

        let deps = inspector.declared_dependencies().unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].display_bare(), "helper>=2");
    }
}
