//! Candidate selection policy.
//!
//! Highest version satisfying the constraint wins; among files of that
//! version a platform-compatible wheel beats a source distribution.
//! Stable releases are preferred; pre-releases are only selected when
//! nothing stable matches.

use std::collections::BTreeMap;
use std::str::FromStr;

use whisk_core::error::WhiskError;
use whisk_core::types::{PlatformTags, Requirement, Version, WheelFilename};

use crate::api::{DistFile, ProjectMetadata};
use crate::IndexResult;

/// Chooses the best distribution file for a requirement
#[derive(Debug, Clone)]
pub struct CandidateSelector {
    tags: PlatformTags,
}

/// The selected distribution for a requirement
#[derive(Debug, Clone)]
pub struct SelectedDist {
    pub version: Version,
    pub file: DistFile,
    /// True when the file is a pre-built, platform-compatible wheel
    pub is_wheel: bool,
}

impl CandidateSelector {
    pub fn new(tags: PlatformTags) -> Self {
        Self { tags }
    }

    /// Select the best matching distribution from a project document
    pub fn select(
        &self,
        requirement: &Requirement,
        project: &ProjectMetadata,
    ) -> IndexResult<SelectedDist> {
        let versions = Self::indexed_versions(project);

        let stable = versions
            .iter()
            .rev()
            .filter(|(version, _)| !version.is_prerelease());
        let any = versions.iter().rev();

        // Stable releases first, pre-releases only as a fallback
        for (version, release_key) in stable.chain(any) {
            if !requirement.specifiers.matches(version) {
                continue;
            }
            let Some(release) = project.releases.get(release_key.as_str()) else {
                continue;
            };
            if let Some(selected) = self.best_file(version, &release.files) {
                return Ok(selected);
            }
        }

        Err(WhiskError::NoMatchingDistribution {
            name: requirement.name.clone(),
            constraint: requirement.specifiers.to_string(),
        })
    }

    /// All parseable versions of a project, ascending, with their
    /// release keys
    fn indexed_versions(project: &ProjectMetadata) -> BTreeMap<Version, String> {
        project
            .releases
            .keys()
            .filter_map(|key| {
                Version::from_str(key)
                    .ok()
                    .map(|version| (version, key.clone()))
            })
            .collect()
    }

    /// Prefer a compatible wheel; fall back to a source distribution
    fn best_file(&self, version: &Version, files: &[DistFile]) -> Option<SelectedDist> {
        let compatible_wheel = files.iter().find(|file| {
            file.is_wheel()
                && WheelFilename::from_str(&file.filename)
                    .map(|wheel| self.tags.supports(&wheel))
                    .unwrap_or(false)
        });

        if let Some(file) = compatible_wheel {
            return Some(SelectedDist {
                version: version.clone(),
                file: file.clone(),
                is_wheel: true,
            });
        }

        files.iter().find(|file| file.is_source()).map(|file| SelectedDist {
            version: version.clone(),
            file: file.clone(),
            is_wheel: false,
        })
    }
}
