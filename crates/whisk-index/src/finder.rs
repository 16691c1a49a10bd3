//! Requirement-to-distribution resolution.
//!
//! Sources are consulted in priority order: the local wheel cache
//! first, then the indexes. A selected source distribution is built
//! into a wheel and written to the cache before being returned, so
//! later resolutions (including other invocations sharing the cache)
//! reuse the artifact.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use tracing::debug;
use whisk_core::error::WhiskError;
use whisk_core::types::{
    DistKind, PlatformTags, Requirement, RequirementSource, ResolvedCandidate, Version,
    WheelFilename,
};

use whisk_cache::WheelStore;

use crate::build::WheelBuilder;
use crate::client::IndexClient;
use crate::metadata::{descend_single_dir, parse_requires_entry, DistInspector, EditableInspector};
use crate::select::CandidateSelector;
use crate::IndexResult;

/// Resolves requirements to concrete distributions
#[derive(Debug)]
pub struct DistFinder<B: WheelBuilder> {
    client: IndexClient,
    store: Arc<WheelStore>,
    selector: CandidateSelector,
    tags: PlatformTags,
    builder: B,
}

impl<B: WheelBuilder> DistFinder<B> {
    pub fn new(client: IndexClient, store: Arc<WheelStore>, tags: PlatformTags, builder: B) -> Self {
        Self {
            client,
            store,
            selector: CandidateSelector::new(tags.clone()),
            tags,
            builder,
        }
    }

    /// Resolve a requirement to the best matching distribution
    pub async fn resolve(&self, requirement: &Requirement) -> IndexResult<ResolvedCandidate> {
        match &requirement.source {
            RequirementSource::DirectUrl(url) => self.resolve_direct_url(requirement, url),
            RequirementSource::Editable(target) => self.resolve_editable(requirement, target),
            RequirementSource::Index => self.resolve_from_sources(requirement).await,
        }
    }

    /// A direct wheel URL installs the exact version embedded in the
    /// wheel's filename; no index lookup and no build step.
    fn resolve_direct_url(
        &self,
        requirement: &Requirement,
        url: &str,
    ) -> IndexResult<ResolvedCandidate> {
        let version = requirement
            .specifiers
            .pinned_version()
            .cloned()
            .ok_or_else(|| WhiskError::NoMatchingDistribution {
                name: requirement.name.clone(),
                constraint: requirement.specifiers.to_string(),
            })?;

        Ok(ResolvedCandidate::new(
            &requirement.name,
            version,
            url.to_string(),
            DistKind::Wheel,
        ))
    }

    /// Editable sources resolve through their own build metadata
    /// instead of an index lookup
    fn resolve_editable(
        &self,
        requirement: &Requirement,
        target: &str,
    ) -> IndexResult<ResolvedCandidate> {
        let inspector = EditableInspector::new(Path::new(target));
        let (name, version) = inspector.project()?;

        if !requirement.specifiers.matches(&version) {
            return Err(WhiskError::NoMatchingDistribution {
                name: requirement.name.clone(),
                constraint: requirement.specifiers.to_string(),
            });
        }

        Ok(ResolvedCandidate::new(
            &name,
            version,
            target.to_string(),
            DistKind::Editable,
        ))
    }

    async fn resolve_from_sources(
        &self,
        requirement: &Requirement,
    ) -> IndexResult<ResolvedCandidate> {
        // Local wheel cache is the highest-priority source
        if let Some(cached) =
            self.store
                .find(&requirement.canonical, &requirement.specifiers, &self.tags)?
        {
            debug!("cache hit: {}", cached.filename);
            return Ok(ResolvedCandidate::new(
                &cached.filename.distribution,
                cached.filename.version.clone(),
                cached.path.to_string(),
                DistKind::CachedWheel,
            ));
        }

        let project = self.client.fetch_project(&requirement.canonical).await?;
        let selected = self.selector.select(requirement, &project)?;

        if selected.is_wheel {
            return Ok(ResolvedCandidate::new(
                &project.name,
                selected.version,
                selected.file.url.clone(),
                DistKind::Wheel,
            ));
        }

        // A source distribution is built into a wheel and cached before
        // being returned
        let archive = self.client.download(&selected.file).await?;
        let cached = self.build_and_cache(&project.name, &archive).await?;

        Ok(ResolvedCandidate::new(
            &project.name,
            cached.filename.version.clone(),
            cached.path.to_string(),
            DistKind::CachedWheel,
        ))
    }

    async fn build_and_cache(
        &self,
        name: &str,
        archive: &[u8],
    ) -> IndexResult<whisk_cache::CachedWheel> {
        let work_dir = tempfile::tempdir()
            .map_err(|e| WhiskError::io("Failed to create build directory".to_string(), e))?;

        let source_root = work_dir.path().join("src");
        whisk_cache::extract_sdist(std::io::Cursor::new(archive), &source_root)?;
        let source_dir = descend_single_dir(&source_root);

        let wheel_path = self.builder.build(&source_dir, work_dir.path()).await?;

        let built_name = wheel_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| WhiskError::WheelBuild {
                package: name.to_string(),
                message: "builder returned a path without a filename".to_string(),
            })?;
        let filename = WheelFilename::from_str(built_name).map_err(|message| {
            WhiskError::WheelBuild {
                package: name.to_string(),
                message,
            }
        })?;

        self.store.add_file(&filename, &wheel_path)
    }

    /// Declared dependencies of a resolved candidate, filtered by the
    /// requesting requirement's extras
    pub async fn dependencies(
        &self,
        candidate: &ResolvedCandidate,
        extras: &[String],
    ) -> IndexResult<Vec<Requirement>> {
        if candidate.kind == DistKind::Editable {
            let inspector = EditableInspector::new(Path::new(&candidate.location));
            return inspector.declared_dependencies();
        }

        let project = match self.client.fetch_project(&candidate.canonical).await {
            Ok(project) => project,
            Err(WhiskError::PackageNotFound { .. }) => {
                // Locally built or directly fetched wheels may not be
                // registered on any index; they install without
                // expanding further
                debug!("no index metadata for {}", candidate.canonical);
                return Ok(Vec::new());
            },
            Err(other) => return Err(other),
        };

        let release = project
            .release(&candidate.version.to_string())
            .or_else(|| {
                project.releases.values().find(|release| {
                    Version::from_str(&release.version).ok().as_ref() == Some(&candidate.version)
                })
            });

        let Some(release) = release else {
            return Ok(Vec::new());
        };

        let mut requirements = Vec::new();
        for entry in release.requires_dist.iter().flatten() {
            if let Some(requirement) = parse_requires_entry(entry, extras)? {
                requirements.push(requirement);
            }
        }
        Ok(requirements)
    }
}
