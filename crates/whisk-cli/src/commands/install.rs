//! `whisk install`: the install orchestrator.
//!
//! Drives the whole engine: parse requirements, expand the graph,
//! trace it against the environment, then either install in dependency
//! order or report every collected error and mark the environment
//! invalid. The invocation fails atomically: nothing is installed when
//! any conflict or resolution error exists, though wheels built along
//! the way stay cached for the next run.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use tracing::debug;

use whisk_cache::WheelStore;
use whisk_config::{RequirementsParser, Settings};
use whisk_core::error::WhiskResult;
use whisk_core::types::Requirement;
use whisk_index::{DistFinder, IndexClient, MetadataCache, PipWheelBuilder, RetryConfig};
use whisk_resolver::{GraphBuilder, Tracer};

use super::CommandContext;
use crate::installer::{Installer, PipInstaller};
use crate::venv;

/// Arguments to the install command
#[derive(Debug, Default)]
pub struct InstallOptions {
    pub packages: Vec<String>,
    pub requirements: Vec<String>,
    pub venv: Option<String>,
    pub index_url: Option<String>,
    pub extra_index_urls: Vec<String>,
}

/// Orchestrator states. Terminal states are never left within one
/// invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InstallState {
    BuildingGraph,
    Resolving,
    CheckingConflicts,
    Installing,
    Installed,
    Failed,
}

impl InstallState {
    pub(crate) fn is_terminal(self) -> bool {
        matches!(self, InstallState::Installed | InstallState::Failed)
    }

    pub(crate) fn can_transition(self, next: InstallState) -> bool {
        use InstallState::*;
        matches!(
            (self, next),
            (BuildingGraph, Resolving)
                | (Resolving, CheckingConflicts)
                | (CheckingConflicts, Installing)
                | (CheckingConflicts, Failed)
                | (Installing, Installed)
                | (Installing, Failed)
        )
    }
}

/// Tracks the orchestrator's progress through its states
#[derive(Debug)]
pub(crate) struct Phase {
    state: InstallState,
}

impl Phase {
    pub(crate) fn new() -> Self {
        Self {
            state: InstallState::BuildingGraph,
        }
    }

    pub(crate) fn state(&self) -> InstallState {
        self.state
    }

    pub(crate) fn advance(&mut self, next: InstallState) {
        debug_assert!(
            self.state.can_transition(next),
            "invalid transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!("install phase: {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

/// Execute the `whisk install` command
pub async fn execute(options: InstallOptions, ctx: &CommandContext) -> WhiskResult<ExitCode> {
    let mut settings = Settings::load(&ctx.cwd)?;
    apply_overrides(&mut settings, &options);

    let mut phase = Phase::new();

    // Malformed requirements input is fatal and immediate
    let roots = collect_roots(&options)?;
    if roots.is_empty() {
        ctx.output.info("Nothing to install");
        return Ok(ExitCode::SUCCESS);
    }

    phase.advance(InstallState::Resolving);
    let store = Arc::new(WheelStore::new(&settings.cache_dir)?);
    let client = IndexClient::with_config(
        std::iter::once(settings.index_url.clone())
            .chain(settings.extra_index_urls.iter().cloned())
            .collect(),
        RetryConfig::default(),
        Arc::new(MetadataCache::new()),
    )?;
    let pip = settings.venv.join("bin").join("pip");
    let builder = PipWheelBuilder::new(pip.clone());
    let finder = DistFinder::new(client, store, settings.platform_tags(), builder);

    let resolution = GraphBuilder::new(&finder).build(roots).await;

    phase.advance(InstallState::CheckingConflicts);
    let environment = venv::read_environment(&settings)?;
    let site_packages = settings.site_packages();
    let trace = Tracer::new(&resolution.graph, &environment, site_packages.as_str()).trace();

    for event in &trace.events {
        ctx.output.plain(&event.to_string());
    }
    for cycle in &trace.cycles {
        debug!("{}", cycle.as_error());
        ctx.output.plain_err(&cycle.to_string());
    }

    if trace.has_conflicts() || !resolution.errors.is_empty() {
        phase.advance(InstallState::Failed);

        for error in &resolution.errors {
            ctx.output.plain_err(&format!("Error: {}", error));
        }
        for conflict in &trace.conflicts {
            debug!("{}", conflict.as_error());
            ctx.output.plain_err(&conflict.to_string());
        }

        // External build tooling treats the environment as an output;
        // rewinding its timestamp makes it count as stale
        if settings.venv.as_std_path().exists() {
            venv::mark_invalid(&settings.venv)?;
        }
        ctx.output.blank();
        ctx.output.plain(&format!(
            "Something went wrong! Sending '{}' back in time, so make knows it's invalid.",
            settings.venv
        ));

        return Ok(ExitCode::from(1));
    }

    phase.advance(InstallState::Installing);
    let order = resolution.graph.install_order();
    let installer = PipInstaller::new(pip);
    if let Err(error) = installer.install(&order).await {
        phase.advance(InstallState::Failed);
        return Err(error);
    }

    phase.advance(InstallState::Installed);
    let installed: Vec<String> = order
        .iter()
        .map(|candidate| format!("{}-{}", candidate.name, candidate.version))
        .collect();
    ctx.output
        .plain(&format!("Successfully installed {}", installed.join(" ")));

    debug_assert!(phase.state().is_terminal());
    Ok(ExitCode::SUCCESS)
}

/// Expand requirements files and command-line packages into roots, in
/// declaration order: files first, then bare arguments
pub(crate) fn collect_roots(options: &InstallOptions) -> WhiskResult<Vec<Requirement>> {
    let mut parser = RequirementsParser::new();
    let mut roots = Vec::new();

    for file in &options.requirements {
        roots.extend(parser.parse_file(Path::new(file))?);
    }
    for package in &options.packages {
        roots.push(parser.parse_argument(package)?);
    }

    Ok(roots)
}

fn apply_overrides(settings: &mut Settings, options: &InstallOptions) {
    if let Some(venv) = &options.venv {
        settings.venv = venv.as_str().into();
    }
    if let Some(index_url) = &options.index_url {
        settings.index_url = index_url.clone();
    }
    settings
        .extra_index_urls
        .extend(options.extra_index_urls.iter().cloned());
}
