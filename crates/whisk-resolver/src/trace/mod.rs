//! Conflict detection over the expanded graph.
//!
//! The tracer walks nodes in discovery order, emitting the trace lines
//! (`tracing:`, `already queued:`) and checking every requirement
//! instance exactly once against the environment's effective state: the
//! resolved candidate when one exists (that is what the environment
//! will contain), otherwise the currently installed package. Conflicts
//! accumulate; nothing short-circuits, so one invocation reports every
//! conflict it can find. The diagnostic line formats are a
//! compatibility contract and must not change.

use std::collections::{HashMap, HashSet};
use std::fmt;

use whisk_core::error::WhiskError;
use whisk_core::types::{EnvironmentState, PackageName, Requirement, Version};

use crate::graph::RequirementGraph;

/// One line of human-readable trace output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// A package is being traced
    Tracing(Requirement),
    /// A dependency edge points at a name already in the graph
    AlreadyQueued(Requirement),
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceEvent::Tracing(requirement) => write!(f, "tracing: {}", requirement),
            TraceEvent::AlreadyQueued(requirement) => {
                write!(f, "already queued: {}", requirement)
            },
        }
    }
}

/// A detected version conflict. Immutable once created; only collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictRecord {
    /// Name of the conflicting package as the environment knows it
    pub name: String,
    /// Version the environment holds (or will hold)
    pub version: Version,
    /// Where that version lives
    pub location: String,
    /// The requirement instance the version fails to satisfy
    pub requirement: Requirement,
}

impl fmt::Display for ConflictRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Error: version conflict: {} {} ({}) <-> {}",
            self.name, self.version, self.location, self.requirement
        )
    }
}

impl ConflictRecord {
    /// The record as an error value (for logging and aggregation)
    pub fn as_error(&self) -> WhiskError {
        WhiskError::VersionConflict {
            package: self.name.clone(),
            detail: self.to_string(),
        }
    }
}

/// A requirement chain that refers back to one of its own ancestors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircularRecord {
    pub requirement: Requirement,
}

impl fmt::Display for CircularRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Circular dependency! {}", self.requirement)
    }
}

impl CircularRecord {
    pub fn as_error(&self) -> WhiskError {
        WhiskError::CircularDependency {
            cycle: self.requirement.to_string(),
        }
    }
}

/// Everything one trace pass produces, in deterministic order
#[derive(Debug, Default)]
pub struct TraceOutcome {
    pub events: Vec<TraceEvent>,
    pub conflicts: Vec<ConflictRecord>,
    pub cycles: Vec<CircularRecord>,
}

impl TraceOutcome {
    /// True when the invocation must fail (cycles alone do not fail it;
    /// their members still install)
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

/// What the environment effectively holds for one name
#[derive(Debug, Clone)]
struct EffectiveDist {
    name: String,
    version: Version,
    location: String,
}

/// Walks a resolved graph against the target environment
#[derive(Debug)]
pub struct Tracer<'a> {
    graph: &'a RequirementGraph,
    effective: HashMap<PackageName, EffectiveDist>,
}

impl<'a> Tracer<'a> {
    /// `planned_location` is where resolved candidates will land:
    /// the environment's site-packages directory
    pub fn new(
        graph: &'a RequirementGraph,
        environment: &EnvironmentState,
        planned_location: &str,
    ) -> Self {
        let mut effective = HashMap::new();

        for installed in environment.iter() {
            effective.insert(
                installed.canonical.clone(),
                EffectiveDist {
                    name: installed.name.clone(),
                    version: installed.version.clone(),
                    location: installed.location.clone(),
                },
            );
        }

        // Resolved candidates shadow installed packages: they are what
        // the environment will contain after this invocation
        for node in graph.nodes() {
            if let Some(candidate) = &node.candidate {
                effective.insert(
                    candidate.canonical.clone(),
                    EffectiveDist {
                        name: candidate.name.clone(),
                        version: candidate.version.clone(),
                        location: planned_location.to_string(),
                    },
                );
            }
        }

        Self { graph, effective }
    }

    /// Trace the whole graph, collecting every conflict and cycle
    pub fn trace(&self) -> TraceOutcome {
        let mut outcome = TraceOutcome::default();
        let mut traced_cycles: HashSet<(PackageName, String)> = HashSet::new();

        for node in self.graph.nodes() {
            outcome
                .events
                .push(TraceEvent::Tracing(node.requirement.clone()));

            // Root instances are checked here; every other instance is
            // checked below as its parent's dependency edge
            if node.requirement.is_root() {
                self.check_conflict(&node.requirement, &mut outcome);
            }

            for dependency in &node.dependencies {
                outcome
                    .events
                    .push(TraceEvent::AlreadyQueued(dependency.clone()));
                self.check_conflict(dependency, &mut outcome);

                if dependency.chain_contains_self() {
                    let key = (
                        dependency.canonical.clone(),
                        dependency.specifiers.to_string(),
                    );
                    // A traced package+constraint pair is recorded once
                    if traced_cycles.insert(key) {
                        outcome.cycles.push(CircularRecord {
                            requirement: dependency.clone(),
                        });
                    }
                }
            }
        }

        outcome
    }

    fn check_conflict(&self, requirement: &Requirement, outcome: &mut TraceOutcome) {
        let Some(effective) = self.effective.get(&requirement.canonical) else {
            return;
        };

        if !requirement.specifiers.matches(&effective.version) {
            outcome.conflicts.push(ConflictRecord {
                name: effective.name.clone(),
                version: effective.version.clone(),
                location: effective.location.clone(),
                requirement: requirement.clone(),
            });
        }
    }
}
