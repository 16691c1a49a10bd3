//! Requirement graph construction.
//!
//! Roots expand breadth-first in declaration order; a package's
//! dependencies are visited in canonical-name order. Both orders are
//! fixed so trace logs and diagnostics are reproducible run to run. A
//! name already in the graph is never re-expanded; the re-encountered
//! requirement instance is recorded under the name and left for the
//! tracer to judge.

use std::collections::{HashMap, VecDeque};

use indexmap::IndexMap;
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use whisk_core::error::{WhiskError, WhiskResult};
use whisk_core::types::{PackageName, Requirement, ResolvedCandidate, SpecifierSet};

/// Source of resolved candidates and their declared dependencies.
/// Implemented by the production index finder and by in-memory fakes in
/// tests.
pub trait DependencyProvider {
    /// Resolve a requirement to a concrete distribution
    fn resolve(
        &self,
        requirement: &Requirement,
    ) -> impl std::future::Future<Output = WhiskResult<ResolvedCandidate>> + Send;

    /// Declared dependencies of a resolved candidate
    fn dependencies(
        &self,
        candidate: &ResolvedCandidate,
        extras: &[String],
    ) -> impl std::future::Future<Output = WhiskResult<Vec<Requirement>>> + Send;
}

/// One traced package: the first requirement instance seen for its
/// name, what it resolved to, and the dependency instances discovered
/// under it
#[derive(Debug, Clone)]
pub struct ResolvedNode {
    pub requirement: Requirement,
    /// None when resolution failed; the error is aggregated separately
    pub candidate: Option<ResolvedCandidate>,
    pub dependencies: Vec<Requirement>,
}

/// The expanded requirement graph
#[derive(Debug)]
pub struct RequirementGraph {
    /// Every requirement instance, accumulated per canonical name in
    /// insertion order
    requirements: IndexMap<PackageName, Vec<Requirement>>,
    /// Traced packages in discovery order
    nodes: Vec<ResolvedNode>,
    node_lookup: HashMap<PackageName, usize>,
    /// Resolved packages and their dependency edges, for install
    /// ordering
    install_graph: DiGraph<PackageName, SpecifierSet>,
    install_lookup: HashMap<PackageName, NodeIndex>,
}

impl RequirementGraph {
    fn new() -> Self {
        Self {
            requirements: IndexMap::new(),
            nodes: Vec::new(),
            node_lookup: HashMap::new(),
            install_graph: DiGraph::new(),
            install_lookup: HashMap::new(),
        }
    }

    /// Record a requirement instance under its canonical name.
    /// Returns true when this is the first instance for the name.
    fn record(&mut self, requirement: Requirement) -> bool {
        let entry = self
            .requirements
            .entry(requirement.canonical.clone())
            .or_default();
        entry.push(requirement);
        entry.len() == 1
    }

    fn add_node(&mut self, node: ResolvedNode) {
        self.node_lookup
            .insert(node.requirement.canonical.clone(), self.nodes.len());
        self.nodes.push(node);
    }

    /// Build the install-ordering graph from the traced nodes
    fn build_install_graph(&mut self) {
        for node in &self.nodes {
            if node.candidate.is_some() {
                let name = node.requirement.canonical.clone();
                let index = self.install_graph.add_node(name.clone());
                self.install_lookup.insert(name, index);
            }
        }

        for node in &self.nodes {
            let Some(&from) = self.install_lookup.get(&node.requirement.canonical) else {
                continue;
            };
            for dependency in &node.dependencies {
                if let Some(&to) = self.install_lookup.get(&dependency.canonical) {
                    self.install_graph
                        .add_edge(from, to, dependency.specifiers.clone());
                }
            }
        }
    }

    /// Traced packages in discovery order
    pub fn nodes(&self) -> &[ResolvedNode] {
        &self.nodes
    }

    /// The traced node for a package name
    pub fn node(&self, name: &PackageName) -> Option<&ResolvedNode> {
        self.node_lookup.get(name).map(|&index| &self.nodes[index])
    }

    /// All requirement instances recorded for a name
    pub fn requirements_for(&self, name: &PackageName) -> &[Requirement] {
        self.requirements
            .get(name)
            .map(|instances| instances.as_slice())
            .unwrap_or(&[])
    }

    /// Number of distinct package names in the graph
    pub fn package_count(&self) -> usize {
        self.requirements.len()
    }

    /// Number of requirement instances across all names
    pub fn requirement_count(&self) -> usize {
        self.requirements.values().map(|instances| instances.len()).sum()
    }

    /// Number of dependency edges between resolved packages
    pub fn dependency_count(&self) -> usize {
        self.install_graph.edge_count()
    }

    /// Resolved candidates in install order: dependencies before
    /// dependents. Strongly connected components (cycles) come out in
    /// reverse topological order of the condensation; members of a
    /// cycle follow discovery order.
    pub fn install_order(&self) -> Vec<&ResolvedCandidate> {
        let mut order = Vec::new();

        for mut component in tarjan_scc(&self.install_graph) {
            component.sort_by_key(|&index| {
                self.node_lookup
                    .get(&self.install_graph[index])
                    .copied()
                    .unwrap_or(usize::MAX)
            });
            for index in component {
                let name = &self.install_graph[index];
                if let Some(candidate) = self
                    .node(name)
                    .and_then(|node| node.candidate.as_ref())
                {
                    order.push(candidate);
                }
            }
        }

        order
    }

    /// Check that the resolved graph is cycle-free
    pub fn validate_acyclic(&self) -> WhiskResult<()> {
        if toposort(&self.install_graph, None).is_ok() {
            return Ok(());
        }

        let cycle = tarjan_scc(&self.install_graph)
            .into_iter()
            .find(|component| component.len() > 1)
            .unwrap_or_default();
        let mut names: Vec<String> = cycle
            .iter()
            .map(|&index| self.install_graph[index].to_string())
            .collect();
        names.sort();
        if let Some(first) = names.first().cloned() {
            names.push(first);
        }

        Err(WhiskError::CircularDependency {
            cycle: names.join("->"),
        })
    }
}

/// Aggregated result of graph construction
#[derive(Debug)]
pub struct ResolutionOutcome {
    pub graph: RequirementGraph,
    /// Resolution errors in discovery order; none of them aborts the
    /// expansion of other packages
    pub errors: Vec<WhiskError>,
}

/// Breadth-first graph builder over a dependency provider
#[derive(Debug)]
pub struct GraphBuilder<'a, P: DependencyProvider> {
    provider: &'a P,
}

impl<'a, P: DependencyProvider> GraphBuilder<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    /// Expand root requirements into a full graph. Resolution errors
    /// are collected, never short-circuited.
    pub async fn build(&self, roots: Vec<Requirement>) -> ResolutionOutcome {
        let mut graph = RequirementGraph::new();
        let mut errors = Vec::new();
        let mut queue = VecDeque::new();

        for root in roots {
            if graph.record(root.clone()) {
                queue.push_back(root);
            }
        }

        while let Some(requirement) = queue.pop_front() {
            debug!("tracing {}", requirement);

            let candidate = match self.provider.resolve(&requirement).await {
                Ok(candidate) => Some(candidate),
                Err(error) => {
                    errors.push(error);
                    None
                },
            };

            let mut dependencies = match &candidate {
                Some(candidate) => {
                    match self
                        .provider
                        .dependencies(candidate, &requirement.extras)
                        .await
                    {
                        Ok(dependencies) => dependencies,
                        Err(error) => {
                            errors.push(error);
                            Vec::new()
                        },
                    }
                },
                None => Vec::new(),
            };

            // Canonical-name order keeps traversal deterministic
            dependencies.sort_by(|a, b| a.canonical.cmp(&b.canonical));
            let dependencies: Vec<Requirement> = dependencies
                .into_iter()
                .map(|dependency| {
                    let chain = requirement.child_chain();
                    dependency.with_chain(chain)
                })
                .collect();

            for dependency in &dependencies {
                if graph.record(dependency.clone()) {
                    queue.push_back(dependency.clone());
                }
            }

            graph.add_node(ResolvedNode {
                requirement,
                candidate,
                dependencies,
            });
        }

        graph.build_install_graph();
        ResolutionOutcome { graph, errors }
    }
}
