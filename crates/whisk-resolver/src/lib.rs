//! Dependency resolution engine for Whisk
//!
//! This crate expands root requirements into a full requirement graph
//! (breadth-first, in declaration order, with provenance chains) and
//! walks that graph against the target environment's state to detect
//! version conflicts and circular dependencies with deterministic,
//! reproducible diagnostics.

pub mod graph;
pub mod provider;
pub mod trace;

// Re-export main types
pub use graph::{
    DependencyProvider, GraphBuilder, RequirementGraph, ResolutionOutcome, ResolvedNode,
};
pub use trace::{CircularRecord, ConflictRecord, TraceEvent, TraceOutcome, Tracer};

use whisk_core::error::WhiskError;

/// Result type for resolver operations
pub type ResolverResult<T> = Result<T, WhiskError>;
