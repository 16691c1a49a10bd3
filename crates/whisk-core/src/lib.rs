//! # whisk-core
//!
//! Core types and utilities shared across all Whisk crates.
//!
//! This crate provides:
//! - Version and SpecifierSet types (a PEP 440 subset) with rkyv support
//! - PackageName canonicalization (PEP 503)
//! - Requirement and provenance-chain types for dependency tracing
//! - InstalledPackage and EnvironmentState for conflict comparisons
//! - WhiskError enum for unified error handling
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (Version, Requirement, etc.)
//! - `error`: Error types and result aliases
//! - `utils`: Utility functions and helpers

pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{WhiskError, WhiskResult};
pub use types::{
    DistKind, EnvironmentState, InstalledPackage, PackageName, PlatformTags, ProvenanceLink,
    Requirement, RequirementSource, ResolvedCandidate, Specifier, SpecifierSet, Version,
    WheelFilename,
};
