//! Wheel artifact cache for Whisk
//!
//! This crate provides the shared wheel cache: a filesystem directory of
//! built wheel files keyed by their canonical filename, with atomic
//! writes (a partially-built wheel is never observed), blake3 content
//! digests, and a JSON index carrying access metadata. It also handles
//! safe extraction of source-distribution archives.

pub mod archive;
pub mod wheels;

// Re-export main types
pub use archive::extract_sdist;
pub use wheels::{ArtifactDigest, CachedWheel, PruneResult, WheelEntry, WheelIndex, WheelStore};

use whisk_core::error::WhiskError;

/// Result type for cache operations
pub type CacheResult<T> = Result<T, WhiskError>;
