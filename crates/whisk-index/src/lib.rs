//! Package index client for Whisk
//!
//! This crate resolves requirements to concrete distributions from a
//! prioritized list of sources: the local wheel cache first, then the
//! primary index, then any extra indexes. Source distributions are
//! built into wheels and written to the cache before being returned, so
//! later resolutions reuse the artifact. HTTP access uses connection
//! pooling, retry with exponential backoff, and an in-process metadata
//! cache.

pub mod api;
pub mod build;
pub mod cache;
pub mod client;
pub mod finder;
pub mod metadata;
pub mod select;

// Re-export main types
pub use api::{Digests, DistFile, PackageType, ProjectMetadata, ReleaseMetadata};
pub use build::{PipWheelBuilder, WheelBuilder};
pub use cache::{CacheStats, MetadataCache, MetadataEntry};
pub use client::{IndexClient, RetryConfig};
pub use finder::DistFinder;
pub use metadata::{DistInspector, EditableInspector, SdistInspector, WheelMetadataInspector};
pub use select::{CandidateSelector, SelectedDist};

use whisk_core::error::WhiskError;

/// Result type for index operations
pub type IndexResult<T> = Result<T, WhiskError>;
