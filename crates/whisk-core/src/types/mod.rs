//! Core data types for Whisk.

pub mod candidate;
pub mod installed;
pub mod name;
pub mod requirement;
pub mod specifier;
pub mod tags;
pub mod version;
pub mod wheel;

pub use candidate::{DistKind, ResolvedCandidate};
pub use installed::{EnvironmentState, InstalledPackage};
pub use name::PackageName;
pub use requirement::{ProvenanceLink, Requirement, RequirementSource};
pub use specifier::{Specifier, SpecifierSet};
pub use tags::PlatformTags;
pub use version::{Version, VersionError};
pub use wheel::WheelFilename;
