//! The wheel cache.
//!
//! Layout is a flat directory of wheel files under their canonical
//! filenames, so external callers can pre-populate or inspect it with
//! nothing more than `ls`. An `index.json` next to the wheels carries
//! content digests and access times; the files themselves remain the
//! source of truth.

pub mod digest;
pub mod index;
pub mod store;

pub use digest::{compute_digest, ArtifactDigest};
pub use index::{WheelEntry, WheelIndex};
pub use store::{CachedWheel, PruneResult, WheelStore};
