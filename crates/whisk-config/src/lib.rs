//! Requirements-file parsing and installer settings for Whisk
//!
//! This crate turns line-oriented requirements input (`-r` includes,
//! `-e` editables, direct wheel URLs, comments) into root Requirements
//! with file/line provenance, and loads the explicit Settings object
//! that every other component receives instead of ambient global state.

pub mod requirements;
pub mod settings;

// Re-export main types
pub use requirements::RequirementsParser;
pub use settings::{Settings, WhiskToml};

use whisk_core::error::WhiskError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, WhiskError>;
