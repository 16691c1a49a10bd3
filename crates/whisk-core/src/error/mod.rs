//! Error types and result aliases for Whisk operations.
//!
//! Provides a unified error type that covers all possible error conditions
//! across the Whisk ecosystem with actionable error messages.

use thiserror::Error;

/// Unified error type for all Whisk operations
#[derive(Error, Debug)]
pub enum WhiskError {
    // Input errors
    #[error("Failed to parse {file}, line {line}: {message}")]
    RequirementParse {
        file: String,
        line: usize,
        message: String,
    },

    #[error("Setting '{field}' is invalid: {reason}")]
    SettingsValidation { field: String, reason: String },

    // Index errors
    #[error("Package '{name}' not found in any index")]
    PackageNotFound { name: String },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Resolution errors
    #[error("no distribution matches {name}{constraint}")]
    NoMatchingDistribution { name: String, constraint: String },

    #[error("version conflict: {package}: {detail}")]
    VersionConflict { package: String, detail: String },

    #[error("Circular dependency! {cycle}")]
    CircularDependency { cycle: String },

    // Build errors
    #[error("Failed to build wheel for {package}: {message}")]
    WheelBuild { package: String, message: String },

    // Cache errors
    #[error("Integrity check failed for {package}: expected {expected}, got {actual}")]
    IntegrityFailure {
        package: String,
        expected: String,
        actual: String,
    },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for Whisk operations
pub type WhiskResult<T> = Result<T, WhiskError>;

impl WhiskError {
    /// Create a network error from any error type
    pub fn network<E>(message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(self, WhiskError::Network { .. } | WhiskError::Io { .. })
    }

    /// Check if this error is aggregated across a traversal instead of
    /// aborting it (parse errors abort; resolution-time errors collect)
    pub fn is_aggregated(&self) -> bool {
        matches!(
            self,
            WhiskError::NoMatchingDistribution { .. }
                | WhiskError::PackageNotFound { .. }
                | WhiskError::VersionConflict { .. }
                | WhiskError::CircularDependency { .. }
                | WhiskError::WheelBuild { .. }
        )
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            WhiskError::PackageNotFound { .. } => {
                Some("Check the package name spelling or configure an extra index URL")
            },
            WhiskError::Network { .. } => Some("Check your internet connection and try again"),
            WhiskError::NoMatchingDistribution { .. } => {
                Some("Loosen the version constraint or check the index for available releases")
            },
            WhiskError::VersionConflict { .. } => {
                Some("Pin the conflicting packages to compatible versions")
            },
            WhiskError::CircularDependency { .. } => {
                Some("Circular requirements install anyway; restructure the packages to remove the cycle")
            },
            _ => None,
        }
    }
}
