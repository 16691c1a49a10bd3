//! Terminal output formatting and utilities.
//!
//! Provides consistent output formatting across commands. Trace lines
//! (`tracing:`, `already queued:`) and the diagnostic lines on stderr
//! are part of the output contract and are always emitted uncolored.

pub mod colors;
pub mod errors;

pub use errors::ErrorFormatter;

/// Output handler for consistent terminal formatting
pub struct OutputHandler {
    colors: colors::ColorSupport,
}

impl OutputHandler {
    /// Create a new output handler
    pub fn new() -> Self {
        Self {
            colors: colors::ColorSupport::detect(),
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        println!("{}", self.colors.dim(message));
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        println!("{} {}", self.colors.green("✓"), message);
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        println!("{} {}", self.colors.yellow("⚠"), message);
    }

    /// Print an error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", self.colors.red("✗"), message);
    }

    /// Print a contract line verbatim (never colored)
    pub fn plain(&self, message: &str) {
        println!("{}", message);
    }

    /// Print a contract line verbatim to stderr (never colored)
    pub fn plain_err(&self, message: &str) {
        eprintln!("{}", message);
    }

    /// Print an empty line
    pub fn blank(&self) {
        println!();
    }
}

impl Default for OutputHandler {
    fn default() -> Self {
        Self::new()
    }
}
