//! Become provider error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for become operations.
pub type BecomeResult<T> = Result<T, BecomeError>;

/// Errors that can occur while resolving options or looking up methods.
///
/// Command building and output classification never fail; these only surface
/// from configuration loading and registry lookups.
#[derive(Debug, Error)]
pub enum BecomeError {
    /// A required option resolved to nothing.
    #[error("required option {option} has no value")]
    Configuration { option: String },

    /// No become method registered under this name.
    #[error("unknown become method: {0}")]
    UnknownMethod(String),

    /// A become method was registered twice.
    #[error("become method already registered: {0}")]
    DuplicateMethod(String),

    /// The ini file could not be parsed.
    #[error("invalid ini configuration: {0}")]
    Ini(#[from] ini::ParseError),

    /// The host variables file could not be parsed.
    #[error("invalid host variables in {}: {message}", path.display())]
    HostVars { path: PathBuf, message: String },

    /// A `key=value` assignment was malformed.
    #[error("invalid variable assignment {0:?}: expected KEY=VALUE")]
    InvalidAssignment(String),

    /// Generic IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
