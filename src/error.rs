//! Error type for the command line front end

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced to the user
#[derive(Debug, Error)]
pub enum CliError {
    /// Target name not recognised
    #[error("Unknown target: {0}")]
    UnknownTarget(String),

    /// Malformed target parameter
    #[error("Invalid parameter format: '{0}' (expected key=value)")]
    InvalidParameter(String),

    /// Simulator rejected its options
    #[error(transparent)]
    Sim(#[from] mspiflash_sim::SimConfigError),

    /// Driver operation failed
    #[error("Flash operation failed: {0}")]
    Flash(#[from] mspiflash_core::Error),

    /// File could not be read or written
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
