//! # CLI Error Types
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        CLI Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Usage / Config │  │   Files & JSON  │  │     Quote Engine        │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Usage          │  │  Read           │  │  Core (CoreError)       │ │
//! │  │  InvalidConfig  │  │  Io             │  │                         │ │
//! │  │  ConfigParse    │  │  Json           │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use gala_core::CoreError;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Everything that can stop a command. `main` prints it and exits with 1.
#[derive(Debug, Error)]
pub enum CliError {
    /// Bad command line.
    #[error("{0}\nRun `gala --help` for usage.")]
    Usage(String),

    /// Config values that parse but make no sense.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// An input file could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The engine rejected the quote.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<gala_core::ValidationError> for CliError {
    fn from(err: gala_core::ValidationError) -> Self {
        CliError::Core(CoreError::Validation(err))
    }
}
