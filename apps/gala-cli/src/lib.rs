//! # gala-cli
//!
//! Command-line front end for gala-core. Reads JSON files, prints JSON
//! results to stdout and logs to stderr.
//!
//! ## Modules
//! - [`args`] - Argument parsing
//! - [`config`] - `gala.toml` and `GALA_*` overrides
//! - [`commands`] - quote, persist, rehydrate
//! - [`error`] - CLI error type

pub mod args;
pub mod commands;
pub mod config;
pub mod error;

pub use args::{parse_args, Cli, Command};
pub use commands::run;
pub use config::AppConfig;
pub use error::{CliError, CliResult};
