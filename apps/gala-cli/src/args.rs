//! Command-line parsing.
//!
//! ## Usage
//! ```bash
//! gala quote --input quote.json
//! gala persist --input quote.json --config ./gala.toml
//! gala rehydrate --input saved.json --catalog catalog.json
//! ```

use std::path::PathBuf;

use crate::error::{CliError, CliResult};

pub const USAGE: &str = "\
Gala quote engine

Usage: gala <COMMAND> [OPTIONS]

Commands:
  quote       Price a quote request and print summary, breakdown and warnings
  persist     Price a quote request and print the record to save
  rehydrate   Rebuild inputs from a saved record and reprice them

Options:
  -i, --input <PATH>     Quote request (quote, persist) or saved record (rehydrate)
      --catalog <PATH>   Live catalog snapshot (rehydrate only)
  -c, --config <PATH>    Config file (default: platform config dir, gala.toml)
  -h, --help             Show this help message

Environment:
  GALA_MARGIN_MODE, GALA_MARGIN_PERCENTAGE, GALA_RETENTION_ENABLED,
  GALA_RETENTION_PERCENTAGE, GALA_TOLERANCE_PER_LINE, RUST_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quote { input: PathBuf },
    Persist { input: PathBuf },
    Rehydrate { input: PathBuf, catalog: PathBuf },
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cli {
    pub command: Command,
    pub config: Option<PathBuf>,
}

/// Parses arguments, excluding the program name.
pub fn parse_args(args: &[String]) -> CliResult<Cli> {
    let mut name: Option<&str> = None;
    let mut input: Option<PathBuf> = None;
    let mut catalog: Option<PathBuf> = None;
    let mut config: Option<PathBuf> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                return Ok(Cli {
                    command: Command::Help,
                    config: None,
                })
            }
            flag @ ("--input" | "-i" | "--catalog" | "--config" | "-c") => {
                let value = args
                    .get(i + 1)
                    .map(PathBuf::from)
                    .ok_or_else(|| CliError::Usage(format!("{} requires a path", flag)))?;
                match flag {
                    "--input" | "-i" => input = Some(value),
                    "--catalog" => catalog = Some(value),
                    _ => config = Some(value),
                }
                i += 1;
            }
            other if other.starts_with('-') => {
                return Err(CliError::Usage(format!("Unknown option: {}", other)));
            }
            other if name.is_none() => name = Some(other),
            other => return Err(CliError::Usage(format!("Unexpected argument: {}", other))),
        }
        i += 1;
    }

    let require = |value: Option<PathBuf>, flag: &str| {
        value.ok_or_else(|| CliError::Usage(format!("{} is required", flag)))
    };

    let command = match name {
        None => Command::Help,
        Some("quote") => Command::Quote {
            input: require(input, "--input")?,
        },
        Some("persist") => Command::Persist {
            input: require(input, "--input")?,
        },
        Some("rehydrate") => Command::Rehydrate {
            input: require(input, "--input")?,
            catalog: require(catalog, "--catalog")?,
        },
        Some(other) => return Err(CliError::Usage(format!("Unknown command: {}", other))),
    };

    Ok(Cli { command, config })
}
