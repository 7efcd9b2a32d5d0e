//! # Gala CLI
//!
//! ## Usage
//! ```bash
//! # Price a quote
//! cargo run -p gala-cli -- quote --input quote.json
//!
//! # Build the record to save
//! cargo run -p gala-cli -- persist --input quote.json
//!
//! # Reload a saved quote against today's catalog
//! cargo run -p gala-cli -- rehydrate --input saved.json --catalog catalog.json
//!
//! # More logging
//! RUST_LOG=gala=trace cargo run -p gala-cli -- quote --input quote.json
//! ```

use std::env;
use std::process::ExitCode;

use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let result = gala_cli::parse_args(&args).and_then(gala_cli::run);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("error: {}", e);
            ExitCode::from(1)
        }
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr; stdout carries only JSON.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=gala=trace` - Show trace for gala crates only
/// - Default: `info,gala=debug`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,gala=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
