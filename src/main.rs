//! Panopticon CLI entrypoint for moderation rewrites.

use std::io;
use std::process::ExitCode;

use ortho_config::OrthoConfig;
use panopticon::{PanopticonConfig, RewriteError};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::CliError;
use cli::output::write_failure;

fn main() -> ExitCode {
    init_tracing();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            // Nothing more can be reported if stderr itself fails.
            let _ignored = write_failure(&mut io::stderr().lock(), &error);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), CliError> {
    let config = load_config()?;
    cli::rewrite::run(&config)
}

/// Logs go to stderr so they never mix with the report on stdout.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("panopticon=info")),
        )
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`RewriteError::Configuration`] when ortho-config fails to parse
/// arguments or load configuration files.
fn load_config() -> Result<PanopticonConfig, RewriteError> {
    PanopticonConfig::load().map_err(|error| RewriteError::Configuration {
        message: error.to_string(),
    })
}
