//! CLI operation handlers.
//!
//! - [`rewrite`]: Runs one moderation rewrite and prints the report
//!
//! Output formatting utilities are in [`output`].

use panopticon::RewriteError;
use thiserror::Error;

pub mod output;
pub mod rewrite;

/// Failures surfaced by the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// The rewrite could not be configured or completed.
    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    /// Writing the report failed.
    #[error("failed to write output: {message}")]
    Io {
        /// Underlying I/O error description.
        message: String,
    },
}
