//! Output formatting utilities for CLI operations.

use std::io::{self, Write};

use panopticon::RewriteReport;
use panopticon::diff::escape_control;

use super::CliError;

/// Writes a rewrite report to the given writer.
///
/// Provider-supplied text is printed with control characters escaped.
pub fn write_report<W: Write>(writer: &mut W, report: &RewriteReport) -> Result<(), CliError> {
    let result = &report.result;
    let status = if result.kept_original() {
        "original kept"
    } else {
        "rewritten"
    };

    writeln!(writer, "Provider: {}", escape_control(&report.provider))
        .map_err(|e| io_error(&e))?;
    writeln!(writer, "Status: {status}").map_err(|e| io_error(&e))?;
    writeln!(
        writer,
        "Rewritten: {}",
        escape_control(&result.rewritten_text)
    )
    .map_err(|e| io_error(&e))?;
    writeln!(
        writer,
        "Explanation: {}",
        escape_control(result.explanation.as_deref().unwrap_or("(none)"))
    )
    .map_err(|e| io_error(&e))?;
    writeln!(
        writer,
        "Changed: {:.2}% ({} granularity)",
        report.change.percent_changed,
        report.change.granularity()
    )
    .map_err(|e| io_error(&e))?;
    writeln!(writer).map_err(|e| io_error(&e))?;
    writeln!(writer, "Original: {}", report.marked.source_marked).map_err(|e| io_error(&e))?;
    writeln!(writer, "Rewrite:  {}", report.marked.target_marked).map_err(|e| io_error(&e))?;

    Ok(())
}

/// Writes a failure as its category and user-facing message.
///
/// Internal details, such as upstream response bodies, stay in the logs.
pub fn write_failure<W: Write>(writer: &mut W, error: &CliError) -> io::Result<()> {
    match error {
        CliError::Rewrite(rewrite_error) => writeln!(
            writer,
            "Error [{}]: {}",
            rewrite_error.category(),
            rewrite_error.user_message()
        ),
        CliError::Io { message } => writeln!(writer, "Error [output]: {message}"),
    }
}

/// Converts an I/O error into a [`CliError`].
pub fn io_error(error: &io::Error) -> CliError {
    CliError::Io {
        message: error.to_string(),
    }
}
