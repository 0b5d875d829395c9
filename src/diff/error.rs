//! Error types exposed by the diff engine.

use thiserror::Error;

/// Errors raised when an alignment is applied to the wrong texts.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiffError {
    /// The supplied texts do not tokenise to the alignment's lengths.
    #[error(
        "texts do not match the alignment: expected {expected_source}/{expected_target} \
         tokens, found {actual_source}/{actual_target}"
    )]
    TextMismatch {
        /// Source token count the alignment was computed for.
        expected_source: usize,
        /// Source token count of the supplied text.
        actual_source: usize,
        /// Target token count the alignment was computed for.
        expected_target: usize,
        /// Target token count of the supplied text.
        actual_target: usize,
    },
}
