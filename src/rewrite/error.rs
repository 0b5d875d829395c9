//! Error types exposed by the rewrite layer.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced while validating input or calling a rewrite provider.
///
/// Messages never contain credential values, so the `Display` output is safe
/// to log. Presentation should prefer [`RewriteError::user_message`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RewriteError {
    /// A credential or endpoint is missing or invalid, or the provider
    /// rejected the request with a 4xx status.
    #[error("configuration error: {message}")]
    Configuration {
        /// Details about the configuration failure.
        message: String,
    },

    /// The provider could not be reached or failed server-side.
    #[error("transport error: {message}")]
    Transport {
        /// Transport-level error detail.
        message: String,
        /// Whether the failure is transient (timeout, connection, 5xx).
        retryable: bool,
    },

    /// The provider answered without any payload to interpret.
    #[error("unusable provider response: {message}")]
    UpstreamFormat {
        /// Description of what was missing.
        message: String,
    },

    /// Input was rejected before any network call.
    #[error("invalid input: {message}")]
    Validation {
        /// Description of the invalid input.
        message: String,
    },
}

/// Broad failure category shown alongside user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Credential, endpoint, or request configuration problem.
    Configuration,
    /// Temporary network or provider failure.
    Transient,
    /// Provider response could not be used.
    MalformedResponse,
    /// User input was rejected.
    InvalidInput,
}

impl ErrorCategory {
    /// Human-readable label used in output and telemetry.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Transient => "transient",
            Self::MalformedResponse => "malformed response",
            Self::InvalidInput => "invalid input",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.label())
    }
}

impl RewriteError {
    /// Returns the failure category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Transport { .. } => ErrorCategory::Transient,
            Self::UpstreamFormat { .. } => ErrorCategory::MalformedResponse,
            Self::Validation { .. } => ErrorCategory::InvalidInput,
        }
    }

    /// Whether retrying the same request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport {
                retryable: true,
                ..
            }
        )
    }

    /// Short message suitable for showing to the person who made the request.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration { message } => {
                format!("The rewriting service is not configured correctly: {message}")
            }
            Self::Transport { .. } => concat!(
                "The rewriting service could not be reached. ",
                "Please try again in a moment."
            )
            .to_owned(),
            Self::UpstreamFormat { .. } => concat!(
                "The rewriting service returned an empty response. ",
                "Please try again or choose another provider."
            )
            .to_owned(),
            Self::Validation { message } => format!("Please check your input: {message}"),
        }
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{ErrorCategory, RewriteError};

    #[rstest]
    #[case(RewriteError::configuration("missing key"), ErrorCategory::Configuration)]
    #[case(
        RewriteError::Transport { message: "timeout".to_owned(), retryable: true },
        ErrorCategory::Transient
    )]
    #[case(
        RewriteError::UpstreamFormat { message: "empty body".to_owned() },
        ErrorCategory::MalformedResponse
    )]
    #[case(RewriteError::validation("empty text"), ErrorCategory::InvalidInput)]
    fn errors_map_to_categories(#[case] error: RewriteError, #[case] expected: ErrorCategory) {
        assert_eq!(error.category(), expected);
    }

    #[test]
    fn transient_message_suggests_retrying() {
        let error = RewriteError::Transport {
            message: "connection reset by 10.0.0.1".to_owned(),
            retryable: true,
        };

        let message = error.user_message();

        assert!(message.contains("try again"));
        assert!(!message.contains("10.0.0.1"), "transport detail leaked");
    }

    #[test]
    fn only_retryable_transport_errors_are_retryable() {
        let fatal = RewriteError::Transport {
            message: "redirect loop".to_owned(),
            retryable: false,
        };

        assert!(!fatal.is_retryable());
        assert!(!RewriteError::configuration("401").is_retryable());
    }
}
