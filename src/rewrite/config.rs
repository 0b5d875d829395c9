//! Connection settings injected into rewrite backends.
//!
//! Values are built once at start-up and never mutated. [`ApiKey`] redacts
//! itself in `Debug` output and has no `Display` impl, so a key cannot reach
//! logs by accident.

use std::fmt;
use std::time::Duration;

use serde_json::Value;
use url::Url;

use super::error::RewriteError;
use super::retry::RetryPolicy;

const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Credential used to authenticate against a provider.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wraps a key value, rejecting blank strings.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let key = value.into();
        if key.trim().is_empty() {
            None
        } else {
            Some(Self(key))
        }
    }

    /// Secret value, for building authentication headers only.
    #[must_use]
    pub const fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("ApiKey(<redacted>)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Key(String),
    Index(usize),
}

/// Dotted path to the text field of a JSON response.
///
/// Numeric segments index arrays, so `choices.0.message.content` selects
/// the content of the first choice. Providers disagree on response shapes,
/// which is why the path is configuration rather than code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsePath {
    raw: String,
    segments: Vec<PathSegment>,
}

impl ResponsePath {
    /// Parses a dotted path.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError::Configuration`] when the path is empty or
    /// contains an empty segment.
    pub fn parse(path: &str) -> Result<Self, RewriteError> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(RewriteError::configuration("response path must not be empty"));
        }

        let segments = trimmed
            .split('.')
            .map(|segment| {
                if segment.is_empty() {
                    return Err(RewriteError::configuration(format!(
                        "response path '{trimmed}' contains an empty segment"
                    )));
                }
                Ok(segment.parse::<usize>().map_or_else(
                    |_| PathSegment::Key(segment.to_owned()),
                    PathSegment::Index,
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            raw: trimmed.to_owned(),
            segments,
        })
    }

    /// Path as configured.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.raw.as_str()
    }

    /// Follows the path through `value`.
    #[must_use]
    pub fn resolve<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(value, |current, segment| match segment {
                PathSegment::Key(key) => current.get(key.as_str()),
                PathSegment::Index(index) => current.get(*index),
            })
    }

    /// Follows the path and extracts text from the value found there.
    ///
    /// A string is returned as-is. An array of content parts yields the
    /// first part carrying a `text` or `content` string.
    #[must_use]
    pub fn extract_text<'a>(&self, value: &'a Value) -> Option<&'a str> {
        self.resolve(value).and_then(text_of)
    }
}

fn text_of(value: &Value) -> Option<&str> {
    match value {
        Value::String(text) => Some(text.as_str()),
        Value::Array(parts) => parts.iter().find_map(|part| {
            part.get("text")
                .and_then(Value::as_str)
                .or_else(|| part.get("content").and_then(Value::as_str))
        }),
        _ => None,
    }
}

/// Timeout and retry settings shared by all backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportSettings {
    /// Per-attempt HTTP timeout.
    pub timeout: Duration,
    /// Retry policy for transient failures.
    pub retry: RetryPolicy,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        }
    }
}

/// Connection data for a hosted chat provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    /// Base API URL (e.g., `https://api.openai.com/v1`).
    pub base_url: Url,
    /// Credential; checked when a request is made so unused providers may
    /// stay unconfigured.
    pub api_key: Option<ApiKey>,
    /// Model identifier sent with each request.
    pub model: String,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Location of the generated text in the response JSON.
    pub response_path: ResponsePath,
    /// Extra request headers, such as API version pins.
    pub extra_headers: Vec<(String, String)>,
    /// Timeout and retry settings.
    pub transport: TransportSettings,
}

/// Connection data for a user-supplied endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomEndpointConfig {
    /// Endpoint receiving the JSON POST.
    pub endpoint: Url,
    /// Request field carrying the input text (`input` or `text`).
    pub input_field: String,
    /// Timeout and retry settings.
    pub transport: TransportSettings,
}

/// Parses a provider URL from configuration.
///
/// # Errors
///
/// Returns [`RewriteError::Configuration`] naming `setting` when the URL is
/// invalid.
pub fn parse_provider_url(setting: &str, value: &str) -> Result<Url, RewriteError> {
    Url::parse(value.trim())
        .map_err(|error| RewriteError::configuration(format!("{setting} is invalid: {error}")))
}
