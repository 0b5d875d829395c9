//! Shared domain models for moderation rewrites.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use url::Url;

use super::error::RewriteError;

/// Tone profile applied to the rewrite prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persona {
    /// Strict moderation: remove anything that breaks community rules.
    Harsh,
    /// Gentle moderation: soften tone while keeping the speaker's intent.
    Gentle,
    /// Behaviour defined by an externally hosted model.
    Custom,
}

impl Persona {
    /// Human-readable label used in output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Harsh => "harsh",
            Self::Gentle => "gentle",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.label())
    }
}

/// Rewrite provider chosen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderSelector {
    /// OpenAI-compatible chat completions with the harsh persona.
    Strict,
    /// Anthropic-compatible messages API with the gentle persona.
    Gentle,
    /// Arbitrary endpoint speaking the minimal JSON contract.
    Custom,
}

impl ProviderSelector {
    /// Human-readable label used in output and telemetry.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Gentle => "gentle",
            Self::Custom => "custom",
        }
    }

    /// Persona applied by this provider.
    #[must_use]
    pub const fn persona(self) -> Persona {
        match self {
            Self::Strict => Persona::Harsh,
            Self::Gentle => Persona::Gentle,
            Self::Custom => Persona::Custom,
        }
    }
}

impl fmt::Display for ProviderSelector {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.label())
    }
}

/// Parse error for [`ProviderSelector`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported provider '{value}': valid options are 'strict', 'gentle', or 'custom'")]
pub struct ProviderSelectorParseError {
    value: String,
}

impl FromStr for ProviderSelector {
    type Err = ProviderSelectorParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" | "openai" => Ok(Self::Strict),
            "gentle" | "anthropic" | "claude" => Ok(Self::Gentle),
            "custom" => Ok(Self::Custom),
            _ => Err(ProviderSelectorParseError {
                value: value.to_owned(),
            }),
        }
    }
}

/// Input for a single backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRequest {
    text: String,
    persona: Persona,
}

impl RewriteRequest {
    /// Constructs a request from explicit text and persona values.
    #[must_use]
    pub fn new(text: impl Into<String>, persona: Persona) -> Self {
        Self {
            text: text.into(),
            persona,
        }
    }

    /// Text that should be rewritten.
    #[must_use]
    pub const fn text(&self) -> &str {
        self.text.as_str()
    }

    /// Persona applied to the prompt.
    #[must_use]
    pub const fn persona(&self) -> Persona {
        self.persona
    }
}

/// Raw output returned by a provider before parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawOutput {
    /// Free-form text that still needs the response parser.
    Text(String),
    /// The provider returned separate rewritten and explanation fields.
    Structured {
        /// Rewritten sentence.
        rewritten: String,
        /// Optional explanation of the change.
        explanation: Option<String>,
        /// Body as received.
        body: String,
    },
    /// The response body carried no usable text field.
    Missing {
        /// Body as received, for diagnostics.
        body: String,
    },
}

/// Which rule produced a [`RewriteResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseRule {
    /// An explicit label split the output.
    Labelled,
    /// The first non-empty line was taken as the rewrite.
    MultiLine,
    /// The whole trimmed output was taken as the rewrite.
    WholeText,
    /// The provider returned structured fields.
    Structured,
    /// Nothing usable was returned; the original text was kept.
    Original,
}

impl ParseRule {
    /// Human-readable label used in output and telemetry.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Labelled => "labelled",
            Self::MultiLine => "multi_line",
            Self::WholeText => "whole_text",
            Self::Structured => "structured",
            Self::Original => "original",
        }
    }
}

/// Normalised outcome of a rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteResult {
    /// Rewritten sentence; the original text when nothing usable came back.
    pub rewritten_text: String,
    /// Optional explanation of the change.
    pub explanation: Option<String>,
    /// Provider output the result was parsed from.
    pub raw: String,
    /// Parser rule that produced this result.
    pub rule: ParseRule,
}

impl RewriteResult {
    /// Result that keeps the original text unchanged.
    #[must_use]
    pub fn original(original_text: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            rewritten_text: original_text.into(),
            explanation: None,
            raw: raw.into(),
            rule: ParseRule::Original,
        }
    }

    /// Whether the original text was kept because the output was unusable.
    #[must_use]
    pub fn kept_original(&self) -> bool {
        self.rule == ParseRule::Original
    }
}

/// Request as received from the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundRequest {
    /// Text to rewrite; must be non-empty after trimming.
    pub text: String,
    /// Selected provider.
    pub provider: ProviderSelector,
    /// Endpoint URL, required when `provider` is [`ProviderSelector::Custom`].
    pub custom_endpoint: Option<String>,
}

/// Inbound request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    request: RewriteRequest,
    provider: ProviderSelector,
    custom_endpoint: Option<Url>,
}

impl ValidatedRequest {
    /// Backend request derived from the inbound input.
    #[must_use]
    pub const fn request(&self) -> &RewriteRequest {
        &self.request
    }

    /// Selected provider.
    #[must_use]
    pub const fn provider(&self) -> ProviderSelector {
        self.provider
    }

    /// Parsed custom endpoint, present only for the custom provider.
    #[must_use]
    pub const fn custom_endpoint(&self) -> Option<&Url> {
        self.custom_endpoint.as_ref()
    }
}

impl InboundRequest {
    /// Checks the request before any network call is made.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError::Validation`] when the text is blank, or when
    /// the custom provider is selected without a valid HTTP(S) endpoint.
    pub fn validate(self) -> Result<ValidatedRequest, RewriteError> {
        if self.text.trim().is_empty() {
            return Err(RewriteError::validation("text to rewrite must not be empty"));
        }

        let custom_endpoint = match self.provider {
            ProviderSelector::Custom => Some(parse_custom_endpoint(
                self.custom_endpoint.as_deref(),
            )?),
            ProviderSelector::Strict | ProviderSelector::Gentle => None,
        };

        Ok(ValidatedRequest {
            request: RewriteRequest::new(self.text, self.provider.persona()),
            provider: self.provider,
            custom_endpoint,
        })
    }
}

fn parse_custom_endpoint(raw: Option<&str>) -> Result<Url, RewriteError> {
    let value = raw
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            RewriteError::validation("a custom endpoint URL is required for the custom provider")
        })?;

    let url = Url::parse(value)
        .map_err(|error| RewriteError::validation(format!("custom endpoint is invalid: {error}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(RewriteError::validation(format!(
            "custom endpoint must use http or https, not '{}'",
            url.scheme()
        )));
    }

    Ok(url)
}
