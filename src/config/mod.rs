//! Application configuration loaded from CLI, environment, and files.
//!
//! This module provides a unified configuration struct that merges values
//! from command-line arguments, environment variables, and configuration
//! files using ortho-config's layered approach.
//!
//! # Precedence
//!
//! Configuration values are loaded with the following precedence (lowest to
//! highest):
//!
//! 1. **Defaults** – Built-in application defaults
//! 2. **Configuration file** – `.panopticon.toml` in current directory, home
//!    directory, or XDG config directory
//! 3. **Environment variables** – `PANOPTICON_*`, plus the provider-standard
//!    `OPENAI_API_KEY` and `ANTHROPIC_API_KEY` as key fallbacks
//! 4. **Command-line arguments** – `--text`/`-t`, `--provider`/`-p`, and so on
//!
//! # Configuration File
//!
//! ```toml
//! provider = "gentle"
//! granularity = "word"
//! markup = "terminal"
//! anthropic_model = "claude-3-opus-20240229"
//! timeout_seconds = 30
//! ```

use std::env;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use crate::diff::{Granularity, MarkupFormat};
use crate::pipeline::ReportSettings;
use crate::rewrite::{
    ApiKey, ChatDialect, DEFAULT_ANTHROPIC_VERSION, InboundRequest, ProviderConfig,
    ProviderSelector, ProviderSet, ResponseParser, ResponsePath, RetryPolicy, RewriteError,
    TransportSettings, parse_provider_url,
};

const DEFAULT_PROVIDER: &str = "strict";
const DEFAULT_CUSTOM_INPUT_FIELD: &str = "input";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4";
const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-opus-20240229";
const DEFAULT_MAX_TOKENS: u32 = 500;
const DEFAULT_TEMPERATURE: f32 = 0.5;
const DEFAULT_TIMEOUT_SECONDS: u64 = 20;
const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 250;
const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 2_000;

/// Application configuration supporting CLI, environment, and file sources.
///
/// # Environment Variables
///
/// - `PANOPTICON_TEXT` or `--text`: Sentence to rewrite
/// - `PANOPTICON_PROVIDER` or `--provider`: `strict`, `gentle`, or `custom`
/// - `PANOPTICON_CUSTOM_ENDPOINT` or `--custom-endpoint`: Custom endpoint URL
/// - `PANOPTICON_OPENAI_API_KEY`, `OPENAI_API_KEY`, or `--openai-api-key`
/// - `PANOPTICON_ANTHROPIC_API_KEY`, `ANTHROPIC_API_KEY`, or
///   `--anthropic-api-key`
///
/// # Example
///
/// ```no_run
/// use ortho_config::OrthoConfig;
/// use panopticon::PanopticonConfig;
///
/// let config = PanopticonConfig::load().expect("failed to load configuration");
/// let providers = config.provider_set().expect("providers should be valid");
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "PANOPTICON",
    discovery(
        dotfile_name = ".panopticon.toml",
        config_file_name = "panopticon.toml",
        app_name = "panopticon"
    )
)]
pub struct PanopticonConfig {
    /// Sentence to rewrite.
    ///
    /// Can be provided via:
    /// - CLI: `--text <TEXT>` or `-t <TEXT>`
    /// - Environment: `PANOPTICON_TEXT`
    #[ortho_config(cli_short = 't')]
    pub text: Option<String>,

    /// Rewrite provider: `strict` (OpenAI-compatible, harsh persona),
    /// `gentle` (Anthropic-compatible, gentle persona), or `custom`.
    ///
    /// Defaults to `strict`.
    #[ortho_config(cli_short = 'p')]
    pub provider: String,

    /// Endpoint URL for the `custom` provider.
    #[ortho_config(cli_short = 'e')]
    pub custom_endpoint: Option<String>,

    /// Request field carrying the text for the `custom` provider
    /// (`input` or `text`). Defaults to `input`.
    #[ortho_config()]
    pub custom_input_field: String,

    /// Base URL of the OpenAI-compatible API.
    #[ortho_config()]
    pub openai_base_url: String,

    /// Model requested from the OpenAI-compatible API.
    #[ortho_config()]
    pub openai_model: String,

    /// API key for the OpenAI-compatible API.
    ///
    /// Can be provided via:
    /// - CLI: `--openai-api-key <KEY>`
    /// - Environment: `PANOPTICON_OPENAI_API_KEY` or `OPENAI_API_KEY`
    /// - Config file: `openai_api_key = "..."`
    #[ortho_config()]
    pub openai_api_key: Option<String>,

    /// Dotted path to the generated text in OpenAI-compatible responses.
    /// Defaults to `choices.0.message.content`.
    #[ortho_config()]
    pub openai_response_path: Option<String>,

    /// Base URL of the Anthropic-compatible API.
    #[ortho_config()]
    pub anthropic_base_url: String,

    /// Model requested from the Anthropic-compatible API.
    #[ortho_config()]
    pub anthropic_model: String,

    /// API key for the Anthropic-compatible API.
    ///
    /// Can be provided via:
    /// - CLI: `--anthropic-api-key <KEY>`
    /// - Environment: `PANOPTICON_ANTHROPIC_API_KEY` or `ANTHROPIC_API_KEY`
    /// - Config file: `anthropic_api_key = "..."`
    #[ortho_config()]
    pub anthropic_api_key: Option<String>,

    /// Dotted path to the generated text in Anthropic-compatible responses.
    /// Defaults to `content.0.text`.
    #[ortho_config()]
    pub anthropic_response_path: Option<String>,

    /// Value of the `anthropic-version` header.
    #[ortho_config()]
    pub anthropic_version: String,

    /// Upper bound on generated tokens for hosted providers.
    #[ortho_config()]
    pub max_tokens: u32,

    /// Sampling temperature for hosted providers.
    #[ortho_config()]
    pub temperature: f32,

    /// Per-attempt HTTP timeout in seconds.
    #[ortho_config()]
    pub timeout_seconds: u64,

    /// Total attempts per request, including the first.
    #[ortho_config()]
    pub retry_max_attempts: u32,

    /// Initial retry backoff in milliseconds.
    #[ortho_config()]
    pub retry_base_delay_ms: u64,

    /// Upper bound on a single retry backoff in milliseconds.
    #[ortho_config()]
    pub retry_max_delay_ms: u64,

    /// Diff token granularity: `character` or `word`.
    #[ortho_config(cli_short = 'g')]
    pub granularity: String,

    /// Diff markup: `html` or `terminal`.
    #[ortho_config()]
    pub markup: String,

    /// Extra label marking the rewritten sentence in provider output.
    #[ortho_config()]
    pub rewritten_label: Option<String>,

    /// Extra label marking the explanation in provider output.
    #[ortho_config()]
    pub explanation_label: Option<String>,

    /// Writes telemetry events to stderr as JSON lines.
    ///
    /// Can be provided via:
    /// - CLI: `--telemetry`
    /// - Config file: `telemetry = true`
    ///
    /// Note: `PANOPTICON_TELEMETRY` is not supported because `ortho_config`
    /// does not load boolean values from the environment.
    #[ortho_config()]
    pub telemetry: bool,
}

impl Default for PanopticonConfig {
    fn default() -> Self {
        Self {
            text: None,
            provider: DEFAULT_PROVIDER.to_owned(),
            custom_endpoint: None,
            custom_input_field: DEFAULT_CUSTOM_INPUT_FIELD.to_owned(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_owned(),
            openai_model: DEFAULT_OPENAI_MODEL.to_owned(),
            openai_api_key: None,
            openai_response_path: None,
            anthropic_base_url: DEFAULT_ANTHROPIC_BASE_URL.to_owned(),
            anthropic_model: DEFAULT_ANTHROPIC_MODEL.to_owned(),
            anthropic_api_key: None,
            anthropic_response_path: None,
            anthropic_version: DEFAULT_ANTHROPIC_VERSION.to_owned(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            retry_max_attempts: DEFAULT_RETRY_MAX_ATTEMPTS,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            retry_max_delay_ms: DEFAULT_RETRY_MAX_DELAY_MS,
            granularity: Granularity::default().label().to_owned(),
            markup: MarkupFormat::default().label().to_owned(),
            rewritten_label: None,
            explanation_label: None,
            telemetry: false,
        }
    }
}

impl PanopticonConfig {
    /// Resolves the OpenAI key from configuration or `OPENAI_API_KEY`.
    #[must_use]
    pub fn resolve_openai_api_key(&self) -> Option<ApiKey> {
        resolve_key(self.openai_api_key.as_deref(), "OPENAI_API_KEY")
    }

    /// Resolves the Anthropic key from configuration or `ANTHROPIC_API_KEY`.
    #[must_use]
    pub fn resolve_anthropic_api_key(&self) -> Option<ApiKey> {
        resolve_key(self.anthropic_api_key.as_deref(), "ANTHROPIC_API_KEY")
    }

    /// Parses the selected provider.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError::Configuration`] for unknown providers.
    pub fn provider_selector(&self) -> Result<ProviderSelector, RewriteError> {
        self.provider
            .parse::<ProviderSelector>()
            .map_err(|error| RewriteError::configuration(error.to_string()))
    }

    /// Parses the diff granularity.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError::Configuration`] for unknown granularities.
    pub fn granularity(&self) -> Result<Granularity, RewriteError> {
        self.granularity
            .parse::<Granularity>()
            .map_err(|error| RewriteError::configuration(error.to_string()))
    }

    /// Parses the diff markup format.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError::Configuration`] for unknown formats.
    pub fn markup_format(&self) -> Result<MarkupFormat, RewriteError> {
        self.markup
            .parse::<MarkupFormat>()
            .map_err(|error| RewriteError::configuration(error.to_string()))
    }

    /// Timeout and retry settings shared by all providers.
    #[must_use]
    pub fn transport_settings(&self) -> TransportSettings {
        TransportSettings {
            timeout: Duration::from_secs(self.timeout_seconds),
            retry: RetryPolicy::new(
                self.retry_max_attempts,
                Duration::from_millis(self.retry_base_delay_ms),
                Duration::from_millis(self.retry_max_delay_ms),
            ),
        }
    }

    /// Connection settings for the OpenAI-compatible provider.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError::Configuration`] when the base URL or response
    /// path is invalid.
    pub fn openai_provider_config(&self) -> Result<ProviderConfig, RewriteError> {
        Ok(ProviderConfig {
            base_url: parse_provider_url("openai_base_url", self.openai_base_url.as_str())?,
            api_key: self.resolve_openai_api_key(),
            model: self.openai_model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            response_path: response_path(
                self.openai_response_path.as_deref(),
                ChatDialect::OpenAi,
            )?,
            extra_headers: Vec::new(),
            transport: self.transport_settings(),
        })
    }

    /// Connection settings for the Anthropic-compatible provider.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError::Configuration`] when the base URL or response
    /// path is invalid.
    pub fn anthropic_provider_config(&self) -> Result<ProviderConfig, RewriteError> {
        Ok(ProviderConfig {
            base_url: parse_provider_url("anthropic_base_url", self.anthropic_base_url.as_str())?,
            api_key: self.resolve_anthropic_api_key(),
            model: self.anthropic_model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            response_path: response_path(
                self.anthropic_response_path.as_deref(),
                ChatDialect::Anthropic,
            )?,
            extra_headers: vec![(
                "anthropic-version".to_owned(),
                self.anthropic_version.clone(),
            )],
            transport: self.transport_settings(),
        })
    }

    /// Builds every configured provider.
    ///
    /// Missing keys are not rejected here; the provider that needs one
    /// reports it when called.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError::Configuration`] when a provider setting is
    /// invalid.
    pub fn provider_set(&self) -> Result<ProviderSet, RewriteError> {
        Ok(ProviderSet::new(
            self.openai_provider_config()?,
            self.anthropic_provider_config()?,
            self.custom_input_field(),
            self.transport_settings(),
        ))
    }

    /// Response parser with the default labels plus any configured extras.
    #[must_use]
    pub fn response_parser(&self) -> ResponseParser {
        let with_rewritten = self
            .rewritten_label
            .iter()
            .fold(ResponseParser::default(), |parser, label| {
                parser.with_rewritten_label(label.as_str())
            });
        self.explanation_label
            .iter()
            .fold(with_rewritten, |parser, label| {
                parser.with_explanation_label(label.as_str())
            })
    }

    /// Parser, granularity, and markup for rewrite reports.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError::Configuration`] when the granularity or markup
    /// is unknown.
    pub fn report_settings(&self) -> Result<ReportSettings, RewriteError> {
        Ok(ReportSettings {
            parser: self.response_parser(),
            granularity: self.granularity()?,
            markup: self.markup_format()?,
        })
    }

    /// Request assembled from the configured text and provider.
    ///
    /// Blank text is left for [`InboundRequest::validate`] to reject.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError::Configuration`] for unknown providers.
    pub fn inbound_request(&self) -> Result<InboundRequest, RewriteError> {
        Ok(InboundRequest {
            text: self.text.clone().unwrap_or_default(),
            provider: self.provider_selector()?,
            custom_endpoint: self.custom_endpoint.clone(),
        })
    }

    fn custom_input_field(&self) -> String {
        let field = self.custom_input_field.trim();
        if field.is_empty() {
            DEFAULT_CUSTOM_INPUT_FIELD.to_owned()
        } else {
            field.to_owned()
        }
    }
}

fn resolve_key(configured: Option<&str>, fallback_var: &str) -> Option<ApiKey> {
    configured
        .and_then(ApiKey::new)
        .or_else(|| env::var(fallback_var).ok().and_then(ApiKey::new))
}

fn response_path(
    configured: Option<&str>,
    dialect: ChatDialect,
) -> Result<ResponsePath, RewriteError> {
    ResponsePath::parse(configured.unwrap_or_else(|| dialect.default_response_path()))
}

#[cfg(test)]
mod tests;
