//! Hosted chat-completion backends.
//!
//! One implementation covers both OpenAI-compatible chat completions and
//! the Anthropic messages API. The dialects differ only in endpoint path,
//! authentication header, and where the system prompt goes.

use reqwest::blocking::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::Value;

use super::backend::RewriteBackend;
use super::config::{ApiKey, ProviderConfig};
use super::error::RewriteError;
use super::http::send_with_retry;
use super::model::{RawOutput, RewriteRequest};
use super::prompt::{system_prompt, user_prompt};

const ANTHROPIC_VERSION_HEADER: &str = "anthropic-version";
/// API version pinned when none is configured.
pub const DEFAULT_ANTHROPIC_VERSION: &str = "2023-06-01";

/// Wire protocol spoken by a hosted chat provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatDialect {
    /// `POST {base}/chat/completions` with bearer authentication.
    OpenAi,
    /// `POST {base}/messages` with `x-api-key` authentication.
    Anthropic,
}

impl ChatDialect {
    /// Provider name used in logs and errors.
    #[must_use]
    pub const fn provider(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }

    /// Default dotted path to the generated text.
    #[must_use]
    pub const fn default_response_path(self) -> &'static str {
        match self {
            Self::OpenAi => "choices.0.message.content",
            Self::Anthropic => "content.0.text",
        }
    }

    const fn endpoint_path(self) -> &'static str {
        match self {
            Self::OpenAi => "chat/completions",
            Self::Anthropic => "messages",
        }
    }

    const fn key_hint(self) -> &'static str {
        match self {
            Self::OpenAi => concat!(
                "OpenAI API key is required (use --openai-api-key, ",
                "PANOPTICON_OPENAI_API_KEY, or OPENAI_API_KEY)"
            ),
            Self::Anthropic => concat!(
                "Anthropic API key is required (use --anthropic-api-key, ",
                "PANOPTICON_ANTHROPIC_API_KEY, or ANTHROPIC_API_KEY)"
            ),
        }
    }
}

/// Rewrite backend for a hosted chat provider.
#[derive(Debug, Clone)]
pub struct ChatBackend {
    dialect: ChatDialect,
    config: ProviderConfig,
}

impl ChatBackend {
    /// Creates a backend from explicit configuration.
    #[must_use]
    pub const fn new(dialect: ChatDialect, config: ProviderConfig) -> Self {
        Self { dialect, config }
    }

    /// Protocol used by this backend.
    #[must_use]
    pub const fn dialect(&self) -> ChatDialect {
        self.dialect
    }

    fn api_key(&self) -> Result<&ApiKey, RewriteError> {
        self.config
            .api_key
            .as_ref()
            .ok_or_else(|| RewriteError::configuration(self.dialect.key_hint()))
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.config.base_url.as_str().trim_end_matches('/'),
            self.dialect.endpoint_path()
        )
    }

    fn payload<'a>(&'a self, system: &'a str, user: &'a str) -> ChatPayload<'a> {
        let (system_field, messages) = match self.dialect {
            ChatDialect::OpenAi => (
                None,
                vec![
                    ChatMessage {
                        role: "system",
                        content: system,
                    },
                    ChatMessage {
                        role: "user",
                        content: user,
                    },
                ],
            ),
            ChatDialect::Anthropic => (
                Some(system),
                vec![ChatMessage {
                    role: "user",
                    content: user,
                }],
            ),
        };

        ChatPayload {
            model: self.config.model.as_str(),
            system: system_field,
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }

    fn authorise(&self, request: RequestBuilder, api_key: &ApiKey) -> RequestBuilder {
        let authorised = match self.dialect {
            ChatDialect::OpenAi => request.bearer_auth(api_key.expose()),
            ChatDialect::Anthropic => {
                let keyed = request.header("x-api-key", api_key.expose());
                if self.has_extra_header(ANTHROPIC_VERSION_HEADER) {
                    keyed
                } else {
                    keyed.header(ANTHROPIC_VERSION_HEADER, DEFAULT_ANTHROPIC_VERSION)
                }
            }
        };

        self.config
            .extra_headers
            .iter()
            .fold(authorised, |builder, (name, value)| builder.header(name, value))
    }

    fn has_extra_header(&self, name: &str) -> bool {
        self.config
            .extra_headers
            .iter()
            .any(|(header, _)| header.eq_ignore_ascii_case(name))
    }

    /// Extracts generated text from a response body.
    ///
    /// A body without the configured field is not an error: the parser keeps
    /// the original text for [`RawOutput::Missing`].
    fn read_body(&self, body: String) -> Result<RawOutput, RewriteError> {
        let provider = self.dialect.provider();
        if body.trim().is_empty() {
            return Err(RewriteError::UpstreamFormat {
                message: format!("{provider} returned an empty response body"),
            });
        }

        let Ok(value) = serde_json::from_str::<Value>(body.as_str()) else {
            tracing::warn!(provider, "response body was not valid JSON");
            return Ok(RawOutput::Missing { body });
        };

        let text = self.config.response_path.extract_text(&value);
        Ok(text.map_or_else(
            || {
                tracing::warn!(
                    provider,
                    path = self.config.response_path.as_str(),
                    "response did not contain text at the configured path"
                );
                RawOutput::Missing { body }
            },
            |content| RawOutput::Text(content.to_owned()),
        ))
    }
}

impl RewriteBackend for ChatBackend {
    fn provider(&self) -> &str {
        self.dialect.provider()
    }

    fn fetch(&self, request: &RewriteRequest) -> Result<RawOutput, RewriteError> {
        let api_key = self.api_key()?;
        let endpoint = self.endpoint();
        let system = system_prompt(request.persona());
        let user = user_prompt(request);
        let payload = self.payload(system.as_str(), user.as_str());

        let body = send_with_retry(
            self.dialect.provider(),
            &self.config.transport,
            |client: &Client| {
                self.authorise(client.post(endpoint.as_str()), api_key)
                    .json(&payload)
            },
        )?;

        self.read_body(body)
    }
}

#[derive(Debug, Serialize)]
struct ChatPayload<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[cfg(test)]
#[path = "chat_tests.rs"]
mod tests;
