//! Backend contract and provider selection.

use super::chat::{ChatBackend, ChatDialect};
use super::config::{CustomEndpointConfig, ProviderConfig, TransportSettings};
use super::custom::CustomBackend;
use super::error::RewriteError;
use super::model::{ProviderSelector, RawOutput, RewriteRequest, RewriteResult, ValidatedRequest};
use super::parser::ResponseParser;

/// Shared rewrite contract implemented by every provider.
pub trait RewriteBackend: Send + Sync + std::fmt::Debug {
    /// Provider name used in logs, telemetry, and errors.
    fn provider(&self) -> &str;

    /// Calls the provider and returns its output before parsing.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError`] when the provider is misconfigured,
    /// unreachable after retries, or answers with an empty body.
    fn fetch(&self, request: &RewriteRequest) -> Result<RawOutput, RewriteError>;

    /// Calls the provider and normalises its output.
    ///
    /// Unusable output keeps the original text rather than failing.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError`] when [`RewriteBackend::fetch`] fails.
    fn rewrite(
        &self,
        request: &RewriteRequest,
        parser: &ResponseParser,
    ) -> Result<RewriteResult, RewriteError> {
        let output = self.fetch(request)?;
        let result = parser.interpret(&output, request.text());
        tracing::debug!(
            provider = self.provider(),
            rule = result.rule.label(),
            "parsed provider output"
        );
        Ok(result)
    }
}

/// Backend chosen for a single request.
#[derive(Debug)]
pub enum Backend<'a> {
    /// OpenAI-compatible provider with the harsh persona.
    Strict(&'a ChatBackend),
    /// Anthropic-compatible provider with the gentle persona.
    Gentle(&'a ChatBackend),
    /// Endpoint supplied with the request.
    Custom(CustomBackend),
}

impl Backend<'_> {
    fn inner(&self) -> &dyn RewriteBackend {
        match self {
            Self::Strict(backend) | Self::Gentle(backend) => *backend,
            Self::Custom(backend) => backend,
        }
    }
}

impl RewriteBackend for Backend<'_> {
    fn provider(&self) -> &str {
        self.inner().provider()
    }

    fn fetch(&self, request: &RewriteRequest) -> Result<RawOutput, RewriteError> {
        self.inner().fetch(request)
    }
}

/// Configured providers, built once at start-up.
#[derive(Debug, Clone)]
pub struct ProviderSet {
    strict: ChatBackend,
    gentle: ChatBackend,
    custom_input_field: String,
    custom_transport: TransportSettings,
}

impl ProviderSet {
    /// Creates the provider set. The custom endpoint arrives with each
    /// request, so only its request field and transport are fixed here.
    #[must_use]
    pub fn new(
        openai: ProviderConfig,
        anthropic: ProviderConfig,
        custom_input_field: impl Into<String>,
        custom_transport: TransportSettings,
    ) -> Self {
        Self {
            strict: ChatBackend::new(ChatDialect::OpenAi, openai),
            gentle: ChatBackend::new(ChatDialect::Anthropic, anthropic),
            custom_input_field: custom_input_field.into(),
            custom_transport,
        }
    }

    /// Resolves the backend for a validated request.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError::Validation`] when the custom provider is
    /// selected without an endpoint.
    pub fn select(&self, request: &ValidatedRequest) -> Result<Backend<'_>, RewriteError> {
        match request.provider() {
            ProviderSelector::Strict => Ok(Backend::Strict(&self.strict)),
            ProviderSelector::Gentle => Ok(Backend::Gentle(&self.gentle)),
            ProviderSelector::Custom => {
                let endpoint = request.custom_endpoint().ok_or_else(|| {
                    RewriteError::validation(
                        "a custom endpoint URL is required for the custom provider",
                    )
                })?;
                Ok(Backend::Custom(CustomBackend::new(CustomEndpointConfig {
                    endpoint: endpoint.clone(),
                    input_field: self.custom_input_field.clone(),
                    transport: self.custom_transport,
                })))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use url::Url;

    use super::{Backend, ProviderSet, RewriteBackend};
    use crate::rewrite::test_support::StubRewriteBackend;
    use crate::rewrite::{
        InboundRequest, ParseRule, Persona, ProviderConfig, ProviderSelector, RawOutput,
        ResponseParser, ResponsePath, RewriteError, RewriteRequest, TransportSettings,
    };

    fn provider_config(path: &str) -> ProviderConfig {
        ProviderConfig {
            base_url: Url::parse("http://127.0.0.1:9/v1").expect("test URL should parse"),
            api_key: None,
            model: "test-model".to_owned(),
            max_tokens: 500,
            temperature: 0.5,
            response_path: ResponsePath::parse(path).expect("path should parse"),
            extra_headers: Vec::new(),
            transport: TransportSettings::default(),
        }
    }

    fn provider_set() -> ProviderSet {
        ProviderSet::new(
            provider_config("choices.0.message.content"),
            provider_config("content.0.text"),
            "text",
            TransportSettings::default(),
        )
    }

    #[rstest]
    #[case(ProviderSelector::Strict, "openai")]
    #[case(ProviderSelector::Gentle, "anthropic")]
    #[case(ProviderSelector::Custom, "custom")]
    fn select_maps_selector_to_backend(
        #[case] provider: ProviderSelector,
        #[case] expected: &str,
    ) {
        let providers = provider_set();
        let validated = InboundRequest {
            text: "I hate you".to_owned(),
            provider,
            custom_endpoint: Some("https://rewrite.example.com/api".to_owned()),
        }
        .validate()
        .expect("request should be valid");

        let backend = providers.select(&validated).expect("backend should resolve");

        assert_eq!(backend.provider(), expected);
    }

    #[test]
    fn custom_backend_uses_configured_input_field() {
        let providers = provider_set();
        let validated = InboundRequest {
            text: "I hate you".to_owned(),
            provider: ProviderSelector::Custom,
            custom_endpoint: Some("https://rewrite.example.com/api".to_owned()),
        }
        .validate()
        .expect("request should be valid");

        let Ok(Backend::Custom(backend)) = providers.select(&validated) else {
            panic!("expected custom backend");
        };

        assert!(format!("{backend:?}").contains("input_field: \"text\""));
    }

    #[test]
    fn rewrite_parses_fetched_output() {
        let backend = StubRewriteBackend::text("改寫：我不太喜歡你\n解釋：語氣較溫和");
        let request = RewriteRequest::new("I hate you", Persona::Gentle);

        let result = backend
            .rewrite(&request, &ResponseParser::default())
            .expect("stub should succeed");

        assert_eq!(result.rule, ParseRule::Labelled);
        assert_eq!(result.rewritten_text, "我不太喜歡你");
    }

    #[test]
    fn rewrite_keeps_original_for_missing_output() {
        let backend = StubRewriteBackend::output(RawOutput::Missing {
            body: "{}".to_owned(),
        });
        let request = RewriteRequest::new("I hate you", Persona::Harsh);

        let result = backend
            .rewrite(&request, &ResponseParser::default())
            .expect("missing output is recovered");

        assert!(result.kept_original());
        assert_eq!(result.rewritten_text, "I hate you");
    }

    #[test]
    fn rewrite_propagates_fetch_errors() {
        let backend = StubRewriteBackend::failure(RewriteError::Transport {
            message: "timed out".to_owned(),
            retryable: true,
        });
        let request = RewriteRequest::new("I hate you", Persona::Harsh);

        let result = backend.rewrite(&request, &ResponseParser::default());

        assert!(matches!(result, Err(RewriteError::Transport { .. })));
    }
}
