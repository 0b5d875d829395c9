//! Integration tests for the hosted chat backends against a mock HTTP server.

#![expect(
    clippy::panic_in_result_fn,
    reason = "Test assertions are expected to panic on failure"
)]

use std::time::Duration;

use panopticon::rewrite::{
    ApiKey, ChatBackend, ChatDialect, ErrorCategory, ParseRule, Persona, ProviderConfig,
    ResponseParser, ResponsePath, RetryPolicy, RewriteBackend, RewriteError, RewriteRequest,
    TransportSettings,
};
use rstest::{fixture, rstest};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

mod support;

use support::{MockProvider, TestResult, fast_transport};

fn backend(
    server: &MockProvider,
    dialect: ChatDialect,
    transport: TransportSettings,
) -> TestResult<ChatBackend> {
    let config = ProviderConfig {
        base_url: Url::parse(format!("{}/v1", server.uri()).as_str())?,
        api_key: ApiKey::new("sk-test"),
        model: "test-model".to_owned(),
        max_tokens: 500,
        temperature: 0.5,
        response_path: ResponsePath::parse(dialect.default_response_path())?,
        extra_headers: Vec::new(),
        transport,
    };
    Ok(ChatBackend::new(dialect, config))
}

fn openai_body(content: &str) -> serde_json::Value {
    json!({"choices": [{"message": {"role": "assistant", "content": content}}]})
}

#[fixture]
fn harsh_request() -> RewriteRequest {
    RewriteRequest::new("我討厭你", Persona::Harsh)
}

#[rstest]
fn openai_dialect_sends_bearer_auth_and_parses_labels(
    harsh_request: RewriteRequest,
) -> TestResult<()> {
    let server = MockProvider::start()?;
    server.mount(
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({"model": "test-model", "max_tokens": 500})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(openai_body("改寫：我不太喜歡你\n解釋：語氣較溫和")),
            )
            .expect(1),
    );
    let chat = backend(&server, ChatDialect::OpenAi, fast_transport(1))?;

    let result = chat.rewrite(&harsh_request, &ResponseParser::default())?;

    assert_eq!(result.rewritten_text, "我不太喜歡你");
    assert_eq!(result.explanation.as_deref(), Some("語氣較溫和"));
    assert_eq!(result.rule, ParseRule::Labelled);
    Ok(())
}

#[rstest]
fn anthropic_dialect_sends_key_and_version_headers() -> TestResult<()> {
    let server = MockProvider::start()?;
    server.mount(
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-test"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_partial_json(json!({
                "messages": [{"role": "user"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": "我不太喜歡你"}]
            })))
            .expect(1),
    );
    let chat = backend(&server, ChatDialect::Anthropic, fast_transport(1))?;
    let request = RewriteRequest::new("我討厭你", Persona::Gentle);

    let result = chat.rewrite(&request, &ResponseParser::default())?;

    assert_eq!(result.rewritten_text, "我不太喜歡你");
    assert_eq!(result.rule, ParseRule::WholeText);
    Ok(())
}

#[rstest]
fn server_errors_are_retried_until_attempts_run_out(
    harsh_request: RewriteRequest,
) -> TestResult<()> {
    let server = MockProvider::start()?;
    server.mount(
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .expect(3),
    );
    let chat = backend(&server, ChatDialect::OpenAi, fast_transport(3))?;

    let error = chat
        .fetch(&harsh_request)
        .expect_err("persistent 500s should fail");

    assert_eq!(error.category(), ErrorCategory::Transient);
    assert!(error.user_message().contains("try again"));
    Ok(())
}

#[rstest]
fn server_error_followed_by_success_recovers(harsh_request: RewriteRequest) -> TestResult<()> {
    let server = MockProvider::start()?;
    server.mount(
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1),
    );
    server.mount(
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(openai_body("我不太喜歡你")))
            .expect(1),
    );
    let chat = backend(&server, ChatDialect::OpenAi, fast_transport(3))?;

    let result = chat.rewrite(&harsh_request, &ResponseParser::default())?;

    assert_eq!(result.rewritten_text, "我不太喜歡你");
    Ok(())
}

#[rstest]
#[case::unauthorised(401)]
#[case::bad_request(400)]
#[case::rate_limited(429)]
fn client_errors_are_not_retried(
    harsh_request: RewriteRequest,
    #[case] status: u16,
) -> TestResult<()> {
    let server = MockProvider::start()?;
    server.mount(
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(status).set_body_string("Incorrect key sk-test"))
            .expect(1),
    );
    let chat = backend(&server, ChatDialect::OpenAi, fast_transport(3))?;

    let error = chat
        .fetch(&harsh_request)
        .expect_err("client errors should fail");

    assert_eq!(error.category(), ErrorCategory::Configuration);
    assert!(!error.is_retryable());
    Ok(())
}

#[rstest]
fn slow_responses_time_out_as_transient(harsh_request: RewriteRequest) -> TestResult<()> {
    let server = MockProvider::start()?;
    server.mount(
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(openai_body("too late"))
                    .set_delay(Duration::from_secs(2)),
            ),
    );
    let transport = TransportSettings {
        timeout: Duration::from_millis(200),
        retry: RetryPolicy::new(1, Duration::from_millis(1), Duration::from_millis(1)),
    };
    let chat = backend(&server, ChatDialect::OpenAi, transport)?;

    let error = chat
        .fetch(&harsh_request)
        .expect_err("the request should time out");

    assert!(
        matches!(error, RewriteError::Transport { retryable: true, .. }),
        "expected a retryable transport error, got {error:?}"
    );
    Ok(())
}

#[rstest]
fn missing_response_field_keeps_the_original(harsh_request: RewriteRequest) -> TestResult<()> {
    let server = MockProvider::start()?;
    server.mount(
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []}))),
    );
    let chat = backend(&server, ChatDialect::OpenAi, fast_transport(1))?;

    let result = chat.rewrite(&harsh_request, &ResponseParser::default())?;

    assert!(result.kept_original());
    assert_eq!(result.rewritten_text, "我討厭你");
    Ok(())
}

#[rstest]
fn empty_body_is_an_upstream_format_error(harsh_request: RewriteRequest) -> TestResult<()> {
    let server = MockProvider::start()?;
    server.mount(
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200)),
    );
    let chat = backend(&server, ChatDialect::OpenAi, fast_transport(1))?;

    let error = chat
        .fetch(&harsh_request)
        .expect_err("an empty body should fail");

    assert_eq!(error.category(), ErrorCategory::MalformedResponse);
    Ok(())
}
