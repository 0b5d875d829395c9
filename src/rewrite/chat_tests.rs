//! Unit tests for the hosted chat backends.

use rstest::rstest;
use serde_json::json;
use url::Url;

use crate::rewrite::{
    ApiKey, Persona, ProviderConfig, RawOutput, ResponsePath, RewriteBackend, RewriteError,
    RewriteRequest, TransportSettings,
};

use super::{ChatBackend, ChatDialect};

fn config(dialect: ChatDialect, api_key: Option<&str>) -> ProviderConfig {
    ProviderConfig {
        base_url: Url::parse("http://127.0.0.1:9/v1/").expect("test URL should parse"),
        api_key: api_key.and_then(ApiKey::new),
        model: "test-model".to_owned(),
        max_tokens: 500,
        temperature: 0.5,
        response_path: ResponsePath::parse(dialect.default_response_path())
            .expect("default path should parse"),
        extra_headers: Vec::new(),
        transport: TransportSettings::default(),
    }
}

#[rstest]
#[case(ChatDialect::OpenAi, "OPENAI_API_KEY")]
#[case(ChatDialect::Anthropic, "ANTHROPIC_API_KEY")]
fn fetch_requires_api_key(#[case] dialect: ChatDialect, #[case] hint: &str) {
    let backend = ChatBackend::new(dialect, config(dialect, None));
    let request = RewriteRequest::new("I hate you", Persona::Harsh);

    let error = backend
        .fetch(&request)
        .expect_err("missing key should be rejected");

    let RewriteError::Configuration { message } = error else {
        panic!("expected configuration error, got {error:?}");
    };
    assert!(message.contains(hint));
}

#[rstest]
#[case(ChatDialect::OpenAi, "http://127.0.0.1:9/v1/chat/completions")]
#[case(ChatDialect::Anthropic, "http://127.0.0.1:9/v1/messages")]
fn endpoint_joins_base_url_without_double_slash(
    #[case] dialect: ChatDialect,
    #[case] expected: &str,
) {
    let backend = ChatBackend::new(dialect, config(dialect, Some("key")));

    assert_eq!(backend.endpoint(), expected);
}

#[test]
fn openai_payload_carries_system_message() {
    let backend = ChatBackend::new(ChatDialect::OpenAi, config(ChatDialect::OpenAi, None));

    let payload = serde_json::to_value(backend.payload("be strict", "I hate you"))
        .expect("payload should serialise");

    assert_eq!(
        payload,
        json!({
            "model": "test-model",
            "messages": [
                {"role": "system", "content": "be strict"},
                {"role": "user", "content": "I hate you"}
            ],
            "max_tokens": 500,
            "temperature": 0.5
        })
    );
}

#[test]
fn anthropic_payload_lifts_system_prompt() {
    let backend = ChatBackend::new(ChatDialect::Anthropic, config(ChatDialect::Anthropic, None));

    let payload = serde_json::to_value(backend.payload("be gentle", "I hate you"))
        .expect("payload should serialise");

    assert_eq!(payload["system"], "be gentle");
    assert_eq!(
        payload["messages"],
        json!([{"role": "user", "content": "I hate you"}])
    );
}

#[rstest]
#[case(ChatDialect::OpenAi, json!({"choices": [{"message": {"content": "改寫：你好"}}]}))]
#[case(ChatDialect::Anthropic, json!({"content": [{"type": "text", "text": "改寫：你好"}]}))]
fn read_body_extracts_text(#[case] dialect: ChatDialect, #[case] body: serde_json::Value) {
    let backend = ChatBackend::new(dialect, config(dialect, None));

    let output = backend
        .read_body(body.to_string())
        .expect("body should be readable");

    assert_eq!(output, RawOutput::Text("改寫：你好".to_owned()));
}

#[rstest]
#[case("{\"choices\": []}")]
#[case("<html>bad gateway</html>")]
fn read_body_marks_missing_text(#[case] body: &str) {
    let backend = ChatBackend::new(ChatDialect::OpenAi, config(ChatDialect::OpenAi, None));

    let output = backend
        .read_body(body.to_owned())
        .expect("missing text is recovered by the parser");

    assert_eq!(
        output,
        RawOutput::Missing {
            body: body.to_owned()
        }
    );
}

#[test]
fn read_body_rejects_empty_body() {
    let backend = ChatBackend::new(ChatDialect::OpenAi, config(ChatDialect::OpenAi, None));

    let error = backend
        .read_body("  ".to_owned())
        .expect_err("empty body should be rejected");

    assert!(matches!(error, RewriteError::UpstreamFormat { .. }));
}
