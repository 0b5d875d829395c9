//! Backend for user-hosted rewrite endpoints.
//!
//! The endpoint receives `{"<input_field>": text}` and may answer with
//! `{"output": ..}`, `{"rewritten": .., "explanation": ..}`, `{"text": ..}`,
//! or a plain-text body.

use reqwest::blocking::Client;
use serde_json::{Map, Value};

use super::backend::RewriteBackend;
use super::config::CustomEndpointConfig;
use super::error::RewriteError;
use super::http::send_with_retry;
use super::model::{RawOutput, RewriteRequest};

const PROVIDER: &str = "custom";

/// Rewrite backend posting to an arbitrary endpoint.
#[derive(Debug, Clone)]
pub struct CustomBackend {
    config: CustomEndpointConfig,
}

impl CustomBackend {
    /// Creates a backend from explicit configuration.
    #[must_use]
    pub const fn new(config: CustomEndpointConfig) -> Self {
        Self { config }
    }
}

impl RewriteBackend for CustomBackend {
    fn provider(&self) -> &str {
        PROVIDER
    }

    fn fetch(&self, request: &RewriteRequest) -> Result<RawOutput, RewriteError> {
        let mut fields = Map::new();
        fields.insert(
            self.config.input_field.clone(),
            Value::String(request.text().to_owned()),
        );
        let payload = Value::Object(fields);

        let body = send_with_retry(PROVIDER, &self.config.transport, |client: &Client| {
            client.post(self.config.endpoint.clone()).json(&payload)
        })?;

        read_body(body)
    }
}

fn read_body(body: String) -> Result<RawOutput, RewriteError> {
    if body.trim().is_empty() {
        return Err(RewriteError::UpstreamFormat {
            message: "custom endpoint returned an empty response body".to_owned(),
        });
    }

    match serde_json::from_str::<Value>(body.as_str()) {
        Ok(Value::Object(fields)) => Ok(read_fields(&fields, body)),
        Ok(Value::String(text)) => Ok(RawOutput::Text(text)),
        Ok(_) => {
            tracing::warn!(provider = PROVIDER, "response JSON was not an object");
            Ok(RawOutput::Missing { body })
        }
        // Endpoints that answer with bare text are accepted as-is.
        Err(_) => Ok(RawOutput::Text(body)),
    }
}

/// Reads each field independently; a mistyped field is skipped.
fn read_fields(fields: &Map<String, Value>, body: String) -> RawOutput {
    if let Some(rewritten) = text_field(fields, "rewritten") {
        return RawOutput::Structured {
            rewritten: rewritten.to_owned(),
            explanation: fields
                .get("explanation")
                .and_then(Value::as_str)
                .map(str::to_owned),
            body,
        };
    }

    text_field(fields, "output")
        .or_else(|| text_field(fields, "text"))
        .map_or_else(
            || {
                tracing::warn!(
                    provider = PROVIDER,
                    "response had no usable 'output', 'rewritten', or 'text' field"
                );
                RawOutput::Missing { body }
            },
            |text| RawOutput::Text(text.to_owned()),
        )
}

/// String value of `name`, skipped when blank.
fn text_field<'a>(fields: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
}
