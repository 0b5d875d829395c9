//! Shared HTTP plumbing for provider backends.

use http::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};

use super::config::TransportSettings;
use super::error::RewriteError;

const ERROR_BODY_LIMIT: usize = 160;

/// Sends a request built by `build`, retrying transient failures, and
/// returns the body of the first successful response.
pub(super) fn send_with_retry(
    provider: &str,
    transport: &TransportSettings,
    build: impl Fn(&Client) -> RequestBuilder,
) -> Result<String, RewriteError> {
    let client = create_http_client(provider, transport)?;

    transport.retry.run(provider, |attempt| {
        tracing::debug!(provider, attempt, "dispatching rewrite request");
        let response = build(&client)
            .send()
            .map_err(|error| map_transport_error(provider, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().map_or_else(
                |_| "(failed to read error response body)".to_owned(),
                |content| truncate_for_message(content.as_str(), ERROR_BODY_LIMIT),
            );
            return Err(map_status_error(provider, status, body.as_str()));
        }

        response
            .text()
            .map_err(|error| map_transport_error(provider, error))
    })
}

fn create_http_client(provider: &str, transport: &TransportSettings) -> Result<Client, RewriteError> {
    Client::builder()
        .timeout(transport.timeout)
        .build()
        .map_err(|error| {
            RewriteError::configuration(format!(
                "failed to configure HTTP client for {provider}: {error}"
            ))
        })
}

/// Timeouts and connection failures are transient; anything else the
/// transport reports (redirect loops, invalid requests) is not.
fn map_transport_error(provider: &str, error: reqwest::Error) -> RewriteError {
    let retryable = error.is_timeout() || error.is_connect();
    let kind = if error.is_timeout() {
        "timed out"
    } else if error.is_connect() {
        "could not connect"
    } else {
        "failed"
    };

    // Custom endpoints may carry tokens in the query string.
    RewriteError::Transport {
        message: format!("{provider} request {kind}: {}", error.without_url()),
        retryable,
    }
}

pub(super) fn map_status_error(provider: &str, status: StatusCode, body: &str) -> RewriteError {
    if is_auth_failure(status) {
        return RewriteError::configuration(format!(
            "{provider} rejected the credential with status {}",
            status.as_u16()
        ));
    }

    if status.is_client_error() {
        return RewriteError::configuration(format!(
            "{provider} rejected the request with status {}: {body}",
            status.as_u16()
        ));
    }

    RewriteError::Transport {
        message: format!("{provider} failed with status {}: {body}", status.as_u16()),
        retryable: status.is_server_error(),
    }
}

const fn is_auth_failure(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
}

pub(super) fn truncate_for_message(message: &str, max_chars: usize) -> String {
    let mut output = String::new();
    let mut chars = message.chars();

    for _ in 0..max_chars {
        let Some(character) = chars.next() else {
            return output;
        };
        output.push(character);
    }

    if chars.next().is_some() {
        output.push_str("...");
    }

    output
}
