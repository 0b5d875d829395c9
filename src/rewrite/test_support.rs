//! Test-support utilities for rewrite flows.

use super::{RawOutput, RewriteBackend, RewriteError, RewriteRequest};

/// Deterministic backend stub used by unit and integration tests.
#[derive(Debug, Clone)]
pub struct StubRewriteBackend {
    provider: String,
    response: Result<RawOutput, RewriteError>,
}

impl StubRewriteBackend {
    /// Creates a stub that always returns the provided free-form text.
    #[must_use]
    pub fn text(raw: impl Into<String>) -> Self {
        Self::output(RawOutput::Text(raw.into()))
    }

    /// Creates a stub that always returns the provided output.
    #[must_use]
    pub fn output(output: RawOutput) -> Self {
        Self {
            provider: "stub".to_owned(),
            response: Ok(output),
        }
    }

    /// Creates a stub that always returns the provided error.
    #[must_use]
    pub fn failure(error: RewriteError) -> Self {
        Self {
            provider: "stub".to_owned(),
            response: Err(error),
        }
    }

    /// Overrides the reported provider name.
    #[must_use]
    pub fn named(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }
}

impl RewriteBackend for StubRewriteBackend {
    fn provider(&self) -> &str {
        self.provider.as_str()
    }

    fn fetch(&self, _request: &RewriteRequest) -> Result<RawOutput, RewriteError> {
        self.response.clone()
    }
}
