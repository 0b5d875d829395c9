//! Shared helpers for provider integration tests.

use std::error::Error;
use std::io;
use std::time::Duration;

use panopticon::rewrite::{RetryPolicy, TransportSettings};
use tokio::runtime::Runtime;
use wiremock::{Mock, MockServer};

/// Result type for tests that propagate setup failures.
pub type TestResult<T> = Result<T, Box<dyn Error>>;

/// Wiremock server driven by its own runtime.
///
/// Backends use a blocking client, so requests are sent from the test
/// thread while the runtime's workers serve the mock.
pub struct MockProvider {
    server: MockServer,
    runtime: Runtime,
}

impl MockProvider {
    /// Starts a fresh mock server.
    ///
    /// # Errors
    ///
    /// Returns an error if the Tokio runtime cannot be created.
    pub fn start() -> Result<Self, io::Error> {
        let runtime = Runtime::new()?;
        let server = runtime.block_on(MockServer::start());
        Ok(Self { server, runtime })
    }

    /// Base URI of the mock server, without a trailing slash.
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Registers `mock`; expectations are verified when the server drops.
    pub fn mount(&self, mock: Mock) {
        self.runtime.block_on(mock.mount(&self.server));
    }
}

/// Transport with a short timeout and near-instant retries.
pub fn fast_transport(max_attempts: u32) -> TransportSettings {
    TransportSettings {
        timeout: Duration::from_secs(2),
        retry: RetryPolicy::new(max_attempts, Duration::from_millis(1), Duration::from_millis(5)),
    }
}
