//! Rewrite backends and the parser that normalises their output.

mod backend;
mod chat;
mod config;
mod custom;
mod error;
mod http;
mod model;
mod parser;
mod prompt;
mod retry;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use backend::{Backend, ProviderSet, RewriteBackend};
pub use chat::{ChatBackend, ChatDialect, DEFAULT_ANTHROPIC_VERSION};
pub use config::{
    ApiKey, CustomEndpointConfig, ProviderConfig, ResponsePath, TransportSettings,
    parse_provider_url,
};
pub use custom::CustomBackend;
pub use error::{ErrorCategory, RewriteError};
pub use model::{
    InboundRequest, ParseRule, Persona, ProviderSelector, ProviderSelectorParseError, RawOutput,
    RewriteRequest, RewriteResult, ValidatedRequest,
};
pub use parser::ResponseParser;
pub use prompt::{system_prompt, user_prompt};
pub use retry::RetryPolicy;
