//! Panopticon library crate providing moderation rewrites with change
//! highlighting.
//!
//! A sentence is sent to one of several interchangeable rewrite providers,
//! the free-form answer is normalised into a rewrite and an optional
//! explanation, and the result is aligned against the input to measure and
//! highlight what changed.
//!
//! - [`rewrite`]: provider backends, retry, and the response parser
//! - [`diff`]: LCS alignment, change metric, and escaped diff rendering
//! - [`pipeline`]: the end-to-end flow used by the CLI
//! - [`config`]: layered configuration

pub mod config;
pub mod diff;
pub mod pipeline;
pub mod rewrite;
pub mod telemetry;

pub use config::PanopticonConfig;
pub use diff::{Alignment, ChangeReport, DiffRenderer, Granularity, MarkedDiff, MarkupFormat};
pub use pipeline::{ReportSettings, RewritePipeline, RewriteReport};
pub use rewrite::{
    ErrorCategory, InboundRequest, ProviderSelector, ResponseParser, RewriteBackend, RewriteError,
    RewriteResult,
};
