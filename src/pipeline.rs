//! End-to-end rewrite flow: validate, dispatch, parse, measure, render.

use crate::diff::{ChangeReport, DiffRenderer, Granularity, MarkedDiff, MarkupFormat, compare};
use crate::rewrite::{
    InboundRequest, ProviderSet, ResponseParser, RewriteBackend, RewriteError, RewriteRequest,
    RewriteResult,
};
use crate::telemetry::{TelemetryEvent, TelemetrySink};

/// Presentation settings applied to every report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportSettings {
    /// Parser used to normalise provider output.
    pub parser: ResponseParser,
    /// Token granularity for alignment and the change metric.
    pub granularity: Granularity,
    /// Markup used for the highlighted diff.
    pub markup: MarkupFormat,
}

/// Everything presentation needs about one rewrite.
#[derive(Debug, Clone, PartialEq)]
pub struct RewriteReport {
    /// Provider that served the request.
    pub provider: String,
    /// Parsed rewrite.
    pub result: RewriteResult,
    /// Alignment and change percentage between input and rewrite.
    pub change: ChangeReport,
    /// Highlighted input and rewrite.
    pub marked: MarkedDiff,
}

/// Calls `backend` and compares its rewrite with the input.
///
/// # Errors
///
/// Returns [`RewriteError`] when the backend call fails.
pub fn build_report(
    backend: &dyn RewriteBackend,
    request: &RewriteRequest,
    settings: &ReportSettings,
) -> Result<RewriteReport, RewriteError> {
    let result = backend.rewrite(request, &settings.parser)?;
    let renderer = DiffRenderer::new(settings.markup);
    let (change, marked) = compare(
        request.text(),
        result.rewritten_text.as_str(),
        settings.granularity,
        &renderer,
    );

    Ok(RewriteReport {
        provider: backend.provider().to_owned(),
        result,
        change,
        marked,
    })
}

/// Runs [`build_report`] and records the outcome to `telemetry`.
///
/// # Errors
///
/// Returns [`RewriteError`] when the backend call fails.
pub fn run_rewrite(
    backend: &dyn RewriteBackend,
    request: &RewriteRequest,
    settings: &ReportSettings,
    telemetry: &dyn TelemetrySink,
) -> Result<RewriteReport, RewriteError> {
    match build_report(backend, request, settings) {
        Ok(report) => {
            tracing::info!(
                provider = report.provider.as_str(),
                rule = report.result.rule.label(),
                percent_changed = report.change.percent_changed,
                "rewrite completed"
            );
            telemetry.record(TelemetryEvent::RewriteCompleted {
                provider: report.provider.clone(),
                rule: report.result.rule.label().to_owned(),
                percent_changed: report.change.percent_changed,
                granularity: report.change.granularity(),
            });
            Ok(report)
        }
        Err(error) => {
            record_failure(telemetry, backend.provider(), &error);
            Err(error)
        }
    }
}

fn record_failure(telemetry: &dyn TelemetrySink, provider: &str, error: &RewriteError) {
    tracing::warn!(provider, category = error.category().label(), "rewrite failed: {error}");
    telemetry.record(TelemetryEvent::RewriteFailed {
        provider: provider.to_owned(),
        category: error.category(),
    });
}

/// Configured providers plus report settings.
#[derive(Debug, Clone)]
pub struct RewritePipeline {
    providers: ProviderSet,
    settings: ReportSettings,
}

impl RewritePipeline {
    /// Creates a pipeline from configured providers and settings.
    #[must_use]
    pub const fn new(providers: ProviderSet, settings: ReportSettings) -> Self {
        Self {
            providers,
            settings,
        }
    }

    /// Settings applied to every report.
    #[must_use]
    pub const fn settings(&self) -> &ReportSettings {
        &self.settings
    }

    /// Validates `inbound`, then runs it against the selected provider.
    ///
    /// Invalid input fails before any network call is made.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError::Validation`] for rejected input, or the
    /// backend's error when the call fails.
    pub fn process(
        &self,
        inbound: InboundRequest,
        telemetry: &dyn TelemetrySink,
    ) -> Result<RewriteReport, RewriteError> {
        let provider = inbound.provider;
        let validated = inbound.validate().inspect_err(|error| {
            record_failure(telemetry, provider.label(), error);
        })?;
        let backend = self.providers.select(&validated).inspect_err(|error| {
            record_failure(telemetry, provider.label(), error);
        })?;

        run_rewrite(&backend, validated.request(), &self.settings, telemetry)
    }
}
