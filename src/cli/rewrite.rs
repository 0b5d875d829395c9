//! Runs one moderation rewrite from configuration.

use std::io::{self, Write};

use panopticon::rewrite::InboundRequest;
use panopticon::telemetry::{NoopTelemetrySink, StderrJsonlTelemetrySink, TelemetrySink};
use panopticon::{PanopticonConfig, RewritePipeline};

use super::CliError;
use super::output::write_report;

/// Runs the configured rewrite and prints the report to stdout.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the rewrite fails, or
/// writing output fails.
pub fn run(config: &PanopticonConfig) -> Result<(), CliError> {
    let pipeline = RewritePipeline::new(config.provider_set()?, config.report_settings()?);
    let inbound = config.inbound_request()?;
    let telemetry = telemetry_sink(config.telemetry);
    let stdout = io::stdout();
    let mut writer = stdout.lock();

    run_with_pipeline(&mut writer, &pipeline, inbound, telemetry.as_ref())
}

fn telemetry_sink(enabled: bool) -> Box<dyn TelemetrySink> {
    if enabled {
        Box::new(StderrJsonlTelemetrySink)
    } else {
        Box::new(NoopTelemetrySink)
    }
}

fn run_with_pipeline<W: Write>(
    writer: &mut W,
    pipeline: &RewritePipeline,
    inbound: InboundRequest,
    telemetry: &dyn TelemetrySink,
) -> Result<(), CliError> {
    let report = pipeline.process(inbound, telemetry)?;
    write_report(writer, &report)
}

#[cfg(test)]
mod tests {
    use panopticon::rewrite::{InboundRequest, ProviderSelector, RewriteError};
    use panopticon::telemetry::NoopTelemetrySink;
    use panopticon::{PanopticonConfig, RewritePipeline};
    use rstest::rstest;
    use serde_json::json;
    use tokio::runtime::Runtime;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::run_with_pipeline;
    use crate::cli::CliError;

    fn pipeline(config: &PanopticonConfig) -> RewritePipeline {
        RewritePipeline::new(
            config.provider_set().expect("providers should build"),
            config.report_settings().expect("settings should parse"),
        )
    }

    fn custom_request(text: &str, endpoint: String) -> InboundRequest {
        InboundRequest {
            text: text.to_owned(),
            provider: ProviderSelector::Custom,
            custom_endpoint: Some(endpoint),
        }
    }

    #[rstest]
    fn prints_report_for_custom_endpoint() {
        let runtime = Runtime::new().expect("runtime should start");
        let server = runtime.block_on(MockServer::start());
        runtime.block_on(
            Mock::given(method("POST"))
                .and(path("/rewrite"))
                .and(body_json(json!({"input": "我討厭你"})))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "rewritten": "我不太喜歡你",
                    "explanation": "語氣較溫和"
                })))
                .expect(1)
                .mount(&server),
        );
        let config = PanopticonConfig {
            granularity: "word".to_owned(),
            ..PanopticonConfig::default()
        };
        let mut output = Vec::new();

        let result = run_with_pipeline(
            &mut output,
            &pipeline(&config),
            custom_request("我討厭你", format!("{}/rewrite", server.uri())),
            &NoopTelemetrySink,
        );

        assert!(result.is_ok(), "rewrite should succeed: {result:?}");
        let output_text = String::from_utf8(output).unwrap_or_default();
        assert!(output_text.contains("Provider: custom"));
        assert!(output_text.contains("Status: rewritten"));
        assert!(output_text.contains("Rewritten: 我不太喜歡你"));
        assert!(output_text.contains("Explanation: 語氣較溫和"));
        assert!(output_text.contains("(word granularity)"));
    }

    #[rstest]
    fn blank_text_is_rejected_before_any_request() {
        let config = PanopticonConfig::default();
        let mut output = Vec::new();

        let result = run_with_pipeline(
            &mut output,
            &pipeline(&config),
            custom_request("  ", "http://127.0.0.1:9/rewrite".to_owned()),
            &NoopTelemetrySink,
        );

        assert!(
            matches!(result, Err(CliError::Rewrite(RewriteError::Validation { .. }))),
            "blank input should be a validation error"
        );
        assert!(output.is_empty());
    }
}
