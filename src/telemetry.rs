//! Application telemetry events and sinks.
//!
//! Events describe rewrite outcomes only. They never carry the submitted
//! text, the rewrite, or any credential.

use std::io;

use serde::{Deserialize, Serialize};

use crate::diff::Granularity;
use crate::rewrite::ErrorCategory;

/// A structured telemetry event emitted by Panopticon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryEvent {
    /// A rewrite finished and was measured.
    RewriteCompleted {
        /// Provider that served the request.
        provider: String,
        /// Parser rule that produced the rewrite (e.g. `labelled`).
        rule: String,
        /// Share of tokens changed, as a percentage.
        percent_changed: f64,
        /// Token granularity the percentage was measured at.
        granularity: Granularity,
    },
    /// A rewrite failed with a typed error.
    RewriteFailed {
        /// Provider selected for the request.
        provider: String,
        /// Failure category shown to the user.
        category: ErrorCategory,
    },
}

/// A sink that can record telemetry events.
pub trait TelemetrySink: Send + Sync {
    /// Records a telemetry event.
    fn record(&self, event: TelemetryEvent);
}

/// Telemetry sink that drops all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetrySink;

impl TelemetrySink for NoopTelemetrySink {
    fn record(&self, _event: TelemetryEvent) {}
}

/// Records telemetry events to stderr as JSON lines (JSONL).
///
/// This is intended for local debugging and is not transmitted anywhere.
#[derive(Debug, Default)]
pub struct StderrJsonlTelemetrySink;

impl TelemetrySink for StderrJsonlTelemetrySink {
    fn record(&self, event: TelemetryEvent) {
        let Ok(serialised) = serde_json::to_string(&event) else {
            return;
        };

        let _ignored = writeln_stderr(&serialised);
    }
}

fn writeln_stderr(message: &str) -> io::Result<()> {
    use io::Write;

    let mut stderr = io::stderr().lock();
    writeln!(stderr, "{message}")
}

/// Telemetry helpers for tests.
#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use std::sync::Mutex;

    use super::{TelemetryEvent, TelemetrySink};

    /// Sink that keeps every recorded event in memory.
    #[derive(Debug, Default)]
    pub struct RecordingTelemetrySink {
        events: Mutex<Vec<TelemetryEvent>>,
    }

    impl RecordingTelemetrySink {
        /// Removes and returns the recorded events.
        ///
        /// # Panics
        ///
        /// Panics if the events mutex is poisoned.
        #[must_use]
        #[expect(clippy::expect_used, reason = "test helper; poisoning is a test bug")]
        pub fn take(&self) -> Vec<TelemetryEvent> {
            self.events
                .lock()
                .expect("events mutex should be available")
                .drain(..)
                .collect()
        }
    }

    impl TelemetrySink for RecordingTelemetrySink {
        #[expect(clippy::expect_used, reason = "test helper; poisoning is a test bug")]
        fn record(&self, event: TelemetryEvent) {
            self.events
                .lock()
                .expect("events mutex should be available")
                .push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::test_support::RecordingTelemetrySink;
    use super::{TelemetryEvent, TelemetrySink};
    use crate::diff::Granularity;
    use crate::rewrite::ErrorCategory;

    #[test]
    fn recording_sink_captures_events() {
        let sink = RecordingTelemetrySink::default();
        let event = TelemetryEvent::RewriteFailed {
            provider: "openai".to_owned(),
            category: ErrorCategory::Transient,
        };
        sink.record(event.clone());

        assert_eq!(sink.take(), vec![event]);
        assert!(sink.take().is_empty());
    }

    #[test]
    fn events_serialise_as_tagged_json() {
        let event = TelemetryEvent::RewriteCompleted {
            provider: "anthropic".to_owned(),
            rule: "labelled".to_owned(),
            percent_changed: 27.27,
            granularity: Granularity::Character,
        };

        let value = serde_json::to_value(&event).expect("event should serialise");

        assert_eq!(
            value,
            json!({
                "type": "rewrite_completed",
                "provider": "anthropic",
                "rule": "labelled",
                "percent_changed": 27.27,
                "granularity": "character"
            })
        );
    }
}
