//! Diagnostic sink for gate transitions.
//!
//! # Responsibilities
//! - Define the events the gate reports (start, success, failure, timeout)
//! - Provide the default sink (structured logs + metrics)
//! - Allow callers to plug in their own sink
//!
//! # Design Decisions
//! - Recording is synchronous and infallible; a sink must never block
//! - The gate holds the sink behind `Arc<dyn DiagnosticSink>`
//! - Sinks observe outcomes, they never influence them

use std::time::Duration;

use crate::observability::metrics;
use crate::resilience::outcome::Deadline;

/// A notable transition inside one gate invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum GateEvent<'a> {
    Started { label: &'a str, deadline: Deadline },
    Completed { label: &'a str, elapsed: Duration },
    Failed { label: &'a str, elapsed: Duration, error: &'a str },
    TimedOut { label: &'a str, deadline: Deadline },
    Misconfigured { label: &'a str, deadline: Deadline },
    /// An abandoned operation settled after its deadline; the result was dropped.
    Discarded { label: &'a str, succeeded: bool },
}

impl GateEvent<'_> {
    pub fn label(&self) -> &str {
        match self {
            GateEvent::Started { label, .. }
            | GateEvent::Completed { label, .. }
            | GateEvent::Failed { label, .. }
            | GateEvent::TimedOut { label, .. }
            | GateEvent::Misconfigured { label, .. }
            | GateEvent::Discarded { label, .. } => label,
        }
    }
}

/// Receives gate events. Implementations must return promptly.
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, event: &GateEvent<'_>);
}

/// Default sink: `tracing` events plus Prometheus series.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, event: &GateEvent<'_>) {
        match *event {
            GateEvent::Started { label, deadline } => {
                tracing::debug!(operation = label, deadline_ms = deadline.as_millis(), "Gated call started");
            }
            GateEvent::Completed { label, elapsed } => {
                tracing::debug!(operation = label, elapsed_ms = elapsed.as_millis() as u64, "Gated call completed");
                metrics::record_gate_outcome(label, "completed", elapsed);
            }
            GateEvent::Failed { label, elapsed, error } => {
                tracing::error!(operation = label, elapsed_ms = elapsed.as_millis() as u64, error, "Gated call failed");
                metrics::record_gate_outcome(label, "failed", elapsed);
            }
            GateEvent::TimedOut { label, deadline } => {
                tracing::warn!(operation = label, deadline_ms = deadline.as_millis(), "Gated call timed out");
                let waited = deadline.duration().unwrap_or_default();
                metrics::record_gate_outcome(label, "timed_out", waited);
            }
            GateEvent::Misconfigured { label, deadline } => {
                tracing::error!(operation = label, deadline_ms = deadline.as_millis(), "Rejected gated call with invalid deadline");
                metrics::record_gate_outcome(label, "misconfigured", Duration::ZERO);
            }
            GateEvent::Discarded { label, succeeded } => {
                tracing::info!(operation = label, succeeded, "Abandoned call settled after deadline, result discarded");
                metrics::record_gate_discarded(label);
            }
        }
    }
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&self, _event: &GateEvent<'_>) {}
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Captures a textual form of every event, in order.
    #[derive(Default)]
    pub struct RecordingSink {
        events: Mutex<Vec<String>>,
    }

    impl RecordingSink {
        pub fn events(&self) -> Vec<String> {
            self.events.lock().expect("recording sink mutex poisoned").clone()
        }

        pub fn contains(&self, prefix: &str) -> bool {
            self.events().iter().any(|e| e.starts_with(prefix))
        }
    }

    impl DiagnosticSink for RecordingSink {
        fn record(&self, event: &GateEvent<'_>) {
            let line = match event {
                GateEvent::Started { label, .. } => format!("started:{label}"),
                GateEvent::Completed { label, .. } => format!("completed:{label}"),
                GateEvent::Failed { label, error, .. } => format!("failed:{label}:{error}"),
                GateEvent::TimedOut { label, .. } => format!("timed_out:{label}"),
                GateEvent::Misconfigured { label, .. } => format!("misconfigured:{label}"),
                GateEvent::Discarded { label, succeeded } => format!("discarded:{label}:{succeeded}"),
            };
            self.events.lock().expect("recording sink mutex poisoned").push(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_label() {
        let ev = GateEvent::Discarded { label: "User fetch", succeeded: true };
        assert_eq!(ev.label(), "User fetch");
        let ev = GateEvent::TimedOut { label: "CurrentUser fetch", deadline: Deadline::from_millis(4000) };
        assert_eq!(ev.label(), "CurrentUser fetch");
    }

    #[test]
    fn test_recording_sink_keeps_order() {
        let sink = testing::RecordingSink::default();
        sink.record(&GateEvent::Started { label: "a", deadline: Deadline::from_millis(1) });
        sink.record(&GateEvent::Failed { label: "a", elapsed: Duration::ZERO, error: "boom" });
        assert_eq!(sink.events(), vec!["started:a".to_string(), "failed:a:boom".to_string()]);
        assert!(sink.contains("failed:a"));
    }

    #[test]
    fn test_tracing_sink_never_panics_without_recorder() {
        let sink = TracingSink;
        sink.record(&GateEvent::Misconfigured { label: "x", deadline: Deadline::from_millis(0) });
        sink.record(&GateEvent::Discarded { label: "x", succeeded: false });
    }
}
