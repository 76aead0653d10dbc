//! Classified results of a deadline-bounded call.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum wall-clock time the gate waits for an operation, in milliseconds.
///
/// Signed so that a zero or negative value coming from configuration can be
/// represented and rejected instead of silently clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Deadline(i64);

impl Deadline {
    pub const fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    pub const fn as_millis(&self) -> i64 {
        self.0
    }

    /// The wait as a `Duration`, or `None` when the deadline is not positive.
    pub fn duration(&self) -> Option<Duration> {
        (self.0 > 0).then(|| Duration::from_millis(self.0 as u64))
    }
}

impl From<Duration> for Deadline {
    fn from(d: Duration) -> Self {
        Self(i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
    }
}

impl fmt::Display for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Why a gated call ended in `Outcome::Failed`.
#[derive(Debug, Error)]
pub enum GateError<E> {
    /// The deadline supplied for the call was zero or negative.
    #[error("invalid deadline for {label}: {deadline} (must be greater than zero)")]
    Configuration { label: String, deadline: Deadline },

    /// The dependency settled before the deadline but reported failure.
    #[error("{0}")]
    Dependency(E),

    /// The operation panicked while being built or polled.
    #[error("{label} panicked: {message}")]
    Panicked { label: String, message: String },
}

impl<E> GateError<E> {
    pub fn is_configuration(&self) -> bool {
        matches!(self, GateError::Configuration { .. })
    }
}

/// Result of racing one operation against one deadline.
///
/// Exactly one variant is produced per gate invocation.
#[derive(Debug)]
pub enum Outcome<T, E> {
    /// The operation finished first with a value.
    Completed(T),
    /// The operation finished first with an error, or the call was misconfigured.
    Failed(GateError<E>),
    /// The deadline elapsed first. Carries the label of the timed-out operation.
    TimedOut(String),
}

impl<T, E> Outcome<T, E> {
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, Outcome::TimedOut(_))
    }

    /// Short variant name used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::Completed(_) => "completed",
            Outcome::Failed(GateError::Configuration { .. }) => "misconfigured",
            Outcome::Failed(_) => "failed",
            Outcome::TimedOut(_) => "timed_out",
        }
    }

    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(v) => Some(v),
            _ => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U, E> {
        match self {
            Outcome::Completed(v) => Outcome::Completed(f(v)),
            Outcome::Failed(e) => Outcome::Failed(e),
            Outcome::TimedOut(label) => Outcome::TimedOut(label),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_duration() {
        assert_eq!(Deadline::from_millis(4000).duration(), Some(Duration::from_secs(4)));
        assert_eq!(Deadline::from_millis(0).duration(), None);
        assert_eq!(Deadline::from_millis(-5).duration(), None);
        assert_eq!(Deadline::from(Duration::from_millis(250)).as_millis(), 250);
    }

    #[test]
    fn test_outcome_kind_and_map() {
        let done: Outcome<u32, String> = Outcome::Completed(2);
        assert_eq!(done.kind(), "completed");
        assert_eq!(done.map(|v| v * 10).completed(), Some(20));

        let late: Outcome<u32, String> = Outcome::TimedOut("CurrentUser fetch".into());
        assert!(late.is_timed_out());
        assert_eq!(late.map(|v| v + 1).kind(), "timed_out");

        let bad: Outcome<u32, String> = Outcome::Failed(GateError::Configuration {
            label: "x".into(),
            deadline: Deadline::from_millis(0),
        });
        assert_eq!(bad.kind(), "misconfigured");
    }

    #[test]
    fn test_gate_error_display() {
        let err: GateError<String> = GateError::Configuration {
            label: "FetchUser database query".into(),
            deadline: Deadline::from_millis(-1),
        };
        assert_eq!(
            err.to_string(),
            "invalid deadline for FetchUser database query: -1ms (must be greater than zero)"
        );
        assert!(err.is_configuration());

        let dep: GateError<String> = GateError::Dependency("connection refused".into());
        assert_eq!(dep.to_string(), "connection refused");
    }
}
