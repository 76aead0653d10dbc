//! Timeout enforcement: the deadline gate.
//!
//! # Responsibilities
//! - Race a caller-supplied operation against a deadline
//! - Classify the result as completed, failed, or timed out
//! - Report transitions to the diagnostic sink
//!
//! # Design Decisions
//! - Uses `tokio::time::timeout`, which polls its inner future before the
//!   timer. Under `Cancel` the inner future is the operation itself, so an
//!   operation ready in the same poll as the timer wins. Under `Detach` it is
//!   the task's `JoinHandle`, and a tie goes to whichever the scheduler
//!   completes first
//! - Zero or negative deadlines fail the call before any timer or operation starts
//! - Panics raised while building or polling the operation become `Failed`
//! - What happens to the losing operation is an explicit `AbandonPolicy`:
//!   `Detach` lets it run to completion on its own task and drops its result
//!   (it keeps holding whatever resources it holds until then), `Cancel`
//!   drops the future at the deadline
//! - The gate keeps no state between invocations

use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::time::{timeout, Instant};

use crate::resilience::diagnostics::{DiagnosticSink, GateEvent, TracingSink};
use crate::resilience::outcome::{Deadline, GateError, Outcome};

/// What happens to an operation that loses the race against its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AbandonPolicy {
    /// Keep running in the background; the eventual result is discarded.
    #[default]
    Detach,
    /// Drop the operation's future at the deadline.
    Cancel,
}

/// Races operations against deadlines. Cheap to clone.
#[derive(Clone)]
pub struct DeadlineGate {
    sink: Arc<dyn DiagnosticSink>,
    policy: AbandonPolicy,
}

impl Default for DeadlineGate {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}

impl std::fmt::Debug for DeadlineGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeadlineGate").field("policy", &self.policy).finish_non_exhaustive()
    }
}

impl DeadlineGate {
    pub fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            sink,
            policy: AbandonPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: AbandonPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> AbandonPolicy {
        self.policy
    }

    /// Race `operation` against `deadline` using the gate's abandon policy.
    ///
    /// Returns within `deadline` plus scheduling overhead no matter how long
    /// the operation takes. `label` names the operation in diagnostics and in
    /// `Outcome::TimedOut`.
    pub async fn run<T, E, F, Fut>(&self, label: &str, deadline: Deadline, operation: F) -> Outcome<T, E>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        match self.policy {
            AbandonPolicy::Detach => self.run_detached(label, deadline, operation).await,
            AbandonPolicy::Cancel => self.run_local(label, deadline, operation).await,
        }
    }

    /// Race on the caller's task. On timeout the operation's future is dropped,
    /// which cancels it.
    pub async fn run_local<T, E, F, Fut>(&self, label: &str, deadline: Deadline, operation: F) -> Outcome<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let Some(wait) = self.admit(label, deadline) else {
            return misconfigured(label, deadline);
        };
        let started = Instant::now();

        let fut = match panic::catch_unwind(AssertUnwindSafe(operation)) {
            Ok(fut) => fut,
            Err(payload) => return self.panicked(label, started, payload),
        };

        match timeout(wait, AssertUnwindSafe(fut).catch_unwind()).await {
            Ok(Ok(result)) => self.settle(label, started, result),
            Ok(Err(payload)) => self.panicked(label, started, payload),
            Err(_) => self.timed_out(label, deadline),
        }
    }

    /// Race with the operation on its own task. On timeout the task is left
    /// running and its result is discarded when it settles.
    pub async fn run_detached<T, E, F, Fut>(&self, label: &str, deadline: Deadline, operation: F) -> Outcome<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        let Some(wait) = self.admit(label, deadline) else {
            return misconfigured(label, deadline);
        };
        let started = Instant::now();

        let fut = match panic::catch_unwind(AssertUnwindSafe(operation)) {
            Ok(fut) => fut,
            Err(payload) => return self.panicked(label, started, payload),
        };

        let abandoned = Arc::new(AtomicBool::new(false));
        let task = {
            let abandoned = abandoned.clone();
            let sink = self.sink.clone();
            let label = label.to_owned();
            tokio::spawn(async move {
                let result = fut.await;
                if abandoned.load(Ordering::Acquire) {
                    sink.record(&GateEvent::Discarded {
                        label: &label,
                        succeeded: result.is_ok(),
                    });
                }
                result
            })
        };

        match timeout(wait, task).await {
            Ok(Ok(result)) => self.settle(label, started, result),
            Ok(Err(join_error)) if join_error.is_panic() => {
                self.panicked(label, started, join_error.into_panic())
            }
            Ok(Err(_)) => {
                let message = "operation task was cancelled by the runtime".to_string();
                self.sink.record(&GateEvent::Failed {
                    label,
                    elapsed: started.elapsed(),
                    error: &message,
                });
                Outcome::Failed(GateError::Panicked {
                    label: label.to_owned(),
                    message,
                })
            }
            Err(_) => {
                // Dropping the JoinHandle detaches the task.
                abandoned.store(true, Ordering::Release);
                self.timed_out(label, deadline)
            }
        }
    }

    fn admit(&self, label: &str, deadline: Deadline) -> Option<Duration> {
        match deadline.duration() {
            Some(wait) => {
                self.sink.record(&GateEvent::Started { label, deadline });
                Some(wait)
            }
            None => {
                self.sink.record(&GateEvent::Misconfigured { label, deadline });
                None
            }
        }
    }

    fn settle<T, E: Display>(&self, label: &str, started: Instant, result: Result<T, E>) -> Outcome<T, E> {
        let elapsed = started.elapsed();
        match result {
            Ok(value) => {
                self.sink.record(&GateEvent::Completed { label, elapsed });
                Outcome::Completed(value)
            }
            Err(error) => {
                let message = error.to_string();
                self.sink.record(&GateEvent::Failed {
                    label,
                    elapsed,
                    error: &message,
                });
                Outcome::Failed(GateError::Dependency(error))
            }
        }
    }

    fn timed_out<T, E>(&self, label: &str, deadline: Deadline) -> Outcome<T, E> {
        self.sink.record(&GateEvent::TimedOut { label, deadline });
        Outcome::TimedOut(label.to_owned())
    }

    fn panicked<T, E>(&self, label: &str, started: Instant, payload: Box<dyn Any + Send>) -> Outcome<T, E> {
        let message = panic_message(payload.as_ref());
        self.sink.record(&GateEvent::Failed {
            label,
            elapsed: started.elapsed(),
            error: &message,
        });
        Outcome::Failed(GateError::Panicked {
            label: label.to_owned(),
            message,
        })
    }
}

fn misconfigured<T, E>(label: &str, deadline: Deadline) -> Outcome<T, E> {
    Outcome::Failed(GateError::Configuration {
        label: label.to_owned(),
        deadline,
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
