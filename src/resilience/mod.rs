//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call site (onboarding page, upload authorization):
//!     → timeouts.rs (race the dependency call against its deadline)
//!     → outcome.rs (Completed / Failed / TimedOut)
//!     → diagnostics.rs (report start, success, failure, timeout)
//!     → call site maps the outcome to redirect / render / reject
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - One parameterized gate, never an inline race at the call site
//! - Timeouts are distinct from dependency failures
//! - No automatic retries; the user retries manually

pub mod diagnostics;
pub mod outcome;
pub mod timeouts;

pub use diagnostics::{DiagnosticSink, GateEvent, NullSink, TracingSink};
pub use outcome::{Deadline, GateError, Outcome};
pub use timeouts::{AbandonPolicy, DeadlineGate};
