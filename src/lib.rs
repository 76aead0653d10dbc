//! Onboarding gate library.
//!
//! Bounds every external dependency call made while rendering the
//! onboarding page or authorizing an upload with a per-call deadline, and
//! maps each bounded call to a distinct, renderable outcome.

pub mod config;
pub mod http;
pub mod identity;
pub mod lifecycle;
pub mod observability;
pub mod onboarding;
pub mod profile;
pub mod resilience;
pub mod upload;

pub use config::schema::AppConfig;
pub use http::GateServer;
pub use lifecycle::Shutdown;
pub use resilience::{AbandonPolicy, Deadline, DeadlineGate, GateError, Outcome};
