//! Onboarding page call site.
//!
//! # Data Flow
//! ```text
//! Credentials
//!     → gate: "CurrentUser fetch" (identity provider, 4s)
//!     → gate: "FetchUser database query" (profile store, 5s)
//!     → page.rs decides the view
//!     → user_data.rs assembles the form pre-fill
//! ```

pub mod page;
pub mod user_data;

pub use page::{FailureKind, OnboardingPage, OnboardingView, RecoverableError, Stage, PROFILE_LABEL, SESSION_LABEL};
pub use user_data::UserData;
