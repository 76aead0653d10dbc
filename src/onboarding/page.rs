//! Onboarding page decision.
//!
//! # Responsibilities
//! - Resolve the caller's session through the deadline gate
//! - Resolve the stored profile through the deadline gate
//! - Decide between redirect, form, nothing, and a retryable error
//!
//! # Design Decisions
//! - The page never fails: every non-completed outcome becomes `Error`
//! - An onboarded profile always redirects; the form is never rendered for it
//! - Missing session renders nothing (no redirect, no form)

use std::fmt::Display;
use std::sync::Arc;

use serde::Serialize;

use crate::identity::{Credentials, IdentityProvider};
use crate::observability::metrics;
use crate::onboarding::user_data::UserData;
use crate::profile::ProfileStore;
use crate::resilience::{Deadline, DeadlineGate, GateError, Outcome};

pub const SESSION_LABEL: &str = "CurrentUser fetch";
pub const PROFILE_LABEL: &str = "FetchUser database query";

pub const ERROR_MESSAGE: &str = "Something went wrong. Please refresh the page or try again later.";

/// Which lookup failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Session,
    Profile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Timeout,
    Dependency,
    Configuration,
}

/// A failed lookup, presented to the user as a recoverable state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoverableError {
    pub stage: Stage,
    pub kind: FailureKind,
    /// False only for configuration errors, which a retry cannot fix.
    pub retryable: bool,
    pub message: &'static str,
    /// Internal cause, for logs only.
    #[serde(skip)]
    pub detail: String,
}

/// What the onboarding page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnboardingView {
    /// Already onboarded: send the user home.
    RedirectHome { location: String },
    /// Render the onboarding form pre-filled with `UserData`.
    Form(UserData),
    /// No signed-in user: render nothing.
    Empty,
    /// A lookup failed or timed out: render an error with a retry action.
    Error(RecoverableError),
}

impl OnboardingView {
    pub fn kind(&self) -> &'static str {
        match self {
            OnboardingView::RedirectHome { .. } => "redirect",
            OnboardingView::Form(_) => "form",
            OnboardingView::Empty => "empty",
            OnboardingView::Error(_) => "error",
        }
    }
}

/// The onboarding page call site.
#[derive(Clone)]
pub struct OnboardingPage {
    gate: DeadlineGate,
    identity: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileStore>,
    session_deadline: Deadline,
    profile_deadline: Deadline,
    home_path: String,
}

impl OnboardingPage {
    pub fn new(gate: DeadlineGate, identity: Arc<dyn IdentityProvider>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self {
            gate,
            identity,
            profiles,
            session_deadline: Deadline::from_millis(4000),
            profile_deadline: Deadline::from_millis(5000),
            home_path: "/".to_string(),
        }
    }

    pub fn with_deadlines(mut self, session: Deadline, profile: Deadline) -> Self {
        self.session_deadline = session;
        self.profile_deadline = profile;
        self
    }

    pub fn with_home_path(mut self, home_path: impl Into<String>) -> Self {
        self.home_path = home_path.into();
        self
    }

    /// Decide what to show for the given credentials.
    pub async fn load(&self, credentials: Credentials) -> OnboardingView {
        let view = self.decide(credentials).await;
        if let OnboardingView::Error(err) = &view {
            tracing::error!(stage = ?err.stage, kind = ?err.kind, detail = %err.detail, "Onboarding page error");
        }
        metrics::record_onboarding_view(view.kind());
        view
    }

    async fn decide(&self, credentials: Credentials) -> OnboardingView {
        tracing::debug!("Fetching current user");
        let identity = self.identity.clone();
        let outcome = self
            .gate
            .run(SESSION_LABEL, self.session_deadline, move || async move {
                identity.current_session(&credentials).await
            })
            .await;

        let session = match classify(Stage::Session, outcome) {
            Ok(Some(session)) => session,
            Ok(None) => {
                tracing::info!("No user found, rendering nothing");
                return OnboardingView::Empty;
            }
            Err(err) => return OnboardingView::Error(err),
        };

        tracing::debug!(user_id = %session.user_id, "User found, fetching profile");
        let profiles = self.profiles.clone();
        let user_id = session.user_id.clone();
        let outcome = self
            .gate
            .run(PROFILE_LABEL, self.profile_deadline, move || async move {
                profiles.fetch_profile(&user_id).await
            })
            .await;

        let profile = match classify(Stage::Profile, outcome) {
            Ok(profile) => profile,
            Err(err) => return OnboardingView::Error(err),
        };

        if profile.as_ref().is_some_and(|p| p.onboarded) {
            tracing::info!(user_id = %session.user_id, "User already onboarded, redirecting");
            return OnboardingView::RedirectHome {
                location: self.home_path.clone(),
            };
        }

        OnboardingView::Form(UserData::assemble(&session, profile.as_ref()))
    }
}

fn classify<T, E: Display>(stage: Stage, outcome: Outcome<T, E>) -> Result<T, RecoverableError> {
    let (kind, detail) = match outcome {
        Outcome::Completed(value) => return Ok(value),
        Outcome::TimedOut(label) => (FailureKind::Timeout, format!("{label} timed out")),
        Outcome::Failed(err @ GateError::Configuration { .. }) => (FailureKind::Configuration, err.to_string()),
        Outcome::Failed(err) => (FailureKind::Dependency, err.to_string()),
    };
    Err(RecoverableError {
        stage,
        kind,
        retryable: kind != FailureKind::Configuration,
        message: ERROR_MESSAGE,
        detail,
    })
}
