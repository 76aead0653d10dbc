//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, span)
//!     → GET /onboarding            → OnboardingPage → response.rs
//!     → POST /api/uploads/{slug}   → middleware/upload_auth.rs (gate, fail closed)
//!                                  → file checks → response.rs
//!     → POST /api/uploads/{slug}/complete
//!                                  → middleware/callback_auth.rs → receipt
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdExt, RequestIdLayer, X_REQUEST_ID};
pub use server::{AppState, Collaborators, GateServer, RuntimeState, ServerError, UploadRequest};
