//! Identity provider collaborators.
//!
//! # Data Flow
//! ```text
//! HTTP request headers
//!     → session.rs (Credentials: bearer header or session cookie)
//!     → IdentityProvider::current_session (http.rs or memory.rs)
//!     → Option<Session>, raced against a deadline by the caller
//! ```
//!
//! # Design Decisions
//! - Credentials are passed explicitly; there is no ambient session
//! - Providers carry no timeout of their own; the gate owns the deadline

pub mod http;
pub mod memory;
pub mod session;

pub use http::HttpIdentityProvider;
pub use memory::MemoryIdentityProvider;
pub use session::{Credentials, IdentityProvider, ProviderError, Session, SESSION_COOKIE};
