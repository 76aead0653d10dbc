//! User-profile store collaborators.
//!
//! The store is queried by identity provider user id. It carries no timeout
//! of its own; callers race it against a deadline.

pub mod http;
pub mod memory;
pub mod record;

pub use http::HttpProfileStore;
pub use memory::MemoryProfileStore;
pub use record::{ProfileRecord, ProfileStore, StoreError};
