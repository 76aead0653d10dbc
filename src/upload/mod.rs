//! Upload route call site.
//!
//! # Data Flow
//! ```text
//! Upload request (credentials + file descriptors)
//!     → authorize.rs: gate "User fetch" (identity provider, 5s), fail closed
//!     → route.rs: type / size / count limits
//!     → Authorization { authorized, context: { userId } }
//!
//! Upload service stores the file, then calls back:
//!     → complete.rs: UploadReceipt { uploadedBy, fileUrl }
//! ```

pub mod authorize;
pub mod complete;
pub mod route;

pub use authorize::{Authorization, UploadAuthorizer, UploadContext, UploadRejection, AUTH_LABEL};
pub use complete::{on_upload_complete, UploadCompletion, UploadReceipt, UploadedFile};
pub use route::{FileDescriptor, FileRoute, MediaKind};
