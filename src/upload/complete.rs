//! Completion callback, run after the upload service has stored a file.

use serde::{Deserialize, Serialize};

use crate::upload::authorize::UploadContext;

/// A file the upload service has stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Callback payload: the metadata returned at authorization plus the stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadCompletion {
    pub metadata: UploadContext,
    pub file: UploadedFile,
}

/// What the completion callback reports back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub uploaded_by: String,
    pub file_url: String,
}

pub fn on_upload_complete(completion: &UploadCompletion) -> UploadReceipt {
    tracing::info!(
        user_id = %completion.metadata.user_id,
        file_url = %completion.file.url,
        "Upload complete"
    );
    UploadReceipt {
        uploaded_by: completion.metadata.user_id.clone(),
        file_url: completion.file.url.clone(),
    }
}
