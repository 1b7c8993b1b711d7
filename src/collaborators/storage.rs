//! Object-storage collaborator contract.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::UploadError;
use crate::model::Attachment;

/// Uploads staged attachments to durable storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload every attachment with a local staging path. Returns a map
    /// of filename to stored URL; attachments that fail individually may
    /// be omitted from the map.
    async fn upload_all(
        &self,
        attachments: &[Attachment],
    ) -> Result<HashMap<String, String>, UploadError>;
}
