pub mod backoff;
pub mod retry;

use std::sync::Arc;

use drivetree_core::{CreatedFile, DriveClient, DriveError, FileUpload, ROOT_FOLDER_ID};

pub use backoff::Backoff;
pub use retry::{Retryable, RetryExecutor};

/// The remote operations an upload batch needs, each routed through retries.
#[derive(Clone)]
pub struct RemoteStorage {
    client: Arc<DriveClient>,
    retry: RetryExecutor,
}

impl RemoteStorage {
    pub fn new(client: Arc<DriveClient>, retry: RetryExecutor) -> Self {
        Self { client, retry }
    }

    /// Creates `name` under `parent`; the root sentinel is sent as no parent.
    pub async fn create_folder(&self, name: &str, parent: &str) -> Result<String, DriveError> {
        let parent = (parent != ROOT_FOLDER_ID).then_some(parent);
        let client = self.client.as_ref();
        self.retry
            .run("create_folder", move || client.create_folder(name, parent))
            .await
    }

    pub async fn create_file(&self, upload: &FileUpload<'_>) -> Result<CreatedFile, DriveError> {
        let client = self.client.as_ref();
        self.retry
            .run("create_file", move || client.create_file(upload))
            .await
    }

    pub async fn set_permission(
        &self,
        file_id: &str,
        role: &str,
        scope: &str,
    ) -> Result<(), DriveError> {
        let client = self.client.as_ref();
        self.retry
            .run("create_permission", move || {
                client.create_permission(file_id, role, scope)
            })
            .await
    }
}
