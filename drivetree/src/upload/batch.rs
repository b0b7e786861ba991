use drivetree_core::{FileUpload, ROOT_FOLDER_ID};
use tracing::{info, warn};

use super::paths::folder_segments;
use super::resolver::{FolderResolver, ResolutionCache};
use super::{StructureDescriptor, UploadError, UploadFile, UploadSettings, UploadedFile};
use crate::category::{classify, native_mime_type};
use crate::index::{FileInput, IndexStore};
use crate::remote::RemoteStorage;

/// Drives one upload batch: folders, file content, sharing, index records.
pub struct UploadOrchestrator {
    index: IndexStore,
    remote: RemoteStorage,
    settings: UploadSettings,
}

impl UploadOrchestrator {
    pub fn new(index: IndexStore, remote: RemoteStorage, settings: UploadSettings) -> Self {
        Self {
            index,
            remote,
            settings,
        }
    }

    pub fn index(&self) -> &IndexStore {
        &self.index
    }

    /// Uploads `files` in order; the first unrecoverable error aborts the batch.
    ///
    /// Folders and files created before the failure stay in place.
    pub async fn upload_batch(
        &self,
        user_id: &str,
        files: &[UploadFile],
        structure: &StructureDescriptor,
    ) -> Result<Vec<UploadedFile>, UploadError> {
        if files.is_empty() {
            return Err(UploadError::Validation("no files were uploaded".into()));
        }
        if user_id.trim().is_empty() {
            return Err(UploadError::Validation("owner user id is required".into()));
        }

        let resolver = FolderResolver::new(&self.index, &self.remote, &self.settings.root_folder_id);
        let mut cache = ResolutionCache::new();
        let mut results = Vec::with_capacity(files.len());

        for file in files {
            let segments = structure
                .relative_path(&file.original_name)
                .map(folder_segments)
                .unwrap_or_default();
            let folder_id = resolver.resolve(&mut cache, user_id, &segments).await?;
            results.push(self.upload_one(user_id, file, &folder_id).await?);
        }

        info!(
            user_id,
            files = results.len(),
            folders_resolved = cache.len(),
            "upload batch complete"
        );
        Ok(results)
    }

    async fn upload_one(
        &self,
        user_id: &str,
        file: &UploadFile,
        folder_id: &str,
    ) -> Result<UploadedFile, UploadError> {
        let target_mime_type = if self.settings.convert_office_documents {
            native_mime_type(&file.original_name)
        } else {
            None
        };
        let created = self
            .remote
            .create_file(&FileUpload {
                name: &file.original_name,
                parent: (folder_id != ROOT_FOLDER_ID).then_some(folder_id),
                content: &file.content,
                content_type: &file.content_type,
                target_mime_type,
            })
            .await?;

        if let Some(share) = &self.settings.share
            && let Err(err) = self
                .remote
                .set_permission(&created.id, &share.role, &share.scope)
                .await
        {
            warn!(
                file_id = %created.id,
                filename = %file.original_name,
                "failed to share uploaded file: {err}"
            );
        }

        let category = classify(&file.original_name);
        let id = self
            .index
            .insert_file(&FileInput {
                filename: &file.original_name,
                remote_file_id: &created.id,
                web_view_link: created.web_view_link.as_deref(),
                remote_folder_id: folder_id,
                category,
                owner_user_id: user_id,
            })
            .await?;
        info!(
            id,
            filename = %file.original_name,
            file_id = %created.id,
            folder_id,
            size = file.size,
            "uploaded file"
        );

        Ok(UploadedFile {
            id,
            filename: file.original_name.clone(),
            remote_file_id: created.id,
            category,
            web_view_link: created.web_view_link,
        })
    }
}
