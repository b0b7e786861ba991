use std::collections::HashMap;

use tracing::{debug, info};

use super::UploadError;
use crate::index::IndexStore;
use crate::remote::RemoteStorage;

/// Folder ids resolved during one batch, keyed by owner and cumulative path.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: HashMap<String, HashMap<String, String>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: &str, path: &str) -> Option<&str> {
        self.entries.get(user_id)?.get(path).map(String::as_str)
    }

    fn insert(&mut self, user_id: &str, path: &str, folder_id: String) {
        self.entries
            .entry(user_id.to_string())
            .or_default()
            .insert(path.to_string(), folder_id);
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Maps folder segment chains to remote folder ids, creating what is missing.
pub struct FolderResolver<'a> {
    index: &'a IndexStore,
    remote: &'a RemoteStorage,
    root_folder_id: &'a str,
}

impl<'a> FolderResolver<'a> {
    pub fn new(index: &'a IndexStore, remote: &'a RemoteStorage, root_folder_id: &'a str) -> Self {
        Self {
            index,
            remote,
            root_folder_id,
        }
    }

    /// Returns the leaf folder id for `segments`, or the root when empty.
    pub async fn resolve(
        &self,
        cache: &mut ResolutionCache,
        user_id: &str,
        segments: &[String],
    ) -> Result<String, UploadError> {
        let mut current_parent = self.root_folder_id.to_string();
        let mut cumulative = String::new();

        for segment in segments {
            if !cumulative.is_empty() {
                cumulative.push('/');
            }
            cumulative.push_str(segment);

            if let Some(cached) = cache.get(user_id, &cumulative) {
                current_parent = cached.to_string();
                continue;
            }

            let folder_id = match self
                .index
                .find_folder(segment, user_id, &current_parent)
                .await?
            {
                Some(existing) => {
                    debug!(path = %cumulative, folder_id = %existing.remote_folder_id, "reusing indexed folder");
                    existing.remote_folder_id
                }
                None => {
                    let created = self.remote.create_folder(segment, &current_parent).await?;
                    self.index
                        .insert_folder(segment, &created, &current_parent, user_id)
                        .await?;
                    info!(path = %cumulative, folder_id = %created, parent = %current_parent, "created remote folder");
                    created
                }
            };

            cache.insert(user_id, &cumulative, folder_id.clone());
            current_parent = folder_id;
        }

        Ok(current_parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use drivetree_core::{DriveClient, FOLDER_MIME_TYPE};
    use serde_json::json;
    use sqlx::SqlitePool;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::remote::{Backoff, RetryExecutor};

    async fn make_parts(server: &MockServer) -> (IndexStore, RemoteStorage) {
        let client = DriveClient::with_base_url(&server.uri(), "test-token").unwrap();
        let retry = RetryExecutor::new(2, Backoff::new(Duration::from_millis(1), Duration::ZERO));
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        let index = IndexStore::from_pool(pool);
        index.init().await.unwrap();
        (index, RemoteStorage::new(Arc::new(client), retry))
    }

    fn segments(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn cache_entries_are_scoped_by_owner() {
        let mut cache = ResolutionCache::new();
        cache.insert("user-1", "docs", "folder-1".into());
        cache.insert("user-1", "docs/sub", "folder-2".into());
        cache.insert("user-2", "docs", "folder-3".into());

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get("user-1", "docs"), Some("folder-1"));
        assert_eq!(cache.get("user-2", "docs"), Some("folder-3"));
        assert_eq!(cache.get("user-2", "docs/sub"), None);
        assert_eq!(cache.get("user-3", "docs"), None);
    }

    #[tokio::test]
    async fn empty_segments_resolve_to_root_without_calls() {
        let server = MockServer::start().await;
        let (index, remote) = make_parts(&server).await;
        let resolver = FolderResolver::new(&index, &remote, "root");
        let mut cache = ResolutionCache::new();

        let leaf = resolver.resolve(&mut cache, "user-1", &[]).await.unwrap();

        assert_eq!(leaf, "root");
        assert!(cache.is_empty());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn repeated_chain_in_one_batch_hits_the_cache() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/drive/v3/files"))
            .and(body_json(json!({"name": "a", "mimeType": FOLDER_MIME_TYPE, "parents": ["top"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "folder-a" })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/drive/v3/files"))
            .and(body_json(json!({"name": "b", "mimeType": FOLDER_MIME_TYPE, "parents": ["folder-a"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "folder-b" })))
            .expect(1)
            .mount(&server)
            .await;

        let (index, remote) = make_parts(&server).await;
        let resolver = FolderResolver::new(&index, &remote, "top");
        let mut cache = ResolutionCache::new();

        let first = resolver
            .resolve(&mut cache, "user-1", &segments(&["a", "b"]))
            .await
            .unwrap();
        let second = resolver
            .resolve(&mut cache, "user-1", &segments(&["a", "b"]))
            .await
            .unwrap();
        let parent = resolver
            .resolve(&mut cache, "user-1", &segments(&["a"]))
            .await
            .unwrap();

        assert_eq!(first, "folder-b");
        assert_eq!(second, "folder-b");
        assert_eq!(parent, "folder-a");
        assert_eq!(cache.get("user-1", "a/b"), Some("folder-b"));
        assert_eq!(server.received_requests().await.unwrap().len(), 2);

        let stored = index.find_folder("b", "user-1", "folder-a").await.unwrap().unwrap();
        assert_eq!(stored.remote_folder_id, "folder-b");
    }

    #[tokio::test]
    async fn indexed_folders_are_reused_across_batches() {
        let server = MockServer::start().await;
        let (index, remote) = make_parts(&server).await;
        index
            .insert_folder("docs", "folder-docs", "root", "user-1")
            .await
            .unwrap();
        index
            .insert_folder("sub", "folder-sub", "folder-docs", "user-1")
            .await
            .unwrap();

        let resolver = FolderResolver::new(&index, &remote, "root");
        let mut cache = ResolutionCache::new();
        let leaf = resolver
            .resolve(&mut cache, "user-1", &segments(&["docs", "sub"]))
            .await
            .unwrap();

        assert_eq!(leaf, "folder-sub");
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn same_name_under_other_owner_is_created_again() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/drive/v3/files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "folder-new" })))
            .expect(1)
            .mount(&server)
            .await;

        let (index, remote) = make_parts(&server).await;
        index
            .insert_folder("docs", "folder-docs", "root", "user-1")
            .await
            .unwrap();

        let resolver = FolderResolver::new(&index, &remote, "root");
        let mut cache = ResolutionCache::new();
        let leaf = resolver
            .resolve(&mut cache, "user-2", &segments(&["docs"]))
            .await
            .unwrap();

        assert_eq!(leaf, "folder-new");
        assert!(cache.get("user-1", "docs").is_none());
    }

    #[tokio::test]
    async fn remote_failure_is_propagated_without_index_write() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/drive/v3/files"))
            .respond_with(ResponseTemplate::new(404).set_body_string("parent not found"))
            .mount(&server)
            .await;

        let (index, remote) = make_parts(&server).await;
        let resolver = FolderResolver::new(&index, &remote, "missing-root");
        let mut cache = ResolutionCache::new();
        let err = resolver
            .resolve(&mut cache, "user-1", &segments(&["docs"]))
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Remote(_)));
        assert!(cache.is_empty());
        assert!(index.list_folders("user-1").await.unwrap().is_empty());
    }
}
