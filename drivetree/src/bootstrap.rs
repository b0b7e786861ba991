use std::sync::Arc;

use anyhow::Context;
use drivetree_core::DriveClient;
use tracing::info;

use crate::config::ServiceConfig;
use crate::index::{IndexError, IndexStore};
use crate::remote::RemoteStorage;
use crate::upload::UploadOrchestrator;

pub async fn open_index(config: &ServiceConfig) -> Result<IndexStore, IndexError> {
    match config.database_url.as_deref() {
        Some(url) => {
            info!(database_url = url, "opening index");
            IndexStore::new(url).await
        }
        None => IndexStore::new_default().await,
    }
}

/// Builds the one remote client of the process and the orchestrator around it.
pub async fn build_orchestrator(config: &ServiceConfig) -> anyhow::Result<UploadOrchestrator> {
    let token = config
        .access_token
        .clone()
        .context("DRIVETREE_ACCESS_TOKEN is not set")?;
    let client = DriveClient::with_base_url(&config.api_base, token)
        .with_context(|| format!("invalid API base url {}", config.api_base))?;
    let index = open_index(config)
        .await
        .context("failed to initialize index store")?;
    let remote = RemoteStorage::new(Arc::new(client), config.retry_executor());

    Ok(UploadOrchestrator::new(
        index,
        remote,
        config.upload_settings(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ServiceConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[tokio::test]
    async fn orchestrator_requires_access_token() {
        let config = config_from(&[("DRIVETREE_DATABASE_URL", "sqlite::memory:")]);
        let err = build_orchestrator(&config).await.err().unwrap();
        assert!(err.to_string().contains("DRIVETREE_ACCESS_TOKEN"));
    }

    #[tokio::test]
    async fn builds_with_in_memory_index() {
        let config = config_from(&[
            ("DRIVETREE_ACCESS_TOKEN", "token"),
            ("DRIVETREE_DATABASE_URL", "sqlite::memory:"),
        ]);
        let orchestrator = build_orchestrator(&config).await.unwrap();
        assert!(
            orchestrator
                .index()
                .list_folders("user-1")
                .await
                .unwrap()
                .is_empty()
        );
    }
}
