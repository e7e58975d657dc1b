use std::path::Path;

use bunny_core::{StorageClient, StorageError};
use thiserror::Error;
use tracing::info;

use super::inventory::{InventoryError, LocalInventory};
use super::paths::join_key;
use super::prune::{PruneReport, discard_delete_result, prune_remote};
use super::transfer::{UploadError, UploadScheduler, UploadTask};
use crate::config::{CleanMode, ConfigError, SyncConfig};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("inventory error: {0}")]
    Inventory(#[from] InventoryError),
    #[error("remote listing failed: {0}")]
    Listing(#[source] StorageError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Upload(#[from] UploadError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub uploaded: usize,
    pub cleaned: PruneReport,
}

/// Mirrors a local directory into a remote directory of one storage zone.
pub struct SyncEngine {
    client: StorageClient,
    clean: CleanMode,
    scheduler: UploadScheduler,
}

impl SyncEngine {
    pub fn new(client: StorageClient) -> Self {
        Self {
            client,
            clean: CleanMode::default(),
            scheduler: UploadScheduler::default(),
        }
    }

    pub fn from_config(config: &SyncConfig) -> Result<Self, SyncError> {
        config.validate()?;
        let client = match config.endpoint.as_deref() {
            Some(endpoint) => StorageClient::with_base_url(
                endpoint,
                config.storage_zone.as_str(),
                config.access_key.as_str(),
            )?,
            None => StorageClient::new(
                config.storage_zone.as_str(),
                config.access_key.as_str(),
                config.region.as_deref(),
            )?,
        };
        Ok(Self::new(client)
            .with_clean(config.clean)
            .with_max_concurrent_uploads(config.max_concurrent_uploads))
    }

    pub fn with_clean(mut self, clean: CleanMode) -> Self {
        self.clean = clean;
        self
    }

    pub fn with_max_concurrent_uploads(mut self, limit: usize) -> Self {
        self.scheduler = UploadScheduler::new(limit);
        self
    }

    /// Uploads every file below `source_root` to `target_root`, cleaning the
    /// remote side first according to the configured mode. Cleaning always
    /// finishes before the first upload starts.
    pub async fn synchronize(
        &self,
        source_root: &Path,
        target_root: &str,
    ) -> Result<SyncReport, SyncError> {
        info!(
            source = %source_root.display(),
            zone = self.client.zone(),
            target = target_root,
            clean = %self.clean,
            "synchronizing"
        );
        StorageClient::check_key(target_root)?;
        let inventory = LocalInventory::scan(source_root).await?;

        let cleaned = match self.clean {
            CleanMode::None => PruneReport::default(),
            CleanMode::Simple => {
                let result = self.client.delete_directory(target_root).await;
                discard_delete_result(target_root, result)
            }
            CleanMode::AvoidDeletes => prune_remote(&self.client, target_root, &inventory)
                .await
                .map_err(SyncError::Listing)?,
        };

        let tasks = upload_tasks(source_root, target_root, &inventory);
        let client = self.client.clone();
        let uploads = self
            .scheduler
            .run(tasks, move |task| {
                let client = client.clone();
                async move { client.upload_file(&task.source, &task.target_key).await }
            })
            .await?;

        info!(
            uploaded = uploads.uploaded,
            deleted = cleaned.deleted,
            "synchronization complete"
        );
        Ok(SyncReport {
            uploaded: uploads.uploaded,
            cleaned,
        })
    }

    pub async fn upload_one(&self, source: &Path, key: &str) -> Result<(), StorageError> {
        self.client.upload_file(source, key).await
    }

    pub async fn delete_one(&self, key: &str) -> Result<(), StorageError> {
        self.client.delete(key).await
    }
}

/// One task per inventory file, in inventory order.
pub fn upload_tasks(
    source_root: &Path,
    target_root: &str,
    inventory: &LocalInventory,
) -> Vec<UploadTask> {
    inventory
        .files()
        .iter()
        .map(|relative| UploadTask {
            source: source_root.join(relative),
            target_key: join_key(target_root, relative),
        })
        .collect()
}

/// Builds a client from `config` and mirrors `source_root` into
/// `target_root`.
pub async fn synchronize(
    source_root: &Path,
    target_root: &str,
    config: &SyncConfig,
) -> Result<SyncReport, SyncError> {
    SyncEngine::from_config(config)?
        .synchronize(source_root, target_root)
        .await
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
