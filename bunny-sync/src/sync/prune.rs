use bunny_core::{StorageClient, StorageError};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tracing::{debug, info, warn};

use super::inventory::LocalInventory;
use super::paths::join_key;

/// Counts of delete calls issued while pruning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub deleted: usize,
    pub failed_deletes: usize,
}

impl PruneReport {
    fn merge(&mut self, other: PruneReport) {
        self.deleted += other.deleted;
        self.failed_deletes += other.failed_deletes;
    }
}

/// Deletes every remote object and directory under `target_root` that the
/// inventory does not contain, without touching keys the upload pass will
/// overwrite. Listing failures abort; delete failures are logged and
/// skipped.
pub async fn prune_remote(
    client: &StorageClient,
    target_root: &str,
    inventory: &LocalInventory,
) -> Result<PruneReport, StorageError> {
    let pruner = Pruner {
        client,
        target_root,
        inventory,
    };
    let report = pruner.prune_dir(String::new()).await?;
    info!(
        target = target_root,
        deleted = report.deleted,
        failed = report.failed_deletes,
        "pruned remote"
    );
    Ok(report)
}

struct Pruner<'a> {
    client: &'a StorageClient,
    target_root: &'a str,
    inventory: &'a LocalInventory,
}

impl<'a> Pruner<'a> {
    /// One remote level, depth-first. `relative_dir` is relative to the
    /// target root; empty means the root itself.
    fn prune_dir(&self, relative_dir: String) -> BoxFuture<'_, Result<PruneReport, StorageError>> {
        async move {
            let remote_dir = join_key(self.target_root, &relative_dir);
            let mut report = PruneReport::default();
            for entry in self.client.list_directory(&remote_dir).await? {
                let relative = join_key(&relative_dir, &entry.name);
                let remote_key = join_key(self.target_root, &relative);
                if entry.is_directory {
                    if self.inventory.contains_dir(&relative) {
                        report.merge(self.prune_dir(relative).await?);
                    } else {
                        report.merge(purge_dir(self.client, remote_key).await?);
                    }
                } else if !self.inventory.contains_file(&relative) {
                    let result = self.client.delete(&remote_key).await;
                    report.merge(discard_delete_result(&remote_key, result));
                } else {
                    debug!(key = %remote_key, "kept for overwrite");
                }
            }
            Ok(report)
        }
        .boxed()
    }
}

/// Deletes a remote directory with everything below it, children first.
fn purge_dir(
    client: &StorageClient,
    remote_dir: String,
) -> BoxFuture<'_, Result<PruneReport, StorageError>> {
    async move {
        let mut report = PruneReport::default();
        for entry in client.list_directory(&remote_dir).await? {
            let child = join_key(&remote_dir, &entry.name);
            if entry.is_directory {
                report.merge(purge_dir(client, child).await?);
            } else {
                let result = client.delete(&child).await;
                report.merge(discard_delete_result(&child, result));
            }
        }
        let result = client.delete_directory(&remote_dir).await;
        report.merge(discard_delete_result(&remote_dir, result));
        Ok(report)
    }
    .boxed()
}

/// Records the outcome of a best-effort delete. The error is logged and
/// dropped: an object that is already gone is the wanted end state.
pub(crate) fn discard_delete_result(key: &str, result: Result<(), StorageError>) -> PruneReport {
    match result {
        Ok(()) => PruneReport {
            deleted: 1,
            failed_deletes: 0,
        },
        Err(err) if err.is_not_found() => {
            debug!(key, "delete skipped, already absent");
            PruneReport {
                deleted: 0,
                failed_deletes: 1,
            }
        }
        Err(err) => {
            warn!(key, error = %err, "delete failed, ignoring");
            PruneReport {
                deleted: 0,
                failed_deletes: 1,
            }
        }
    }
}
