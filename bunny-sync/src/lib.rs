//! Mirrors a local directory tree into a Bunny storage zone.
//!
//! A run builds a [`LocalInventory`] of the source tree, optionally cleans
//! the remote target (see [`CleanMode`]), then uploads every file with a
//! bounded number of concurrent requests.

pub mod config;
pub mod sync;

pub use config::{CleanMode, ConfigError, SyncConfig};
pub use sync::engine::{SyncEngine, SyncError, SyncReport, synchronize, upload_tasks};
pub use sync::inventory::{InventoryError, LocalInventory};
pub use sync::prune::{PruneReport, prune_remote};
pub use sync::transfer::{
    DEFAULT_UPLOAD_CONCURRENCY, UploadError, UploadFailure, UploadReport, UploadScheduler,
    UploadTask,
};
