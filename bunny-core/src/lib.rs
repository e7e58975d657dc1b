mod client;
mod listing;

pub use client::{ApiErrorClass, StorageClient, StorageError};
pub use listing::{DIRECTORY_SIGNALS, DirectorySignal, NAME_FIELDS, RemoteEntry, parse_listing};
pub use reqwest::StatusCode;
