use std::fmt;
use std::future::Future;
use std::path::PathBuf;

use bunny_core::StorageError;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, warn};

pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 10;

/// One local file and the remote key it is written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask {
    pub source: PathBuf,
    pub target_key: String,
}

#[derive(Debug)]
pub struct UploadFailure {
    pub target_key: String,
    pub error: StorageError,
}

/// Aggregate failure of an upload pass. Uploads that finished before the
/// failure stay on the remote side.
#[derive(Debug, Error)]
#[error("{} of {total} uploads failed ({skipped} not started): {}", .failures.len(), describe(.failures))]
pub struct UploadError {
    pub total: usize,
    pub completed: usize,
    pub skipped: usize,
    pub failures: Vec<UploadFailure>,
}

fn describe(failures: &[UploadFailure]) -> String {
    match failures.first() {
        Some(first) => format!("first failure at {first}"),
        None => "no failure recorded".to_string(),
    }
}

impl fmt::Display for UploadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.target_key, self.error)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub uploaded: usize,
}

/// Runs upload tasks with at most `limit` of them in flight.
#[derive(Debug, Clone, Copy)]
pub struct UploadScheduler {
    limit: usize,
}

impl Default for UploadScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_UPLOAD_CONCURRENCY)
    }
}

impl UploadScheduler {
    /// A limit of zero is raised to one.
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Executes `upload` once per task. Resolves after every started task
    /// has finished. After the first failure no further task is started;
    /// tasks already in flight run to completion.
    pub async fn run<F, Fut>(
        &self,
        tasks: Vec<UploadTask>,
        upload: F,
    ) -> Result<UploadReport, UploadError>
    where
        F: Fn(UploadTask) -> Fut,
        Fut: Future<Output = Result<(), StorageError>> + Send + 'static,
    {
        let total = tasks.len();
        let mut pending = tasks.into_iter();
        let mut in_flight = JoinSet::new();
        let mut started = 0usize;
        let mut completed = 0usize;
        let mut failures = Vec::new();

        loop {
            while failures.is_empty() && in_flight.len() < self.limit {
                let Some(task) = pending.next() else {
                    break;
                };
                let target_key = task.target_key.clone();
                let fut = upload(task);
                in_flight.spawn(async move { (target_key, fut.await) });
                started += 1;
            }

            let Some(joined) = in_flight.join_next().await else {
                break;
            };
            match joined {
                Ok((target_key, Ok(()))) => {
                    debug!(key = %target_key, "upload finished");
                    completed += 1;
                }
                Ok((target_key, Err(error))) => {
                    warn!(key = %target_key, error = %error, "upload failed");
                    failures.push(UploadFailure { target_key, error });
                }
                Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                Err(err) => {
                    warn!(error = %err, "upload task cancelled");
                }
            }
        }

        if failures.is_empty() {
            Ok(UploadReport {
                uploaded: completed,
            })
        } else {
            Err(UploadError {
                total,
                completed,
                skipped: total - started,
                failures,
            })
        }
    }
}
