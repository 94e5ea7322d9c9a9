use std::io;

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("resource {0:?} is already queued")]
    DuplicateResource(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("persisting item state: {0}")]
    Persistence(#[source] StoreError),
    #[error("preparing download directory: {0}")]
    DownloadDir(#[source] io::Error),
    #[error("scheduler is not running")]
    Stopped,
}

impl From<StoreError> for SchedulerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateSourceRef(source_ref) => SchedulerError::DuplicateResource(source_ref),
            other => SchedulerError::Persistence(other),
        }
    }
}
