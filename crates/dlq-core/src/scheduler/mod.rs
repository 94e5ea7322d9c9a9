//! Item scheduler.
//!
//! One tokio task owns every item. Caller commands and executor reports share
//! a single FIFO inbox, so the task sees them in the order they were sent and
//! never needs per-item locks. [`Scheduler`] is the cloneable handle callers
//! use; every method is a round trip through that inbox.
//!
//! Admission keeps at most `max_concurrency` items active, picking pending
//! items by priority (higher first), then creation time, then id.

mod actor;
mod admission;
mod choose;
mod command;
mod counts;
mod error;
mod ops;
mod reconcile;
mod recovery;

#[cfg(test)]
mod tests;

pub use counts::{QueueCounts, StorageInfo};
pub use error::SchedulerError;
pub(crate) use command::{Inbox, TransferUpdate};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};

use crate::executor::TransferExecutor;
use crate::item::{ContentKind, DownloadItem, ItemId, ItemStatus};
use crate::observer::Observer;
use crate::store::ItemStore;

use self::actor::SchedulerActor;
use self::command::Command;
use self::recovery::Recovery;

/// Runtime settings for one scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// 0 holds admission entirely.
    pub max_concurrency: usize,
    /// Finished files land here; created at start if missing.
    pub download_dir: PathBuf,
    /// Minimum spacing between progress writes to the store, per item.
    pub progress_persist_interval: Duration,
}

/// Collaborators the scheduler drives.
#[derive(Clone)]
pub struct SchedulerDeps {
    pub store: Arc<dyn ItemStore>,
    pub executor: Arc<dyn TransferExecutor>,
    pub observer: Arc<dyn Observer>,
}

/// What a caller asks to download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnqueueRequest {
    pub source_ref: String,
    pub url: String,
    /// Display title; defaults to the resolved file name.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub kind: ContentKind,
    /// Suggested file name; otherwise derived from the URL.
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub priority: i32,
}

impl EnqueueRequest {
    pub fn new(source_ref: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            source_ref: source_ref.into(),
            url: url.into(),
            title: None,
            kind: ContentKind::default(),
            file_name: None,
            priority: 0,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_kind(mut self, kind: ContentKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }
}

/// Selects items for [`Scheduler::list_all`]. The default matches everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemFilter {
    pub status: Option<ItemStatus>,
    pub kind: Option<ContentKind>,
}

impl ItemFilter {
    pub fn status(status: ItemStatus) -> Self {
        Self {
            status: Some(status),
            kind: None,
        }
    }

    pub fn matches(&self, item: &DownloadItem) -> bool {
        self.status.map_or(true, |s| item.status == s) && self.kind.map_or(true, |k| item.kind == k)
    }
}

/// Handle to a running scheduler task.
#[derive(Clone)]
pub struct Scheduler {
    inbox: mpsc::UnboundedSender<Inbox>,
    counts: watch::Receiver<QueueCounts>,
}

impl Scheduler {
    /// Load items from the store, recover interrupted ones, run admission and spawn the task.
    ///
    /// Items left `active` or `paused` by a previous process return to `pending`
    /// with counters reset and their part files deleted.
    pub async fn start(config: SchedulerConfig, deps: SchedulerDeps) -> Result<Self, SchedulerError> {
        Self::launch(config, deps, Recovery::Full).await
    }

    /// Like [`Scheduler::start`], but `paused` items stay paused. Only `active` rows,
    /// which no live process owns, go back to `pending`. For short-lived handles
    /// that apply a few commands to a stored queue.
    pub async fn attach(config: SchedulerConfig, deps: SchedulerDeps) -> Result<Self, SchedulerError> {
        Self::launch(config, deps, Recovery::KeepPaused).await
    }

    async fn launch(
        config: SchedulerConfig,
        deps: SchedulerDeps,
        recovery: Recovery,
    ) -> Result<Self, SchedulerError> {
        tokio::fs::create_dir_all(&config.download_dir)
            .await
            .map_err(SchedulerError::DownloadDir)?;

        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let (counts_tx, counts_rx) = watch::channel(QueueCounts::default());

        let mut actor = SchedulerActor::new(config, deps, inbox_tx.downgrade(), counts_tx);
        actor.recover(recovery).await?;
        actor.admit().await;
        actor.publish_counts();
        tokio::spawn(actor.run(inbox_rx));

        Ok(Self {
            inbox: inbox_tx,
            counts: counts_rx,
        })
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, SchedulerError> {
        let (tx, rx) = oneshot::channel();
        self.inbox
            .send(Inbox::Command(make(tx)))
            .map_err(|_| SchedulerError::Stopped)?;
        rx.await.map_err(|_| SchedulerError::Stopped)
    }

    /// Queue a new item. Fails with `DuplicateResource` if `source_ref` is already live.
    pub async fn enqueue(&self, request: EnqueueRequest) -> Result<ItemId, SchedulerError> {
        self.request(|reply| Command::Enqueue(request, reply)).await?
    }

    /// Pause an active or pending item. Returns `false` if there was nothing to pause.
    pub async fn pause(&self, id: ItemId) -> Result<bool, SchedulerError> {
        self.request(|reply| Command::Pause(id, reply)).await?
    }

    /// Move a paused item back to pending.
    pub async fn resume(&self, id: ItemId) -> Result<bool, SchedulerError> {
        self.request(|reply| Command::Resume(id, reply)).await?
    }

    /// Stop and delete a pending, active or paused item and its partial file.
    pub async fn cancel(&self, id: ItemId) -> Result<bool, SchedulerError> {
        self.request(|reply| Command::Cancel(id, reply)).await?
    }

    /// Move a failed item back to pending with counters and error cleared.
    pub async fn retry(&self, id: ItemId) -> Result<bool, SchedulerError> {
        self.request(|reply| Command::Retry(id, reply)).await?
    }

    /// Delete an item in any state. A completed item's file is deleted only with `delete_file`.
    pub async fn remove(&self, id: ItemId, delete_file: bool) -> Result<bool, SchedulerError> {
        self.request(|reply| Command::Remove {
            id,
            delete_file,
            reply,
        })
        .await?
    }

    /// Pause every active and pending item. Returns how many changed.
    pub async fn pause_all(&self) -> Result<usize, SchedulerError> {
        self.request(Command::PauseAll).await?
    }

    pub async fn resume_all(&self) -> Result<usize, SchedulerError> {
        self.request(Command::ResumeAll).await?
    }

    /// Drop every completed item's record; their files too with `delete_files`.
    pub async fn clear_completed(&self, delete_files: bool) -> Result<usize, SchedulerError> {
        self.request(|reply| Command::ClearCompleted {
            delete_files,
            reply,
        })
        .await?
    }

    pub async fn status(&self, id: ItemId) -> Result<Option<DownloadItem>, SchedulerError> {
        self.request(|reply| Command::Status(id, reply)).await
    }

    /// Items matching `filter`, in admission order.
    pub async fn list_all(&self, filter: ItemFilter) -> Result<Vec<DownloadItem>, SchedulerError> {
        self.request(|reply| Command::List(filter, reply)).await
    }

    pub async fn counts(&self) -> Result<QueueCounts, SchedulerError> {
        self.request(Command::Counts).await
    }

    pub async fn storage_info(&self) -> Result<StorageInfo, SchedulerError> {
        self.request(Command::StorageInfo).await
    }

    /// Change the concurrency bound. Raising it admits immediately; lowering it
    /// lets running transfers finish.
    pub async fn set_max_concurrency(&self, max_concurrency: usize) -> Result<(), SchedulerError> {
        self.request(|reply| Command::SetMaxConcurrency(max_concurrency, reply))
            .await
    }

    /// Wait until nothing is active or pending. Never returns while admission is held at 0
    /// with pending items.
    pub async fn wait_idle(&self) -> Result<QueueCounts, SchedulerError> {
        let mut counts = self.counts.clone();
        let idle = counts
            .wait_for(QueueCounts::is_idle)
            .await
            .map_err(|_| SchedulerError::Stopped)?;
        Ok(*idle)
    }

    /// Stop all transfers and end the task. Interrupted items stay `active` in the
    /// store and are recovered by the next start.
    pub async fn shutdown(&self) -> Result<(), SchedulerError> {
        self.request(Command::Shutdown).await
    }
}
