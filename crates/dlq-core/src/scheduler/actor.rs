//! The scheduler task: owned state, the inbox loop, and shared helpers.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::{UnboundedReceiver, WeakUnboundedSender};
use tokio::sync::{oneshot, watch};

use super::command::{Command, Inbox};
use super::{QueueCounts, SchedulerConfig, SchedulerDeps, SchedulerError};
use crate::executor::{TransferExecutor, TransferHandle};
use crate::item::{now_millis, DownloadItem, FailureKind, ItemId};
use crate::observer::{Alert, Observer};
use crate::storage;
use crate::store::{ItemStore, StoreError};

/// Scheduler-side bookkeeping for one item.
pub(super) struct Entry {
    pub item: DownloadItem,
    /// Bumped on every admission; reports carrying another value are stale.
    pub activation: u64,
    pub handle: Option<TransferHandle>,
    pub last_persist: Option<Instant>,
}

impl Entry {
    pub fn new(item: DownloadItem) -> Self {
        Self {
            item,
            activation: 0,
            handle: None,
            last_persist: None,
        }
    }
}

pub(super) struct SchedulerActor {
    pub config: SchedulerConfig,
    pub store: Arc<dyn ItemStore>,
    pub executor: Arc<dyn TransferExecutor>,
    pub observer: Arc<dyn Observer>,
    /// Weak so the task ends once every `Scheduler` handle and reporter is gone.
    pub inbox: WeakUnboundedSender<Inbox>,
    pub entries: HashMap<ItemId, Entry>,
    pub by_source: HashMap<String, ItemId>,
    pub next_activation: u64,
    pub last_created_at: i64,
    pub counts_tx: watch::Sender<QueueCounts>,
    pub last_reported: Option<(usize, usize)>,
}

impl SchedulerActor {
    pub fn new(
        config: SchedulerConfig,
        deps: SchedulerDeps,
        inbox: WeakUnboundedSender<Inbox>,
        counts_tx: watch::Sender<QueueCounts>,
    ) -> Self {
        Self {
            config,
            store: deps.store,
            executor: deps.executor,
            observer: deps.observer,
            inbox,
            entries: HashMap::new(),
            by_source: HashMap::new(),
            next_activation: 0,
            last_created_at: 0,
            counts_tx,
            last_reported: None,
        }
    }

    pub async fn run(mut self, mut inbox: UnboundedReceiver<Inbox>) {
        tracing::debug!(
            "scheduler running: {} items, max_concurrency {}",
            self.entries.len(),
            self.config.max_concurrency
        );
        while let Some(message) = inbox.recv().await {
            match message {
                Inbox::Command(Command::Shutdown(reply)) => {
                    self.stop_transfers();
                    let _ = reply.send(());
                    break;
                }
                Inbox::Command(command) => self.handle_command(command).await,
                Inbox::Transfer(update) => self.on_transfer(update).await,
            }
        }
        self.stop_transfers();
        tracing::debug!("scheduler task exited");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Enqueue(request, reply) => {
                let result = self.enqueue(request).await;
                self.respond(reply, result);
            }
            Command::Pause(id, reply) => {
                let result = self.pause(id).await;
                self.respond(reply, result);
            }
            Command::Resume(id, reply) => {
                let result = self.resume(id).await;
                self.respond(reply, result);
            }
            Command::Cancel(id, reply) => {
                let result = self.cancel(id).await;
                self.respond(reply, result);
            }
            Command::Retry(id, reply) => {
                let result = self.retry(id).await;
                self.respond(reply, result);
            }
            Command::Remove {
                id,
                delete_file,
                reply,
            } => {
                let result = self.remove(id, delete_file).await;
                self.respond(reply, result);
            }
            Command::PauseAll(reply) => {
                let result = self.pause_all().await;
                self.respond(reply, result);
            }
            Command::ResumeAll(reply) => {
                let result = self.resume_all().await;
                self.respond(reply, result);
            }
            Command::ClearCompleted {
                delete_files,
                reply,
            } => {
                let result = self.clear_completed(delete_files).await;
                self.respond(reply, result);
            }
            Command::Status(id, reply) => {
                let item = self.entries.get(&id).map(|e| e.item.clone());
                let _ = reply.send(item);
            }
            Command::List(filter, reply) => {
                let _ = reply.send(self.list(filter));
            }
            Command::Counts(reply) => {
                let _ = reply.send(self.counts());
            }
            Command::StorageInfo(reply) => {
                let _ = reply.send(self.storage_info());
            }
            Command::SetMaxConcurrency(max_concurrency, reply) => {
                self.set_max_concurrency(max_concurrency).await;
                self.respond(reply, ());
            }
            Command::Shutdown(reply) => {
                let _ = reply.send(());
            }
        }
    }

    /// Publish counts before replying so a caller that awaits the reply and then
    /// calls `wait_idle` sees the new state.
    fn respond<T>(&mut self, reply: oneshot::Sender<T>, value: T) {
        self.publish_counts();
        let _ = reply.send(value);
    }

    fn stop_transfers(&mut self) {
        for entry in self.entries.values_mut() {
            if let Some(handle) = entry.handle.take() {
                handle.stop();
            }
        }
    }

    pub fn final_path(&self, item: &DownloadItem) -> PathBuf {
        self.config.download_dir.join(&item.file_name)
    }

    pub fn part_path(&self, item: &DownloadItem) -> PathBuf {
        storage::part_path(&self.final_path(item))
    }

    /// `created_at` for a new item: wall clock, forced strictly past the previous one.
    pub fn next_created_at(&mut self) -> i64 {
        let created_at = now_millis().max(self.last_created_at + 1);
        self.last_created_at = created_at;
        created_at
    }

    /// Persist `next`, then make it the in-memory item and notify observers.
    /// On failure nothing changes in memory and an alert is raised.
    pub async fn commit(&mut self, next: DownloadItem) -> Result<(), SchedulerError> {
        if let Err(e) = self.store.update(&next).await {
            self.persistence_alert(Some(next.id), &e);
            return Err(e.into());
        }
        self.apply(next);
        Ok(())
    }

    /// In-memory half of a commit.
    pub fn apply(&mut self, next: DownloadItem) {
        if let Some(entry) = self.entries.get_mut(&next.id) {
            entry.item = next;
            self.observer.item_changed(&entry.item);
        }
    }

    pub fn alert(&self, item_id: Option<ItemId>, kind: FailureKind, message: String) {
        let alert = Alert {
            item_id,
            kind,
            message,
        };
        tracing::warn!("alert: {}", alert);
        self.observer.alert(&alert);
    }

    pub fn persistence_alert(&self, item_id: Option<ItemId>, e: &StoreError) {
        self.alert(item_id, FailureKind::Persistence, e.to_string());
    }

    /// Best-effort file removal; failures are logged, never fatal.
    pub fn remove_file(&self, path: &Path) {
        if let Err(e) = storage::discard(path) {
            tracing::warn!("could not delete {}: {}", path.display(), e);
        }
    }
}
