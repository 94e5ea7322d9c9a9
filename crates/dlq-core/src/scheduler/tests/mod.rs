//! Scheduler tests: memory store, manual executor, channel observer.


use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

use super::{EnqueueRequest, Scheduler, SchedulerConfig, SchedulerDeps};
use crate::executor::{ManualExecutor, StartedTransfer};
use crate::item::{DownloadItem, ItemId};
use crate::observer::{ChannelObserver, ObserverEvent};
use crate::store::MemoryItemStore;

pub(super) struct Harness {
    pub scheduler: Scheduler,
    pub store: Arc<MemoryItemStore>,
    pub executor: Arc<ManualExecutor>,
    pub events: UnboundedReceiver<ObserverEvent>,
    pub dir: TempDir,
}

pub(super) fn config(dir: &TempDir, max_concurrency: usize) -> SchedulerConfig {
    SchedulerConfig {
        max_concurrency,
        download_dir: dir.path().join("downloads"),
        progress_persist_interval: Duration::ZERO,
    }
}

pub(super) fn request(source_ref: &str) -> EnqueueRequest {
    EnqueueRequest::new(source_ref, format!("https://cdn.example.com/media/{source_ref}.mp4"))
}

impl Harness {
    pub async fn start(max_concurrency: usize) -> Self {
        Self::start_with(
            Arc::new(MemoryItemStore::new()),
            tempfile::tempdir().unwrap(),
            max_concurrency,
        )
        .await
    }

    pub async fn start_with(store: Arc<MemoryItemStore>, dir: TempDir, max_concurrency: usize) -> Self {
        let cfg = config(&dir, max_concurrency);
        Self::start_with_config(store, dir, cfg).await
    }

    pub async fn start_with_config(
        store: Arc<MemoryItemStore>,
        dir: TempDir,
        cfg: SchedulerConfig,
    ) -> Self {
        Self::launch(store, dir, cfg, false).await
    }

    /// Reopen a stored queue the way offline commands do: paused items stay paused.
    pub async fn attach_with(store: Arc<MemoryItemStore>, dir: TempDir, max_concurrency: usize) -> Self {
        let cfg = config(&dir, max_concurrency);
        Self::launch(store, dir, cfg, true).await
    }

    async fn launch(store: Arc<MemoryItemStore>, dir: TempDir, cfg: SchedulerConfig, attach: bool) -> Self {
        let executor = Arc::new(ManualExecutor::new());
        let (observer, events) = ChannelObserver::new();
        let deps = SchedulerDeps {
            store: store.clone(),
            executor: executor.clone(),
            observer: Arc::new(observer),
        };
        let scheduler = if attach {
            Scheduler::attach(cfg, deps).await
        } else {
            Scheduler::start(cfg, deps).await
        }
        .unwrap();
        Self {
            scheduler,
            store,
            executor,
            events,
            dir,
        }
    }

    pub async fn enqueue(&self, source_ref: &str) -> ItemId {
        self.scheduler.enqueue(request(source_ref)).await.unwrap()
    }

    pub async fn item(&self, id: ItemId) -> DownloadItem {
        self.scheduler.status(id).await.unwrap().unwrap()
    }

    /// Round trip through the inbox so every report sent before this call is applied.
    pub async fn sync(&self) {
        self.scheduler.counts().await.unwrap();
    }

    pub fn started(&self) -> Vec<StartedTransfer> {
        self.executor.take_started()
    }

    pub fn started_one(&self) -> StartedTransfer {
        let mut started = self.started();
        assert_eq!(started.len(), 1, "expected exactly one started transfer");
        started.remove(0)
    }

    pub fn drain_events(&mut self) -> Vec<ObserverEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }

    pub fn download_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("downloads")
    }
}
