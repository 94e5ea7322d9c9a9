//! Integration test: real curl transfers against a local HTTP server, with the
//! item state kept in an on-disk SQLite store.

mod common;

use std::sync::Arc;
use std::time::Duration;

use dlq_core::config::TransferConfig;
use dlq_core::executor::CurlExecutor;
use dlq_core::item::{DownloadItem, FailureKind, ItemStatus};
use dlq_core::observer::NoopObserver;
use dlq_core::scheduler::{EnqueueRequest, ItemFilter, Scheduler, SchedulerConfig, SchedulerDeps};
use dlq_core::store::{ItemStore, SqliteItemStore};
use tempfile::tempdir;

fn test_body() -> Vec<u8> {
    (0u8..100).cycle().take(64 * 1024).collect()
}

fn transfer_config() -> TransferConfig {
    TransferConfig {
        connect_timeout_secs: 5,
        timeout_secs: 30,
        ..TransferConfig::default()
    }
}

async fn start(
    store: &SqliteItemStore,
    download_dir: &std::path::Path,
    max_concurrency: usize,
) -> Scheduler {
    Scheduler::start(
        SchedulerConfig {
            max_concurrency,
            download_dir: download_dir.to_path_buf(),
            progress_persist_interval: Duration::from_millis(50),
        },
        SchedulerDeps {
            store: Arc::new(store.clone()),
            executor: Arc::new(CurlExecutor::new(transfer_config())),
            observer: Arc::new(NoopObserver),
        },
    )
    .await
    .expect("start scheduler")
}

async fn wait_idle(scheduler: &Scheduler) {
    tokio::time::timeout(Duration::from_secs(30), scheduler.wait_idle())
        .await
        .expect("scheduler went idle in time")
        .expect("scheduler running");
}

async fn item(scheduler: &Scheduler, id: i64) -> DownloadItem {
    scheduler.status(id).await.unwrap().expect("item exists")
}

#[tokio::test]
async fn download_completes_and_file_matches() {
    let body = test_body();
    let base = common::http_server::start(body.clone());
    let download_dir = tempdir().unwrap();
    let state_dir = tempdir().unwrap();
    let store = SqliteItemStore::open_at(state_dir.path().join("items.db"))
        .await
        .unwrap();
    let scheduler = start(&store, download_dir.path(), 2).await;

    let id = scheduler
        .enqueue(EnqueueRequest::new("clip-1", format!("{base}/media/clip.mp4")))
        .await
        .unwrap();
    wait_idle(&scheduler).await;

    let done = item(&scheduler, id).await;
    assert_eq!(done.status, ItemStatus::Completed);
    assert_eq!(done.file_name, "clip.mp4");
    assert_eq!(done.transferred_bytes, body.len() as u64);
    assert_eq!(done.total_bytes, body.len() as u64);
    let path = done.local_path.clone().expect("local path set");
    assert_eq!(path, download_dir.path().join("clip.mp4"));
    assert_eq!(std::fs::read(&path).unwrap(), body);
    assert!(!download_dir.path().join("clip.mp4.part").exists());

    let stored = store.get(id).await.unwrap().expect("persisted");
    assert_eq!(stored, done);
    scheduler.shutdown().await.unwrap();
}

#[tokio::test]
async fn server_error_fails_item() {
    let base = common::http_server::start(test_body());
    let download_dir = tempdir().unwrap();
    let store = SqliteItemStore::open_memory().await.unwrap();
    let scheduler = start(&store, download_dir.path(), 1).await;

    let id = scheduler
        .enqueue(EnqueueRequest::new("gone", format!("{base}/missing")))
        .await
        .unwrap();
    wait_idle(&scheduler).await;

    let failed = item(&scheduler, id).await;
    assert_eq!(failed.status, ItemStatus::Failed);
    let error = failed.error.expect("error recorded");
    assert_eq!(error.kind, FailureKind::Server);
    assert!(error.message.contains("404"), "message: {}", error.message);
    assert!(failed.local_path.is_none());
    assert!(std::fs::read_dir(download_dir.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn empty_body_fails_as_zero_byte() {
    let base = common::http_server::start(test_body());
    let download_dir = tempdir().unwrap();
    let store = SqliteItemStore::open_memory().await.unwrap();
    let scheduler = start(&store, download_dir.path(), 1).await;

    let id = scheduler
        .enqueue(EnqueueRequest::new("empty", format!("{base}/empty")))
        .await
        .unwrap();
    wait_idle(&scheduler).await;

    let failed = item(&scheduler, id).await;
    assert_eq!(failed.status, ItemStatus::Failed);
    assert_eq!(failed.error.unwrap().kind, FailureKind::ZeroByteResult);
    assert!(std::fs::read_dir(download_dir.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn unreachable_host_fails_as_transport() {
    // Bind then drop to get a port nobody listens on.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let download_dir = tempdir().unwrap();
    let store = SqliteItemStore::open_memory().await.unwrap();
    let scheduler = start(&store, download_dir.path(), 1).await;

    let id = scheduler
        .enqueue(EnqueueRequest::new("closed", format!("http://127.0.0.1:{port}/a.bin")))
        .await
        .unwrap();
    wait_idle(&scheduler).await;

    let failed = item(&scheduler, id).await;
    assert_eq!(failed.status, ItemStatus::Failed);
    assert_eq!(failed.error.unwrap().kind, FailureKind::Transport);
}

#[tokio::test]
async fn many_items_complete_under_bound() {
    let body = test_body();
    let base = common::http_server::start(body.clone());
    let download_dir = tempdir().unwrap();
    let store = SqliteItemStore::open_memory().await.unwrap();
    let scheduler = start(&store, download_dir.path(), 2).await;

    for n in 0..5 {
        scheduler
            .enqueue(EnqueueRequest::new(format!("ep-{n}"), format!("{base}/show/episode.mp4")))
            .await
            .unwrap();
    }
    wait_idle(&scheduler).await;

    let items = scheduler.list_all(ItemFilter::default()).await.unwrap();
    assert_eq!(items.len(), 5);
    let mut names: Vec<_> = items.iter().map(|i| i.file_name.clone()).collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "episode.mp4",
            "episode_1.mp4",
            "episode_2.mp4",
            "episode_3.mp4",
            "episode_4.mp4"
        ]
    );
    for item in &items {
        assert_eq!(item.status, ItemStatus::Completed, "{}", item.source_ref);
        assert_eq!(std::fs::read(download_dir.path().join(&item.file_name)).unwrap(), body);
    }

    let counts = scheduler.counts().await.unwrap();
    assert_eq!(counts.completed, 5);
    let info = scheduler.storage_info().await.unwrap();
    assert_eq!(info.completed_bytes, 5 * body.len() as u64);
}

#[tokio::test]
async fn queued_items_survive_restart() {
    let body = test_body();
    let base = common::http_server::start(body.clone());
    let download_dir = tempdir().unwrap();
    let state_dir = tempdir().unwrap();
    let db_path = state_dir.path().join("items.db");

    let ids = {
        let store = SqliteItemStore::open_at(&db_path).await.unwrap();
        let scheduler = start(&store, download_dir.path(), 0).await;
        let mut ids = Vec::new();
        for name in ["a.bin", "b.bin"] {
            let id = scheduler
                .enqueue(EnqueueRequest::new(name, format!("{base}/{name}")))
                .await
                .unwrap();
            ids.push(id);
        }
        scheduler.pause(ids[1]).await.unwrap();
        scheduler.shutdown().await.unwrap();
        ids
    };

    let store = SqliteItemStore::open_at(&db_path).await.unwrap();
    let scheduler = start(&store, download_dir.path(), 2).await;
    wait_idle(&scheduler).await;

    // Paused items come back pending and run like the rest.
    for id in ids {
        let done = item(&scheduler, id).await;
        assert_eq!(done.status, ItemStatus::Completed);
        assert_eq!(std::fs::read(done.local_path.unwrap()).unwrap(), body);
    }
}

#[tokio::test]
async fn attached_queue_keeps_pauses_across_reopen() {
    let base = common::http_server::start(test_body());
    let download_dir = tempdir().unwrap();
    let state_dir = tempdir().unwrap();
    let db_path = state_dir.path().join("items.db");
    let deps = |store: &SqliteItemStore| SchedulerDeps {
        store: Arc::new(store.clone()),
        executor: Arc::new(CurlExecutor::new(transfer_config())),
        observer: Arc::new(NoopObserver),
    };
    let held = SchedulerConfig {
        max_concurrency: 0,
        download_dir: download_dir.path().to_path_buf(),
        progress_persist_interval: Duration::from_millis(50),
    };

    let store = SqliteItemStore::open_at(&db_path).await.unwrap();
    let scheduler = Scheduler::attach(held.clone(), deps(&store)).await.unwrap();
    let id = scheduler
        .enqueue(EnqueueRequest::new("held", format!("{base}/held.bin")))
        .await
        .unwrap();
    assert!(scheduler.pause(id).await.unwrap());
    scheduler.shutdown().await.unwrap();

    let store = SqliteItemStore::open_at(&db_path).await.unwrap();
    let scheduler = Scheduler::attach(held, deps(&store)).await.unwrap();
    assert_eq!(item(&scheduler, id).await.status, ItemStatus::Paused);
    assert!(scheduler.resume(id).await.unwrap());
    assert_eq!(item(&scheduler, id).await.status, ItemStatus::Pending);
    scheduler.shutdown().await.unwrap();
}
