//! `dlq run` – run the scheduler until the queue drains.

use anyhow::{Context, Result};
use dlq_core::config::DlqConfig;
use dlq_core::control;
use dlq_core::executor::CurlExecutor;
use dlq_core::scheduler::{QueueCounts, Scheduler, SchedulerDeps};
use dlq_core::store::SqliteItemStore;
use std::sync::Arc;

use crate::cli::console::ConsoleObserver;
use crate::cli::control_socket;

pub async fn run_scheduler(
    store: SqliteItemStore,
    cfg: &DlqConfig,
    jobs: Option<usize>,
    keep_alive: bool,
) -> Result<()> {
    let config = cfg.scheduler_config(jobs)?;

    // Claim the control socket before touching the queue: a live runner owns its
    // active items and must not have them recovered under it.
    let socket_path = control::default_control_socket_path().ok();
    let socket = match &socket_path {
        Some(path) => {
            control_socket::ensure_no_runner(path).await?;
            match control_socket::bind_control_socket(path).await {
                Ok(listener) => {
                    tracing::debug!(path = %path.display(), "control socket listening");
                    Some(listener)
                }
                Err(e) => {
                    tracing::warn!("control socket unavailable: {:#}", e);
                    None
                }
            }
        }
        None => None,
    };

    tracing::info!(
        "starting scheduler: max_concurrency={} download_dir={}",
        config.max_concurrency,
        config.download_dir.display()
    );
    let scheduler = Scheduler::start(
        config,
        SchedulerDeps {
            store: Arc::new(store),
            executor: Arc::new(CurlExecutor::new(cfg.transfer())),
            observer: Arc::new(ConsoleObserver::new()),
        },
    )
    .await
    .context("starting scheduler")?;
    let listener =
        socket.map(|socket| control_socket::spawn_control_listener(scheduler.clone(), socket));

    let counts = scheduler.counts().await?;
    if counts.is_idle() && !keep_alive {
        println!("No queued items.");
    } else {
        let finished = tokio::select! {
            idle = wait(&scheduler, keep_alive) => Some(idle?),
            _ = tokio::signal::ctrl_c() => None,
        };
        match finished {
            Some(counts) => print_summary(&counts),
            None => println!("Interrupted; unfinished items resume on the next run."),
        }
    }

    if let Some(handle) = listener {
        handle.abort();
        if let Some(path) = &socket_path {
            let _ = std::fs::remove_file(path);
        }
    }
    scheduler.shutdown().await?;
    Ok(())
}

/// Resolves when the queue is idle, or never with `keep_alive`.
async fn wait(scheduler: &Scheduler, keep_alive: bool) -> Result<QueueCounts> {
    if keep_alive {
        std::future::pending::<()>().await;
    }
    Ok(scheduler.wait_idle().await?)
}

fn print_summary(counts: &QueueCounts) {
    println!(
        "Queue idle: {} completed, {} failed, {} paused",
        counts.completed, counts.failed, counts.paused
    );
    tracing::info!("run finished: {:?}", counts);
}
