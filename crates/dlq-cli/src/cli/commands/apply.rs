//! Routes a control request to a running `dlq run`, or applies it offline.

use anyhow::{Context, Result};
use dlq_core::config::DlqConfig;
use dlq_core::control::{self, ControlReply, ControlRequest};
use dlq_core::executor::CurlExecutor;
use dlq_core::item::ItemId;
use dlq_core::observer::NoopObserver;
use dlq_core::scheduler::{Scheduler, SchedulerDeps};
use dlq_core::store::SqliteItemStore;
use std::sync::Arc;

use crate::cli::control_socket;

/// Send `request` to the runner if one is listening, otherwise apply it through a
/// scheduler attached to the stored queue. That scheduler holds admission, so
/// nothing starts downloading, and leaves paused items paused.
pub async fn send_or_apply(
    cfg: &DlqConfig,
    store: &SqliteItemStore,
    request: ControlRequest,
) -> Result<ControlReply> {
    if let Some(reply) = send_to_runner(&request).await? {
        return Ok(reply);
    }
    tracing::debug!(?request, "no runner listening; applying offline");

    let scheduler = Scheduler::attach(
        cfg.scheduler_config(Some(0))?,
        SchedulerDeps {
            store: Arc::new(store.clone()),
            executor: Arc::new(CurlExecutor::new(cfg.transfer())),
            observer: Arc::new(NoopObserver),
        },
    )
    .await
    .context("opening download queue")?;
    let reply = control::dispatch(&scheduler, request).await;
    scheduler.shutdown().await?;
    Ok(reply)
}

/// `None` when no `dlq run` is listening on the control socket.
pub async fn send_to_runner(request: &ControlRequest) -> Result<Option<ControlReply>> {
    let path = match control::default_control_socket_path() {
        Ok(path) => path,
        Err(e) => {
            tracing::debug!("no control socket path: {}", e);
            return Ok(None);
        }
    };
    control_socket::send_request(&path, request).await
}

pub fn expect_enqueued(reply: ControlReply) -> Result<ItemId> {
    match reply {
        ControlReply::Enqueued { id } => Ok(id),
        other => Err(unexpected(other)),
    }
}

pub fn expect_changed(reply: ControlReply) -> Result<bool> {
    match reply {
        ControlReply::Changed { changed } => Ok(changed),
        other => Err(unexpected(other)),
    }
}

pub fn expect_count(reply: ControlReply) -> Result<usize> {
    match reply {
        ControlReply::Count { count } => Ok(count),
        other => Err(unexpected(other)),
    }
}

pub fn expect_done(reply: ControlReply) -> Result<()> {
    match reply {
        ControlReply::Done => Ok(()),
        other => Err(unexpected(other)),
    }
}

fn unexpected(reply: ControlReply) -> anyhow::Error {
    match reply {
        ControlReply::Error { message } => anyhow::anyhow!(message),
        other => anyhow::anyhow!("unexpected reply from runner: {:?}", other),
    }
}
