//! Job control over IPC.
//!
//! While `dlq run` is active it listens on a unix socket. Each line a client
//! writes is one JSON [`ControlRequest`]; the runner answers each with one JSON
//! [`ControlReply`] line. [`dispatch`] applies a request to a scheduler, so the
//! same code serves the socket and offline CLI commands.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::item::{DownloadItem, ItemId};
use crate::scheduler::{EnqueueRequest, Scheduler, SchedulerError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ControlRequest {
    Enqueue {
        request: EnqueueRequest,
    },
    Pause {
        id: ItemId,
    },
    Resume {
        id: ItemId,
    },
    Cancel {
        id: ItemId,
    },
    Retry {
        id: ItemId,
    },
    Remove {
        id: ItemId,
        #[serde(default)]
        delete_file: bool,
    },
    PauseAll,
    ResumeAll,
    ClearCompleted {
        #[serde(default)]
        delete_files: bool,
    },
    SetMaxConcurrency {
        max_concurrency: usize,
    },
    Status {
        id: ItemId,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ControlReply {
    Enqueued { id: ItemId },
    /// `false` when the command was a no-op for the item's state.
    Changed { changed: bool },
    Count { count: usize },
    Item { item: Option<DownloadItem> },
    Done,
    Error { message: String },
}

impl ControlReply {
    fn from_result<T>(result: Result<T, SchedulerError>, ok: impl FnOnce(T) -> Self) -> Self {
        match result {
            Ok(value) => ok(value),
            Err(e) => ControlReply::Error {
                message: e.to_string(),
            },
        }
    }
}

/// Default path for the control socket (same XDG state dir as the item DB).
pub fn default_control_socket_path() -> std::io::Result<PathBuf> {
    let dir = xdg::BaseDirectories::with_prefix("dlq")?.get_state_home();
    Ok(dir.join("control.sock"))
}

/// Serialize a request or reply as one protocol line (with trailing newline).
pub fn encode_line<T: Serialize>(message: &T) -> serde_json::Result<String> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}

pub fn decode_request(line: &str) -> serde_json::Result<ControlRequest> {
    serde_json::from_str(line.trim())
}

pub fn decode_reply(line: &str) -> serde_json::Result<ControlReply> {
    serde_json::from_str(line.trim())
}

/// Apply one request to `scheduler`.
pub async fn dispatch(scheduler: &Scheduler, request: ControlRequest) -> ControlReply {
    let changed = |changed| ControlReply::Changed { changed };
    let count = |count| ControlReply::Count { count };
    match request {
        ControlRequest::Enqueue { request } => {
            ControlReply::from_result(scheduler.enqueue(request).await, |id| {
                ControlReply::Enqueued { id }
            })
        }
        ControlRequest::Pause { id } => ControlReply::from_result(scheduler.pause(id).await, changed),
        ControlRequest::Resume { id } => {
            ControlReply::from_result(scheduler.resume(id).await, changed)
        }
        ControlRequest::Cancel { id } => {
            ControlReply::from_result(scheduler.cancel(id).await, changed)
        }
        ControlRequest::Retry { id } => ControlReply::from_result(scheduler.retry(id).await, changed),
        ControlRequest::Remove { id, delete_file } => {
            ControlReply::from_result(scheduler.remove(id, delete_file).await, changed)
        }
        ControlRequest::PauseAll => ControlReply::from_result(scheduler.pause_all().await, count),
        ControlRequest::ResumeAll => ControlReply::from_result(scheduler.resume_all().await, count),
        ControlRequest::ClearCompleted { delete_files } => {
            ControlReply::from_result(scheduler.clear_completed(delete_files).await, count)
        }
        ControlRequest::SetMaxConcurrency { max_concurrency } => ControlReply::from_result(
            scheduler.set_max_concurrency(max_concurrency).await,
            |()| ControlReply::Done,
        ),
        ControlRequest::Status { id } => {
            ControlReply::from_result(scheduler.status(id).await, |item| ControlReply::Item { item })
        }
    }
}
