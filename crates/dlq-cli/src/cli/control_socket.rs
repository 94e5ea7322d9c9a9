//! Control socket: server (during `dlq run`) and client (for the control commands).
//! Protocol: one JSON request per line, answered by one JSON reply per line.

use anyhow::{bail, Context, Result};
use dlq_core::control::{self, ControlReply, ControlRequest};
use dlq_core::scheduler::Scheduler;
use std::io::ErrorKind;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

/// Fails if another `dlq run` answers on `path`. A socket file nobody listens on is stale.
pub async fn ensure_no_runner(path: &Path) -> Result<()> {
    match UnixStream::connect(path).await {
        Ok(_) => bail!(
            "another `dlq run` is already running (control socket {})",
            path.display()
        ),
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::ConnectionRefused) => Ok(()),
        Err(e) => Err(e).with_context(|| format!("probing control socket {}", path.display())),
    }
}

/// Binds the control socket at `path`, replacing a stale socket file.
/// Fails if a live runner owns it.
pub async fn bind_control_socket(path: &Path) -> Result<UnixListener> {
    ensure_no_runner(path).await?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let _ = std::fs::remove_file(path);
    UnixListener::bind(path).with_context(|| format!("binding control socket {}", path.display()))
}

/// Spawns a task that applies each request line received on `listener` to `scheduler`.
pub fn spawn_control_listener(
    scheduler: Scheduler,
    listener: UnixListener,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    tokio::spawn(serve_connection(scheduler.clone(), stream));
                }
                Err(e) => tracing::debug!("control socket accept: {}", e),
            }
        }
    })
}

async fn serve_connection(scheduler: Scheduler, stream: UnixStream) {
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }
        let reply = match control::decode_request(&line) {
            Ok(request) => {
                tracing::debug!(?request, "control request");
                control::dispatch(&scheduler, request).await
            }
            Err(e) => ControlReply::Error {
                message: format!("malformed control request: {e}"),
            },
        };
        let Ok(encoded) = control::encode_line(&reply) else {
            break;
        };
        if write.write_all(encoded.as_bytes()).await.is_err() {
            break;
        }
    }
}

/// Sends one request and waits for the reply. Returns `None` when no runner is listening.
pub async fn send_request(socket_path: &Path, request: &ControlRequest) -> Result<Option<ControlReply>> {
    let stream = match UnixStream::connect(socket_path).await {
        Ok(stream) => stream,
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::ConnectionRefused) => {
            return Ok(None)
        }
        Err(e) => {
            return Err(e).with_context(|| format!("connecting to {}", socket_path.display()))
        }
    };
    let (read, mut write) = stream.into_split();
    write
        .write_all(control::encode_line(request)?.as_bytes())
        .await?;
    let line = BufReader::new(read)
        .lines()
        .next_line()
        .await?
        .context("runner closed the control socket without replying")?;
    Ok(Some(control::decode_reply(&line)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dlq_core::executor::ManualExecutor;
    use dlq_core::item::ItemStatus;
    use dlq_core::observer::NoopObserver;
    use dlq_core::scheduler::{EnqueueRequest, SchedulerConfig, SchedulerDeps};
    use dlq_core::store::MemoryItemStore;
    use std::sync::Arc;
    use std::time::Duration;

    async fn scheduler(dir: &Path) -> Scheduler {
        Scheduler::start(
            SchedulerConfig {
                max_concurrency: 0,
                download_dir: dir.join("downloads"),
                progress_persist_interval: Duration::ZERO,
            },
            SchedulerDeps {
                store: Arc::new(MemoryItemStore::new()),
                executor: Arc::new(ManualExecutor::new()),
                observer: Arc::new(NoopObserver),
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn requests_round_trip_through_socket() {
        let dir = tempfile::tempdir().unwrap();
        let scheduler = scheduler(dir.path()).await;
        let path = dir.path().join("control.sock");
        let listener = spawn_control_listener(
            scheduler.clone(),
            bind_control_socket(&path).await.unwrap(),
        );

        let enqueue = ControlRequest::Enqueue {
            request: EnqueueRequest::new("r1", "https://example.com/a.mp4"),
        };
        let reply = send_request(&path, &enqueue).await.unwrap().unwrap();
        let ControlReply::Enqueued { id } = reply else {
            panic!("unexpected reply {reply:?}");
        };

        let reply = send_request(&path, &ControlRequest::Pause { id }).await.unwrap();
        assert_eq!(reply, Some(ControlReply::Changed { changed: true }));
        let item = scheduler.status(id).await.unwrap().unwrap();
        assert_eq!(item.status, ItemStatus::Paused);

        let reply = send_request(&path, &ControlRequest::Retry { id }).await.unwrap();
        assert_eq!(reply, Some(ControlReply::Changed { changed: false }));

        listener.abort();
        scheduler.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn malformed_line_gets_error_reply() {
        let dir = tempfile::tempdir().unwrap();
        let scheduler = scheduler(dir.path()).await;
        let path = dir.path().join("control.sock");
        let listener = spawn_control_listener(
            scheduler.clone(),
            bind_control_socket(&path).await.unwrap(),
        );

        let mut stream = UnixStream::connect(&path).await.unwrap();
        stream.write_all(b"pause 4\n").await.unwrap();
        let mut lines = BufReader::new(stream).lines();
        let line = lines.next_line().await.unwrap().unwrap();
        match control::decode_reply(&line).unwrap() {
            ControlReply::Error { message } => assert!(message.contains("malformed")),
            other => panic!("unexpected reply {other:?}"),
        }
        listener.abort();
    }

    #[tokio::test]
    async fn no_runner_means_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("control.sock");
        let reply = send_request(&path, &ControlRequest::PauseAll).await.unwrap();
        assert!(reply.is_none());

        // A socket file left behind by a dead runner refuses connections.
        drop(std::os::unix::net::UnixListener::bind(&path).unwrap());
        let reply = send_request(&path, &ControlRequest::PauseAll).await.unwrap();
        assert!(reply.is_none());
    }

    #[tokio::test]
    async fn second_runner_cannot_take_over_socket() {
        let dir = tempfile::tempdir().unwrap();
        let scheduler = scheduler(dir.path()).await;
        let path = dir.path().join("control.sock");
        let listener = spawn_control_listener(
            scheduler.clone(),
            bind_control_socket(&path).await.unwrap(),
        );

        let err = bind_control_socket(&path).await.unwrap_err();
        assert!(err.to_string().contains("already running"), "{err:#}");
        assert!(ensure_no_runner(&path).await.is_err());

        // The first runner still owns the socket.
        let reply = send_request(&path, &ControlRequest::PauseAll).await.unwrap();
        assert_eq!(reply, Some(ControlReply::Count { count: 0 }));
        listener.abort();
    }

    #[tokio::test]
    async fn stale_socket_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("control.sock");
        drop(std::os::unix::net::UnixListener::bind(&path).unwrap());
        assert!(path.exists());
        ensure_no_runner(&path).await.unwrap();

        let scheduler = scheduler(dir.path()).await;
        let listener = spawn_control_listener(
            scheduler.clone(),
            bind_control_socket(&path).await.unwrap(),
        );
        let reply = send_request(&path, &ControlRequest::ResumeAll).await.unwrap();
        assert_eq!(reply, Some(ControlReply::Count { count: 0 }));
        listener.abort();
    }
}
