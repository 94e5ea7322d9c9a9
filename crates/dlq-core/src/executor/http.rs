//! libcurl executor: one blocking GET per activation, streamed into the part file.

use curl::easy::Easy;
use std::cell::RefCell;
use std::io;
use std::time::Duration;

use super::classify::{is_success_status, transport_error};
use super::{
    TransferError, TransferExecutor, TransferHandle, TransferOutcome, TransferReporter,
    TransferRequest,
};
use crate::config::TransferConfig;
use crate::storage::PartFile;

/// Runs each transfer on tokio's blocking pool with a fresh curl `Easy` handle.
#[derive(Debug, Clone, Default)]
pub struct CurlExecutor {
    config: TransferConfig,
}

impl CurlExecutor {
    pub fn new(config: TransferConfig) -> Self {
        Self { config }
    }
}

impl TransferExecutor for CurlExecutor {
    fn start(&self, request: TransferRequest, reporter: TransferReporter) -> TransferHandle {
        let handle = reporter.handle();
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || {
            let result = download(&request, &config, &reporter);
            match &result {
                Ok(done) => tracing::debug!(
                    "item {} transfer finished: {} bytes",
                    request.item_id,
                    done.bytes_written
                ),
                Err(TransferError::Stopped) => {
                    tracing::debug!("item {} transfer stopped", request.item_id)
                }
                Err(e) => tracing::warn!("item {} GET {} failed: {}", request.item_id, request.url, e),
            }
            reporter.finish(result);
        });
        handle
    }
}

/// What the callbacks learned about the current response.
#[derive(Default)]
struct ResponseState {
    status: Option<u32>,
    content_length: Option<u64>,
    written: u64,
    stopped: bool,
    write_error: Option<io::Error>,
}

impl ResponseState {
    fn on_header(&mut self, line: &[u8]) {
        let Ok(line) = std::str::from_utf8(line) else {
            return;
        };
        if let Some(code) = parse_status_line(line) {
            // A new status line starts a new response (redirect hop).
            self.status = Some(code);
            self.content_length = None;
        } else if let Some(len) = parse_content_length(line) {
            self.content_length = Some(len);
        }
    }

    /// Bodies of non-2xx responses are discarded.
    fn accepts_body(&self) -> bool {
        self.status.map_or(true, is_success_status)
    }
}

fn configure(easy: &mut Easy, url: &str, config: &TransferConfig) -> Result<(), curl::Error> {
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(config.max_redirects)?;
    easy.connect_timeout(Duration::from_secs(config.connect_timeout_secs))?;
    easy.low_speed_limit(config.low_speed_limit_bytes)?;
    easy.low_speed_time(Duration::from_secs(config.low_speed_time_secs))?;
    easy.timeout(Duration::from_secs(config.timeout_secs))?;
    easy.useragent(concat!("dlq/", env!("CARGO_PKG_VERSION")))?;
    // The progress callback also fires while no data arrives, so a stop is seen promptly.
    easy.progress(true)?;
    Ok(())
}

fn download(
    request: &TransferRequest,
    config: &TransferConfig,
    reporter: &TransferReporter,
) -> Result<TransferOutcome, TransferError> {
    let mut easy = Easy::new();
    configure(&mut easy, &request.url, config).map_err(transport_error)?;

    // A stopped activation must not truncate the part file its successor may own.
    let mut part = reporter
        .unless_stopped(|| PartFile::create(&request.destination))
        .ok_or(TransferError::Stopped)??;
    let response = RefCell::new(ResponseState::default());

    let performed = {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|line| {
                response.borrow_mut().on_header(line);
                true
            })
            .map_err(transport_error)?;
        transfer
            .write_function(|data| {
                let mut state = response.borrow_mut();
                if !state.accepts_body() {
                    return Ok(data.len());
                }
                if let Err(e) = part.write_all(data) {
                    state.write_error = Some(e);
                    return Ok(0); // abort transfer
                }
                state.written += data.len() as u64;
                if !reporter.progress(state.written, state.content_length) {
                    state.stopped = true;
                    return Ok(0);
                }
                Ok(data.len())
            })
            .map_err(transport_error)?;
        transfer
            .progress_function(|_, _, _, _| !reporter.is_stopped())
            .map_err(transport_error)?;
        transfer.perform()
    };

    let mut state = response.into_inner();
    if let Err(e) = performed {
        if state.stopped || reporter.is_stopped() {
            return Err(TransferError::Stopped);
        }
        if let Some(io) = state.write_error.take() {
            return Err(TransferError::StorageWrite(io));
        }
        return Err(transport_error(e));
    }

    let code = easy.response_code().map_err(transport_error)?;
    // Non-HTTP schemes report 0.
    if code != 0 && !is_success_status(code) {
        return Err(TransferError::Server(code));
    }

    part.finish()?;
    Ok(TransferOutcome {
        bytes_written: state.written,
    })
}

/// Status code from an `HTTP/x y reason` line.
fn parse_status_line(line: &str) -> Option<u32> {
    let mut parts = line.split_whitespace();
    if !parts.next()?.starts_with("HTTP/") {
        return None;
    }
    parts.next()?.parse().ok()
}

fn parse_content_length(line: &str) -> Option<u64> {
    let (name, value) = line.split_once(':')?;
    if !name.trim().eq_ignore_ascii_case("content-length") {
        return None;
    }
    value.trim().parse().ok()
}
