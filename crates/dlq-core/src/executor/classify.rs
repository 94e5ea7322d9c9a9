//! Classify curl errors and HTTP statuses.

use std::fmt;

use super::TransferError;

/// Coarse cause of a transport failure, used in item error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportReason {
    Timeout,
    Connect,
    Resolve,
    Tls,
    TooManyRedirects,
    Other,
}

impl fmt::Display for TransportReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransportReason::Timeout => "timed out",
            TransportReason::Connect => "connection failed",
            TransportReason::Resolve => "could not resolve host",
            TransportReason::Tls => "TLS failure",
            TransportReason::TooManyRedirects => "too many redirects",
            TransportReason::Other => "transport error",
        };
        f.write_str(s)
    }
}

/// Classify a curl error.
pub fn classify_curl_error(e: &curl::Error) -> TransportReason {
    if e.is_operation_timedout() {
        return TransportReason::Timeout;
    }
    if e.is_couldnt_resolve_host() || e.is_couldnt_resolve_proxy() {
        return TransportReason::Resolve;
    }
    if e.is_couldnt_connect()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_partial_file()
    {
        return TransportReason::Connect;
    }
    if e.is_ssl_connect_error() || e.is_peer_failed_verification() {
        return TransportReason::Tls;
    }
    if e.is_too_many_redirects() {
        return TransportReason::TooManyRedirects;
    }
    TransportReason::Other
}

pub(super) fn transport_error(e: curl::Error) -> TransferError {
    TransferError::Transport {
        reason: classify_curl_error(&e),
        detail: e.description().to_string(),
    }
}

pub fn is_success_status(code: u32) -> bool {
    (200..300).contains(&code)
}
