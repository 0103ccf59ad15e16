//! Classify a failed attempt into a retry verdict.

use crate::retry::error::{Failure, TransportErrorKind};
use crate::retry::policy::Verdict;

/// Statuses that signal a transient server-side condition.
pub const RETRYABLE_STATUSES: [u16; 4] = [429, 502, 503, 504];

pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

/// Classify an HTTP failure status.
///
/// Retryable statuses are only retried for idempotent requests; a
/// non-idempotent request surfaces them on first occurrence.
pub fn classify_http_status(status: u16, idempotent: bool) -> Verdict {
    if is_retryable_status(status) && idempotent {
        Verdict::Retry
    } else {
        Verdict::Fail
    }
}

/// Classify a transport failure.
///
/// Whether an ambiguous transport failure reached the server is unknowable,
/// so it is retried for every method, non-idempotent ones included. This
/// leaves a window where a non-idempotent request can be applied twice when
/// the first response was lost in flight.
pub fn classify_transport(kind: TransportErrorKind) -> Verdict {
    if kind.is_ambiguous() {
        Verdict::Retry
    } else {
        Verdict::Fail
    }
}

/// Classify a failed attempt for a request with the given idempotency.
pub fn classify(failure: &Failure, idempotent: bool) -> Verdict {
    match failure {
        Failure::Transport(e) => classify_transport(e.kind),
        Failure::Http(resp) => classify_http_status(resp.status, idempotent),
    }
}
