//! Failure types surfaced by a single attempt and by the executor as a whole.

use std::fmt;

use thiserror::Error;

use crate::response::Response;

/// Coarse transport-level failure kind, independent of the HTTP client in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// Connection could not be established (refused, DNS, proxy).
    Connect,
    /// Connection dropped mid-exchange: nothing received, reset, send/recv failure.
    ConnectionAborted,
    /// Response could not be parsed: bad or truncated status line, short body.
    MalformedResponse,
    /// Connect or overall transfer deadline hit.
    Timeout,
    /// Local setup failure (bad URL, unsupported option). Never reached the server.
    Other,
}

impl TransportErrorKind {
    /// True when the request may or may not have reached the server.
    pub fn is_ambiguous(self) -> bool {
        !matches!(self, TransportErrorKind::Other)
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::ConnectionAborted => "connection aborted",
            TransportErrorKind::MalformedResponse => "malformed response",
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Other => "transport",
        };
        f.write_str(s)
    }
}

/// Error returned by the send primitive for one network attempt.
#[derive(Debug, Error)]
#[error("{kind} error: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        kind: TransportErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }
}

/// Outcome of a failed attempt, kept verbatim so callers see the real status or kind.
#[derive(Debug, Error)]
pub enum Failure {
    /// Server answered with a 4xx/5xx status. The full response is preserved.
    #[error("HTTP {}", .0.status)]
    Http(Response),
    /// No usable response was received.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl Failure {
    pub fn status(&self) -> Option<u16> {
        match self {
            Failure::Http(resp) => Some(resp.status),
            Failure::Transport(_) => None,
        }
    }

    pub fn transport_kind(&self) -> Option<TransportErrorKind> {
        match self {
            Failure::Http(_) => None,
            Failure::Transport(e) => Some(e.kind),
        }
    }
}

/// Terminal error from [`Executor::execute`](crate::retry::Executor::execute).
///
/// Exhaustion is not a separate variant: a retryable failure that ran out of
/// budget is reported as `Failed` with the last real failure.
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("{failure} after {attempts} attempt(s)")]
    Failed {
        #[source]
        failure: Failure,
        attempts: u32,
    },
    #[error("cancelled after {attempts} attempt(s)")]
    Cancelled {
        attempts: u32,
        #[source]
        last: Option<Failure>,
    },
}

impl ExecuteError {
    /// HTTP status of the surfaced failure, if it was an HTTP failure.
    pub fn status(&self) -> Option<u16> {
        self.failure().and_then(Failure::status)
    }

    pub fn transport_kind(&self) -> Option<TransportErrorKind> {
        self.failure().and_then(Failure::transport_kind)
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            ExecuteError::Failed { failure, .. } => Some(failure),
            ExecuteError::Cancelled { last, .. } => last.as_ref(),
        }
    }

    /// Number of send attempts performed before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            ExecuteError::Failed { attempts, .. } | ExecuteError::Cancelled { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExecuteError::Cancelled { .. })
    }
}
