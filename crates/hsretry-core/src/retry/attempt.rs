//! Per-attempt bookkeeping returned alongside the executor result.

use std::time::Duration;

use crate::response::Response;
use crate::retry::error::{Failure, TransportErrorKind};

/// What one send produced, without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success(u16),
    Http(u16),
    Transport(TransportErrorKind),
}

impl AttemptOutcome {
    pub(crate) fn of_failure(failure: &Failure) -> Self {
        match failure {
            Failure::Http(resp) => AttemptOutcome::Http(resp.status),
            Failure::Transport(e) => AttemptOutcome::Transport(e.kind),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptRecord {
    /// 1-based.
    pub ordinal: u32,
    pub outcome: AttemptOutcome,
    /// Time spent in the send primitive.
    pub elapsed: Duration,
}

/// Successful result of an attempt sequence.
#[derive(Debug, Clone)]
pub struct Executed {
    pub response: Response,
    pub attempts: Vec<AttemptRecord>,
}

impl Executed {
    pub fn attempt_count(&self) -> u32 {
        self.attempts.len() as u32
    }

    pub fn into_response(self) -> Response {
        self.response
    }
}
