//! Clock and sleep primitive used between attempts.

use std::time::{Duration, Instant};

use crate::cancel::CancelToken;

/// How a backoff sleep ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sleep {
    Completed,
    Cancelled,
}

/// Time source for elapsed-budget accounting and backoff waits.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    /// Wait for `delay` unless `cancel` fires first.
    fn sleep(&self, delay: Duration, cancel: &CancelToken) -> Sleep;
}

/// Wall clock; sleeps on the cancel token so cancellation is prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, delay: Duration, cancel: &CancelToken) -> Sleep {
        if cancel.wait_timeout(delay) {
            Sleep::Cancelled
        } else {
            Sleep::Completed
        }
    }
}
