//! Test doubles: scripted transport and manual clock.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::cancel::CancelToken;
use crate::request::{Method, RequestContext};
use crate::response::Response;
use crate::retry::{Clock, Sleep, TransportError, TransportErrorKind};
use crate::transport::Transport;

/// One scripted reply.
#[derive(Debug, Clone)]
pub(crate) enum Step {
    Status(u16, &'static str),
    Fail(TransportErrorKind),
}

pub(crate) fn ok(body: &'static str) -> Step {
    Step::Status(200, body)
}

pub(crate) fn status(code: u16) -> Step {
    Step::Status(code, "Timeout")
}

pub(crate) fn aborted() -> Step {
    Step::Fail(TransportErrorKind::ConnectionAborted)
}

/// Virtual clock: `sleep` advances time instantly and records the delay.
#[derive(Debug, Clone)]
pub(crate) struct ManualClock {
    inner: Arc<Mutex<ClockState>>,
}

#[derive(Debug)]
struct ClockState {
    now: Instant,
    sleeps: Vec<Duration>,
}

impl ManualClock {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ClockState {
                now: Instant::now(),
                sleeps: Vec::new(),
            })),
        }
    }

    pub(crate) fn advance(&self, d: Duration) {
        self.inner.lock().unwrap().now += d;
    }

    pub(crate) fn sleeps(&self) -> Vec<Duration> {
        self.inner.lock().unwrap().sleeps.clone()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.inner.lock().unwrap().now
    }

    fn sleep(&self, delay: Duration, cancel: &CancelToken) -> Sleep {
        if cancel.is_cancelled() {
            return Sleep::Cancelled;
        }
        let mut state = self.inner.lock().unwrap();
        state.now += delay;
        state.sleeps.push(delay);
        Sleep::Completed
    }
}

/// Replays a fixed sequence of replies and records every request it sees.
#[derive(Debug)]
pub(crate) struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    seen: Mutex<Vec<(Method, String)>>,
    clock: Option<(ManualClock, Duration)>,
}

impl ScriptedTransport {
    pub(crate) fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            seen: Mutex::new(Vec::new()),
            clock: None,
        }
    }

    /// Each send advances `clock` by `cost`.
    pub(crate) fn with_send_cost(mut self, clock: &ManualClock, cost: Duration) -> Self {
        self.clock = Some((clock.clone(), cost));
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub(crate) fn seen(&self) -> Vec<(Method, String)> {
        self.seen.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &RequestContext) -> Result<Response, TransportError> {
        self.seen
            .lock()
            .unwrap()
            .push((request.method(), request.target().to_string()));
        if let Some((clock, cost)) = &self.clock {
            clock.advance(*cost);
        }
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected extra attempt to {}", request.target()));
        match step {
            Step::Status(code, body) => Ok(Response::new(code, body.as_bytes().to_vec())),
            Step::Fail(kind) => Err(TransportError::new(kind, "scripted failure")),
        }
    }
}
