//! Retry loop: send, classify, back off, repeat.

use crate::cancel::CancelToken;
use crate::request::RequestContext;
use crate::retry::attempt::{AttemptOutcome, AttemptRecord, Executed};
use crate::retry::classify::classify;
use crate::retry::clock::{Clock, Sleep, SystemClock};
use crate::retry::error::{ExecuteError, Failure};
use crate::retry::policy::{RetryBudget, RetryDecision, RetryPolicy, Verdict};
use crate::transport::Transport;

/// Runs request contexts against a transport under a retry policy.
///
/// The executor holds no per-request state, so one instance can serve many
/// threads at once; each call owns its own attempt sequence.
#[derive(Debug)]
pub struct Executor<T, C = SystemClock> {
    transport: T,
    clock: C,
    policy: RetryPolicy,
}

impl<T: Transport> Executor<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self::with_clock(transport, policy, SystemClock)
    }
}

impl<T: Transport, C: Clock> Executor<T, C> {
    pub fn with_clock(transport: T, policy: RetryPolicy, clock: C) -> Self {
        Self {
            transport,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Execute with the context's budget override, or the executor default.
    pub fn execute(&self, ctx: &RequestContext) -> Result<Executed, ExecuteError> {
        self.execute_with(ctx, None, &CancelToken::new())
    }

    /// Execute with an explicit budget (takes precedence over the context's)
    /// and a cancel token that aborts a pending backoff.
    pub fn execute_with(
        &self,
        ctx: &RequestContext,
        budget: Option<RetryBudget>,
        cancel: &CancelToken,
    ) -> Result<Executed, ExecuteError> {
        let budget = budget
            .or_else(|| ctx.budget_override().copied())
            .unwrap_or(self.policy.budget);
        let started = self.clock.now();
        let mut records: Vec<AttemptRecord> = Vec::new();
        let mut last: Option<Failure> = None;

        loop {
            if cancel.is_cancelled() {
                tracing::info!(
                    method = %ctx.method(),
                    target = ctx.target(),
                    attempts = records.len(),
                    "request cancelled before next attempt"
                );
                return Err(ExecuteError::Cancelled {
                    attempts: records.len() as u32,
                    last,
                });
            }

            let ordinal = records.len() as u32 + 1;
            tracing::debug!(
                method = %ctx.method(),
                target = ctx.target(),
                attempt = ordinal,
                "sending request"
            );
            let sent_at = self.clock.now();
            let result = self.transport.send(ctx);
            let elapsed = self.clock.now().saturating_duration_since(sent_at);

            let failure = match result {
                Ok(resp) if resp.is_success() => {
                    records.push(AttemptRecord {
                        ordinal,
                        outcome: AttemptOutcome::Success(resp.status),
                        elapsed,
                    });
                    return Ok(Executed {
                        response: resp,
                        attempts: records,
                    });
                }
                Ok(resp) => Failure::Http(resp),
                Err(e) => Failure::Transport(e),
            };
            records.push(AttemptRecord {
                ordinal,
                outcome: AttemptOutcome::of_failure(&failure),
                elapsed,
            });

            if classify(&failure, ctx.is_idempotent()) == Verdict::Fail {
                tracing::debug!(
                    method = %ctx.method(),
                    target = ctx.target(),
                    attempt = ordinal,
                    idempotent = ctx.is_idempotent(),
                    "non-retryable failure: {}",
                    failure
                );
                return Err(ExecuteError::Failed {
                    failure,
                    attempts: ordinal,
                });
            }

            let total = self.clock.now().saturating_duration_since(started);
            let delay = match budget.next_delay(&self.policy.backoff, ordinal, total) {
                RetryDecision::Exhausted => {
                    tracing::info!(
                        method = %ctx.method(),
                        target = ctx.target(),
                        attempts = ordinal,
                        elapsed_ms = total.as_millis() as u64,
                        "retry budget exhausted: {}",
                        failure
                    );
                    return Err(ExecuteError::Failed {
                        failure,
                        attempts: ordinal,
                    });
                }
                RetryDecision::RetryAfter(delay) => delay,
            };

            tracing::warn!(
                method = %ctx.method(),
                target = ctx.target(),
                attempt = ordinal,
                delay_ms = delay.as_millis() as u64,
                "retryable failure: {}",
                failure
            );
            if self.clock.sleep(delay, cancel) == Sleep::Cancelled {
                tracing::info!(
                    method = %ctx.method(),
                    target = ctx.target(),
                    attempts = ordinal,
                    "request cancelled during backoff"
                );
                return Err(ExecuteError::Cancelled {
                    attempts: ordinal,
                    last: Some(failure),
                });
            }
            last = Some(failure);
        }
    }
}
