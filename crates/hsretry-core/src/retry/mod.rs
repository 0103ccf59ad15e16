//! Retry and backoff policy.
//!
//! This module encapsulates failure classification (transport ambiguity,
//! throttling, gateway errors), the idempotency gate and the backoff budget,
//! so that every request issued through the client shares one policy.

mod attempt;
mod classify;
mod clock;
mod error;
mod policy;
mod run;

pub use attempt::{AttemptOutcome, AttemptRecord, Executed};
pub use classify::{
    classify, classify_http_status, classify_transport, is_retryable_status, RETRYABLE_STATUSES,
};
pub use clock::{Clock, Sleep, SystemClock};
pub use error::{ExecuteError, Failure, TransportError, TransportErrorKind};
pub use policy::{
    Backoff, RetryBudget, RetryDecision, RetryPolicy, Verdict, DEFAULT_MAX_RETRIES,
    DEFAULT_MAX_RETRY_TIME,
};
pub use run::Executor;
