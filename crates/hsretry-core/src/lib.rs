//! Resilient request execution for the storage API.
//!
//! Requests are described by a [`RequestContext`] and run by an
//! [`Executor`], which owns the attempt loop: send through a [`Transport`],
//! classify the failure, wait out the backoff, and try again while the
//! request's idempotency and the [`RetryBudget`] allow it.

pub mod cancel;
pub mod client;
pub mod config;
pub mod logging;
pub mod request;
pub mod response;
pub mod retry;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use cancel::CancelToken;
pub use client::{ClientError, ClientResult, HsClient};
pub use request::{Method, RequestContext};
pub use response::Response;
pub use retry::{
    AttemptOutcome, AttemptRecord, Backoff, ExecuteError, Executed, Executor, Failure,
    RetryBudget, RetryPolicy, TransportError, TransportErrorKind,
};
pub use transport::{CurlTransport, Transport};
