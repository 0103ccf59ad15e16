//! Request context: one logical operation handed to the executor.
//!
//! The context is built by the caller and only borrowed by the executor and
//! transport, so it cannot change once an attempt sequence has started.

use std::fmt;

use serde::Serialize;

use crate::retry::RetryBudget;

/// Logical operation kind and the HTTP verb it is sent with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Read (GET).
    Get,
    /// Create / append (POST).
    Post,
    /// Update (PUT).
    Put,
    /// Delete (DELETE).
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    /// Idempotency assumed when the caller does not say otherwise.
    ///
    /// Deletes default to non-idempotent: the remote side does not promise to
    /// report absence consistently, so a blind re-send of an arbitrary delete is
    /// not known to be safe.
    pub fn default_idempotent(self) -> bool {
        !matches!(self, Method::Delete)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable description of one request, threaded through every attempt.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    target: String,
    body: Option<Vec<u8>>,
    headers: Vec<(String, String)>,
    idempotent: bool,
    budget: Option<RetryBudget>,
}

impl RequestContext {
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            body: None,
            headers: Vec::new(),
            idempotent: method.default_idempotent(),
            budget: None,
        }
    }

    pub fn get(target: impl Into<String>) -> Self {
        Self::new(Method::Get, target)
    }

    pub fn post(target: impl Into<String>) -> Self {
        Self::new(Method::Post, target)
    }

    pub fn put(target: impl Into<String>) -> Self {
        Self::new(Method::Put, target)
    }

    pub fn delete(target: impl Into<String>) -> Self {
        Self::new(Method::Delete, target)
    }

    /// Overrides the method default.
    pub fn idempotent(mut self, idempotent: bool) -> Self {
        self.idempotent = idempotent;
        self
    }

    /// Per-request budget; replaces the executor's default for this context only.
    pub fn budget(mut self, budget: RetryBudget) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serializes `value` as the body and sets `Content-Type: application/json`.
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> serde_json::Result<Self> {
        let body = serde_json::to_vec(value)?;
        Ok(self
            .header("Content-Type", "application/json")
            .body(body))
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn body_bytes(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn is_idempotent(&self) -> bool {
        self.idempotent
    }

    pub fn budget_override(&self) -> Option<&RetryBudget> {
        self.budget.as_ref()
    }
}
