//! Storage API client: logical operations mapped onto request contexts.
//!
//! Each call fixes the HTTP verb and the idempotency flag for its operation;
//! record schemas beyond what the call needs are left to the caller as JSON.

use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

use crate::cancel::CancelToken;
use crate::request::{Method, RequestContext};
use crate::response::Response;
use crate::retry::{Clock, ExecuteError, Executed, Executor, RetryPolicy, SystemClock};
use crate::transport::{CurlTransport, Transport};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid endpoint or path: {0}")]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Execute(#[from] ExecuteError),
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// HTTP status of the surfaced failure, when there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Execute(e) => e.status(),
            _ => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Client bound to one API endpoint, sending every request through the executor.
#[derive(Debug)]
pub struct HsClient<T = CurlTransport, C = SystemClock> {
    endpoint: Url,
    executor: Executor<T, C>,
    cancel: CancelToken,
}

impl HsClient {
    /// Client over libcurl with the given policy.
    pub fn new(endpoint: &str, policy: RetryPolicy) -> ClientResult<Self> {
        Self::with_executor(endpoint, Executor::new(CurlTransport::default(), policy))
    }
}

impl<T: Transport, C: Clock> HsClient<T, C> {
    pub fn with_executor(endpoint: &str, executor: Executor<T, C>) -> ClientResult<Self> {
        let mut base = endpoint.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Self {
            endpoint: Url::parse(&base)?,
            executor,
            cancel: CancelToken::new(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn executor(&self) -> &Executor<T, C> {
        &self.executor
    }

    /// Token that aborts pending backoffs of every in-flight call on this client.
    ///
    /// Cancellation is permanent: once fired, every later call through
    /// [`execute`](Self::execute) returns `Cancelled` without sending. Use
    /// [`execute_with_cancel`](Self::execute_with_cancel) for a per-call token.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Resolve `path` against the endpoint. Absolute URLs pass through.
    pub fn url(&self, path: &str) -> ClientResult<String> {
        Ok(self.endpoint.join(path.trim_start_matches('/'))?.to_string())
    }

    /// Context for `path` with the method's default idempotency.
    pub fn context(&self, method: Method, path: &str) -> ClientResult<RequestContext> {
        Ok(RequestContext::new(method, self.url(path)?))
    }

    /// Run a prepared context. Its target must already be absolute.
    pub fn execute(&self, ctx: &RequestContext) -> ClientResult<Executed> {
        self.execute_with_cancel(ctx, &self.cancel)
    }

    /// Run a prepared context under a caller-owned cancel token instead of
    /// the client-wide one.
    pub fn execute_with_cancel(
        &self,
        ctx: &RequestContext,
        cancel: &CancelToken,
    ) -> ClientResult<Executed> {
        Ok(self.executor.execute_with(ctx, None, cancel)?)
    }

    fn execute_json(&self, ctx: &RequestContext) -> ClientResult<Value> {
        let done = self.execute(ctx)?;
        if done.response.body.is_empty() {
            return Ok(Value::Null);
        }
        Ok(done.response.json()?)
    }

    /// Job metadata for `key` (`project/spider/job`).
    pub fn get_job(&self, key: &str) -> ClientResult<Map<String, Value>> {
        let ctx = self.context(Method::Get, &format!("jobs/{}", key))?;
        match self.execute_json(&ctx)? {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }

    /// Enqueue a new job. Every successful send creates a job, so this is
    /// never retried on an HTTP status.
    pub fn push_job(&self, project: &str, spider: &str) -> ClientResult<Value> {
        let ctx = self
            .context(Method::Post, &format!("jobq/{}/push", project))?
            .idempotent(false)
            .json(&serde_json::json!({ "spider": spider }))?;
        self.execute_json(&ctx)
    }

    /// Overwrite the given metadata fields of a job.
    pub fn save_metadata(&self, key: &str, fields: &Map<String, Value>) -> ClientResult<()> {
        let ctx = self
            .context(Method::Post, &format!("jobs/{}", key))?
            .json(fields)?;
        self.execute(&ctx)?;
        Ok(())
    }

    /// Remove one metadata field. Deleting an absent field is a no-op
    /// remotely, so this delete is safe to retry.
    pub fn delete_metadata_field(&self, key: &str, field: &str) -> ClientResult<()> {
        let ctx = self
            .context(Method::Delete, &format!("jobs/{}/{}", key, field))?
            .idempotent(true);
        self.execute(&ctx)?;
        Ok(())
    }

    /// Delete an arbitrary caller-chosen path. Retried on gateway errors only
    /// when `idempotent` is true.
    pub fn apidelete(&self, path: &str, idempotent: bool) -> ClientResult<Response> {
        let ctx = self.context(Method::Delete, path)?.idempotent(idempotent);
        Ok(self.execute(&ctx)?.response)
    }

    /// Store one record (must carry `_key`) in a collection.
    pub fn collection_set(&self, project: &str, store: &str, record: &Value) -> ClientResult<()> {
        let ctx = self
            .context(Method::Post, &format!("collections/{}/s/{}", project, store))?
            .json(record)?;
        self.execute(&ctx)?;
        Ok(())
    }

    /// Delete records by key; sent as a POST to the store's `deleted` resource.
    pub fn collection_delete(&self, project: &str, store: &str, keys: &[&str]) -> ClientResult<()> {
        let ctx = self
            .context(
                Method::Post,
                &format!("collections/{}/s/{}/deleted", project, store),
            )?
            .json(keys)?;
        self.execute(&ctx)?;
        Ok(())
    }

    /// Drop a frontier slot. Absent slots are a remote no-op.
    pub fn frontier_delete_slot(&self, project: &str, frontier: &str, slot: &str) -> ClientResult<()> {
        let ctx = self
            .context(
                Method::Delete,
                &format!("hcf/{}/{}/s/{}", project, frontier, slot),
            )?
            .idempotent(true);
        self.execute(&ctx)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::{Backoff, RetryBudget};
    use crate::test_support::{ok, status, ManualClock, ScriptedTransport};
    use std::time::Duration;

    const ENDPOINT: &str = "http://storage.example.test";

    fn client(
        steps: Vec<crate::test_support::Step>,
        max_retries: u32,
    ) -> HsClient<ScriptedTransport, ManualClock> {
        let policy = RetryPolicy::new(
            RetryBudget::new(Some(max_retries), Some(Duration::from_secs(1))),
            Backoff::default(),
        );
        let exec = Executor::with_clock(ScriptedTransport::new(steps), policy, ManualClock::new());
        HsClient::with_executor(ENDPOINT, exec).unwrap()
    }

    #[test]
    fn url_joins_relative_paths() {
        let c = client(vec![], 3);
        assert_eq!(
            c.url("/jobs/1/2/3").unwrap(),
            "http://storage.example.test/jobs/1/2/3"
        );
        assert_eq!(
            c.url("https://other.example.test/x").unwrap(),
            "https://other.example.test/x"
        );
    }

    #[test]
    fn endpoint_with_prefix_keeps_prefix() {
        let exec = Executor::with_clock(
            ScriptedTransport::new([]),
            RetryPolicy::default(),
            ManualClock::new(),
        );
        let c = HsClient::with_executor("http://h.example.test/api", exec).unwrap();
        assert_eq!(c.url("jobs/1").unwrap(), "http://h.example.test/api/jobs/1");
    }

    #[test]
    fn get_job_retries_and_decodes() {
        let c = client(
            vec![
                status(504),
                status(504),
                ok(r#"{"project":"1","state":"pending"}"#),
            ],
            3,
        );
        let meta = c.get_job("1/2/42").unwrap();
        assert_eq!(meta["state"], "pending");
        assert_eq!(c.executor().transport().calls(), 3);
    }

    #[test]
    fn get_job_surfaces_forbidden_once() {
        let c = client(vec![status(403)], 2);
        let err = c.get_job("1/2/42").unwrap_err();
        assert_eq!(err.status(), Some(403));
        assert_eq!(c.executor().transport().calls(), 1);
    }

    #[test]
    fn push_job_is_not_retried() {
        let c = client(vec![status(504)], 3);
        let err = c.push_job("2222222", "hs-test-spider").unwrap_err();
        assert_eq!(err.status(), Some(504));
        assert_eq!(c.executor().transport().calls(), 1);
    }

    #[test]
    fn save_metadata_is_retried() {
        let c = client(vec![status(504), status(504), ok("")], 3);
        let mut fields = Map::new();
        fields.insert("foo".to_string(), Value::from("bar"));
        c.save_metadata("1/2/42", &fields).unwrap();
        let seen = c.executor().transport().seen();
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|(m, _)| *m == Method::Post));
    }

    #[test]
    fn internal_metadata_delete_is_retried() {
        let c = client(vec![status(504), status(504), ok("")], 3);
        c.delete_metadata_field("1/2/42", "foo").unwrap();
        let seen = c.executor().transport().seen();
        assert_eq!(seen.len(), 3);
        assert_eq!(
            seen[0],
            (
                Method::Delete,
                "http://storage.example.test/jobs/1/2/42/foo".to_string()
            )
        );
    }

    #[test]
    fn apidelete_non_idempotent_fails_fast() {
        let c = client(vec![status(504)], 3);
        let err = c.apidelete("/my/non/idempotent/delete/", false).unwrap_err();
        assert_eq!(err.status(), Some(504));
        assert_eq!(c.executor().transport().calls(), 1);
    }

    #[test]
    fn collection_store_and_delete_are_retried() {
        let c = client(
            vec![
                status(504),
                status(504),
                ok("[]"),
                status(504),
                status(504),
                ok("[]"),
            ],
            3,
        );
        c.collection_set(
            "2222222",
            "foo",
            &serde_json::json!({"_key": "bar", "content": "value"}),
        )
        .unwrap();
        c.collection_delete("2222222", "foo", &["baz"]).unwrap();

        let seen = c.executor().transport().seen();
        assert_eq!(seen.len(), 6);
        assert!(seen[..3].iter().all(|(_, u)| u.ends_with("/s/foo")));
        assert!(seen[3..].iter().all(|(_, u)| u.ends_with("/s/foo/deleted")));
    }

    #[test]
    fn frontier_delete_slot_is_idempotent() {
        let c = client(vec![status(503), ok("")], 3);
        c.frontier_delete_slot("2222222", "frontier_non_existing", "slot_non_existing")
            .unwrap();
        assert_eq!(c.executor().transport().calls(), 2);
    }

    #[test]
    fn client_cancel_is_permanent_but_per_call_token_is_not() {
        let c = client(vec![ok("{}")], 3);
        c.cancel_token().cancel();

        let ctx = c.context(Method::Get, "jobs/1/2/42").unwrap();
        match c.execute(&ctx) {
            Err(ClientError::Execute(e)) => {
                assert!(e.is_cancelled());
                assert_eq!(e.attempts(), 0);
            }
            other => panic!("expected cancellation, got {:?}", other.map(|d| d.attempt_count())),
        }
        assert_eq!(c.executor().transport().calls(), 0);

        let done = c.execute_with_cancel(&ctx, &CancelToken::new()).unwrap();
        assert_eq!(done.attempt_count(), 1);
    }

    #[test]
    fn empty_body_decodes_to_null() {
        let c = client(vec![ok("")], 0);
        assert_eq!(c.push_job("1", "spider").unwrap(), Value::Null);
    }
}
