//! `hsretry get|post|delete` – run one request through the executor.

use anyhow::{Context, Result};
use hsretry_core::{HsClient, RequestContext};
use std::sync::Arc;

/// Runs the blocking executor off the runtime; Ctrl-C cancels any pending backoff.
pub async fn run_request(client: HsClient, ctx: RequestContext) -> Result<()> {
    let client = Arc::new(client);

    let cancel = client.cancel_token().clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("ctrl-c received, cancelling request");
            cancel.cancel();
        }
    });

    let result = tokio::task::spawn_blocking({
        let client = Arc::clone(&client);
        move || client.execute(&ctx)
    })
    .await
    .context("request task join")?;
    ctrl_c.abort();

    let done = result?;
    let response = &done.response;
    if !response.body.is_empty() {
        println!("{}", response.text());
    }
    eprintln!(
        "HTTP {} after {} attempt(s)",
        response.status,
        done.attempt_count()
    );
    Ok(())
}
