//! CLI for the hsretry request executor.

mod commands;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use hsretry_core::{config, Executor, HsClient, Method, RetryBudget};
use std::time::Duration;

use commands::run_request;

/// Send one request to the storage API with retries.
#[derive(Debug, Parser)]
#[command(name = "hsretry")]
#[command(about = "hsretry: resilient requests against the storage API", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub budget: BudgetArgs,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// Overrides for the configured retry budget.
#[derive(Debug, Clone, Default, Args)]
pub struct BudgetArgs {
    /// Retries after the first attempt (0 disables retries).
    #[arg(long, global = true, value_name = "N", conflicts_with = "unbounded")]
    pub max_retries: Option<u32>,

    /// Remove both caps; combine with --max-retry-time to keep only a time cap.
    #[arg(long, global = true)]
    pub unbounded: bool,

    /// Wall-clock window for all retries of the request.
    #[arg(long, global = true, value_name = "SECS")]
    pub max_retry_time: Option<f64>,
}

impl BudgetArgs {
    /// Apply the flags on top of `base`. Returns `base` unchanged when no flag is given.
    pub fn apply(&self, base: RetryBudget) -> Result<RetryBudget> {
        let mut budget = if self.unbounded {
            RetryBudget::unbounded()
        } else {
            base
        };
        if let Some(n) = self.max_retries {
            budget.max_retries = Some(n);
        }
        if let Some(secs) = self.max_retry_time {
            budget.max_retry_time = Some(
                Duration::try_from_secs_f64(secs)
                    .context("--max-retry-time must be a non-negative number of seconds")?,
            );
        }
        Ok(budget)
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// GET a resource.
    Get {
        /// Path relative to the configured endpoint, or an absolute URL.
        target: String,
    },

    /// POST a JSON body.
    Post {
        /// Path relative to the configured endpoint, or an absolute URL.
        target: String,
        /// JSON request body.
        #[arg(long, value_name = "JSON")]
        data: Option<String>,
        /// Never re-send after an HTTP status (e.g. job creation).
        #[arg(long)]
        non_idempotent: bool,
    },

    /// DELETE a resource. Not retried on gateway errors unless --idempotent.
    Delete {
        /// Path relative to the configured endpoint, or an absolute URL.
        target: String,
        /// The delete is safe to repeat.
        #[arg(long)]
        idempotent: bool,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        let mut policy = cfg.retry_policy()?;
        policy.budget = cli.budget.apply(policy.budget)?;
        let client = HsClient::with_executor(&cfg.endpoint, Executor::new(cfg.transport(), policy))
            .with_context(|| format!("invalid endpoint: {}", cfg.endpoint))?;

        let ctx = match cli.command {
            CliCommand::Get { target } => client.context(Method::Get, &target)?,
            CliCommand::Post {
                target,
                data,
                non_idempotent,
            } => {
                let mut ctx = client.context(Method::Post, &target)?;
                if let Some(data) = data {
                    let value: serde_json::Value =
                        serde_json::from_str(&data).context("--data is not valid JSON")?;
                    ctx = ctx.json(&value)?;
                }
                if non_idempotent {
                    ctx = ctx.idempotent(false);
                }
                ctx
            }
            CliCommand::Delete { target, idempotent } => client
                .context(Method::Delete, &target)?
                .idempotent(idempotent),
        };

        run_request(client, ctx).await
    }
}

#[cfg(test)]
mod tests;
