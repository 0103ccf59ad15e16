use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::{Backoff, RetryBudget, RetryPolicy, DEFAULT_MAX_RETRIES, DEFAULT_MAX_RETRY_TIME};
use crate::transport::CurlTransport;

/// Retry policy parameters (optional `[retry]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt. Omit for no cap; 0 disables retries.
    #[serde(default)]
    pub max_retries: Option<u32>,
    /// Wall-clock window for all retries of one request, in seconds. Omit for no cap.
    #[serde(default)]
    pub max_retry_time_secs: Option<f64>,
    /// Delay before the first retry, doubled for each further retry.
    pub base_delay_ms: u64,
    /// Upper bound on a single backoff delay.
    pub max_delay_ms: u64,
    /// Random +/- jitter added to each delay.
    pub jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let backoff = Backoff::default();
        Self {
            max_retries: Some(DEFAULT_MAX_RETRIES),
            max_retry_time_secs: Some(DEFAULT_MAX_RETRY_TIME.as_secs_f64()),
            base_delay_ms: backoff.base_delay.as_millis() as u64,
            max_delay_ms: backoff.max_delay.as_millis() as u64,
            jitter_ms: backoff.jitter.as_millis() as u64,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> Result<RetryPolicy> {
        let max_retry_time = self
            .max_retry_time_secs
            .map(Duration::try_from_secs_f64)
            .transpose()
            .context("retry.max_retry_time_secs must be a non-negative number of seconds")?;
        let base_delay = Duration::from_millis(self.base_delay_ms);
        let backoff = Backoff {
            base_delay,
            max_delay: Duration::from_millis(self.max_delay_ms).max(base_delay),
            jitter: Duration::from_millis(self.jitter_ms),
        };
        Ok(RetryPolicy::new(
            RetryBudget::new(self.max_retries, max_retry_time),
            backoff,
        ))
    }
}

/// Global configuration loaded from `~/.config/hsretry/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HsConfig {
    /// Base URL that relative request targets are resolved against.
    pub endpoint: String,
    /// Per-attempt connect timeout.
    pub connect_timeout_secs: u64,
    /// Per-attempt whole-transfer timeout.
    pub request_timeout_secs: u64,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for HsConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://storage.scrapinghub.com/".to_string(),
            connect_timeout_secs: 15,
            request_timeout_secs: 60,
            retry: None,
        }
    }
}

impl HsConfig {
    pub fn retry_policy(&self) -> Result<RetryPolicy> {
        match &self.retry {
            Some(retry) => retry.to_policy(),
            None => Ok(RetryPolicy::default()),
        }
    }

    pub fn transport(&self) -> CurlTransport {
        CurlTransport::new(
            Duration::from_secs(self.connect_timeout_secs),
            Duration::from_secs(self.request_timeout_secs),
        )
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("hsretry")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<HsConfig> {
    load_or_init_at(&config_path()?)
}

pub fn load_or_init_at(path: &Path) -> Result<HsConfig> {
    if !path.exists() {
        let default_cfg = HsConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        fs::write(path, toml).with_context(|| format!("write config: {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data =
        fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    let cfg: HsConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
