use std::time::Duration;

use rand::Rng;

/// Verdict of the failure classifier for one failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Failure is transient for this request; retry if budget allows.
    Retry,
    /// Terminal; surface the failure as-is.
    Fail,
}

/// Decision returned by the backoff scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Budget is spent; stop with the last failure.
    Exhausted,
    /// Wait this long, then send again.
    RetryAfter(Duration),
}

/// Cap on attempts and wall-clock time for one logical operation.
///
/// `None` means unbounded. `max_retries = Some(0)` or `max_retry_time =
/// Some(ZERO)` disables retries entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    pub max_retries: Option<u32>,
    pub max_retry_time: Option<Duration>,
}

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_MAX_RETRY_TIME: Duration = Duration::from_secs(60);

impl Default for RetryBudget {
    fn default() -> Self {
        Self {
            max_retries: Some(DEFAULT_MAX_RETRIES),
            max_retry_time: Some(DEFAULT_MAX_RETRY_TIME),
        }
    }
}

impl RetryBudget {
    pub fn new(max_retries: Option<u32>, max_retry_time: Option<Duration>) -> Self {
        Self {
            max_retries,
            max_retry_time,
        }
    }

    /// Exactly one attempt, never a retry.
    pub fn disabled() -> Self {
        Self::new(Some(0), None)
    }

    pub fn unbounded() -> Self {
        Self::new(None, None)
    }

    /// Decide whether another attempt may follow `attempts` failed ones.
    ///
    /// `attempts` counts sends made so far (1 after the first attempt);
    /// `elapsed` is measured from the start of the first attempt. The returned
    /// wait never extends past the remaining `max_retry_time`.
    pub fn next_delay(&self, backoff: &Backoff, attempts: u32, elapsed: Duration) -> RetryDecision {
        if let Some(max_retries) = self.max_retries {
            if attempts >= max_retries.saturating_add(1) {
                return RetryDecision::Exhausted;
            }
        }

        let delay = backoff.delay_for_retry(attempts);
        match self.max_retry_time {
            Some(max_time) => {
                let remaining = max_time.saturating_sub(elapsed);
                if remaining.is_zero() {
                    return RetryDecision::Exhausted;
                }
                RetryDecision::RetryAfter(delay.min(remaining))
            }
            None => RetryDecision::RetryAfter(delay),
        }
    }
}

/// Exponential backoff with symmetric jitter and a cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound on any single delay, jitter included.
    pub max_delay: Duration,
    /// Uniform jitter applied as +/- this amount.
    pub jitter: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            jitter: Duration::from_millis(100),
        }
    }
}

impl Backoff {
    /// No waiting at all; useful for tests and for callers pacing retries themselves.
    pub fn none() -> Self {
        Self {
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (1-based): `base * 2^(retry-1)`, capped, jittered.
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(16);
        let raw = self.base_delay.saturating_mul(1u32 << exp);
        let capped = raw.min(self.max_delay);
        self.apply_jitter(capped)
    }

    fn apply_jitter(&self, delay: Duration) -> Duration {
        let jitter_ms = self.jitter.as_millis().min(i64::MAX as u128) as i64;
        if jitter_ms == 0 {
            return delay;
        }
        let offset = rand::thread_rng().gen_range(-jitter_ms..=jitter_ms);
        let delay_ms = delay.as_millis().min(i64::MAX as u128) as i64;
        let jittered = delay_ms.saturating_add(offset).max(0) as u64;
        Duration::from_millis(jittered).min(self.max_delay)
    }
}

/// Process-wide retry configuration: default budget plus backoff curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    pub budget: RetryBudget,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn new(budget: RetryBudget, backoff: Backoff) -> Self {
        Self { budget, backoff }
    }

    /// Single attempt, no waiting.
    pub fn disabled() -> Self {
        Self::new(RetryBudget::disabled(), Backoff::none())
    }
}
