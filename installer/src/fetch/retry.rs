//! Bounded retry for transient fetch failures.

use super::{FetchError, Fetcher};
use rand::Rng;
use std::path::Path;
use std::time::Duration;

/// Attempts per URL when none is configured.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Delay before the first retry; doubled for each later one.
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// How many times to try a URL and how long to wait in between.
///
/// Each wait is the exponential backoff plus a uniformly random jitter of
/// up to `jitter`, so concurrent installers do not retry in lockstep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    jitter: Duration,
}

impl RetryPolicy {
    /// Create a policy; `max_attempts` is clamped to at least one.
    ///
    /// The jitter defaults to `initial_backoff`.
    #[must_use]
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            jitter: initial_backoff,
        }
    }

    /// Replace the maximum random jitter added to each wait.
    #[must_use]
    pub const fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Return the total number of attempts allowed.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before attempt `attempt + 1`, where `attempt` starts at 1.
    ///
    /// # Examples
    ///
    /// ```
    /// use science_installer::fetch::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::new(3, Duration::from_millis(500));
    /// assert_eq!(policy.backoff(1), Duration::from_millis(500));
    /// assert_eq!(policy.backoff(2), Duration::from_secs(1));
    /// ```
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_backoff.saturating_mul(1 << exponent)
    }

    /// The jittered wait before attempt `attempt + 1`.
    ///
    /// Always within `backoff(attempt)..=backoff(attempt) + jitter`.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let max_jitter = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        let jitter = if max_jitter == 0 {
            0
        } else {
            rand::rng().random_range(0..=max_jitter)
        };
        self.backoff(attempt)
            .saturating_add(Duration::from_millis(jitter))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_INITIAL_BACKOFF)
    }
}

/// Wraps a [`Fetcher`], retrying transient failures per a [`RetryPolicy`].
pub struct RetryingFetcher<'a> {
    inner: &'a dyn Fetcher,
    policy: RetryPolicy,
    sleep: fn(Duration),
}

impl<'a> RetryingFetcher<'a> {
    /// Wrap `inner`, sleeping the current thread between attempts.
    #[must_use]
    pub fn new(inner: &'a dyn Fetcher, policy: RetryPolicy) -> Self {
        Self::with_sleep(inner, policy, std::thread::sleep)
    }

    /// Wrap `inner` with an injected sleep function.
    #[must_use]
    pub fn with_sleep(inner: &'a dyn Fetcher, policy: RetryPolicy, sleep: fn(Duration)) -> Self {
        Self {
            inner,
            policy,
            sleep,
        }
    }
}

impl Fetcher for RetryingFetcher<'_> {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        let mut attempt = 1;
        loop {
            match self.inner.fetch(url, dest) {
                Ok(()) => return Ok(()),
                Err(err) if err.is_transient() && attempt < self.policy.max_attempts => {
                    let delay = self.policy.delay(attempt);
                    log::warn!(
                        "attempt {attempt}/{} for {url} failed ({err}); retrying in {}ms",
                        self.policy.max_attempts,
                        delay.as_millis()
                    );
                    (self.sleep)(delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
