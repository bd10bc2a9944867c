use crate::core::RestError;
use rand::Rng;
use reqwest::{Method, StatusCode};
use std::time::Duration;

/// Jitter applied by [`RetryStrategy::exponential_backoff`], as a fraction of the delay.
pub const DEFAULT_JITTER_FACTOR: f64 = 0.2;
/// Growth applied by [`RetryStrategy::exponential_backoff`] per attempt.
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

/// Methods retried when no allow-list is given. All are idempotent.
fn default_methods() -> Vec<Method> {
    vec![Method::GET, Method::HEAD, Method::OPTIONS]
}

/// What one attempt produced, as far as retrying is concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The request never produced a response (connect, timeout, I/O).
    TransportError,
    /// The server answered with this status.
    Status(StatusCode),
}

impl AttemptOutcome {
    /// Transport errors and 5xx are the only outcomes worth retrying.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        match self {
            Self::TransportError => true,
            Self::Status(status) => status.is_server_error(),
        }
    }
}

/// A strategy's verdict for one attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryDecision {
    /// Whether another attempt should be made.
    pub retry: bool,
    /// How long to wait before it. Meaningless when `retry` is `false`.
    pub delay: Duration,
}

impl RetryDecision {
    const STOP: Self = Self {
        retry: false,
        delay: Duration::ZERO,
    };
}

/// Retry with a constant delay, up to a fixed number of retries.
#[derive(Clone, Debug, PartialEq)]
struct Simple {
    max_retries: u32,
    delay: Duration,
}

/// Retry with exponentially growing, jittered delays until the delay passes `max`.
#[derive(Clone, Debug, PartialEq)]
struct ExponentialBackoff {
    min: Duration,
    max: Duration,
    factor: f64,
    multiplier: f64,
}

#[derive(Clone, Debug, PartialEq)]
enum Policy {
    Simple(Simple),
    ExponentialBackoff(ExponentialBackoff),
}

/// Decides whether a failed attempt is retried and after which delay.
///
/// Only methods in the allow-list are retried (GET, HEAD and OPTIONS by
/// default), and only after a transport error or a 5xx.
///
/// ```
/// use restwell::RetryStrategy;
/// use std::time::Duration;
///
/// let simple = RetryStrategy::simple(3, Duration::from_millis(50));
/// let backoff = RetryStrategy::exponential_backoff(
///     Duration::from_millis(100),
///     Duration::from_secs(2),
/// )?;
/// # let _ = (simple, backoff);
/// # Ok::<(), restwell::RestError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct RetryStrategy {
    policy: Policy,
    allowed_methods: Vec<Method>,
}

impl RetryStrategy {
    /// Retries up to `max_retries` times, always waiting `delay`.
    #[must_use]
    pub fn simple(max_retries: u32, delay: Duration) -> Self {
        Self {
            policy: Policy::Simple(Simple { max_retries, delay }),
            allowed_methods: default_methods(),
        }
    }

    /// Exponential backoff doubling from `min`, with 20% jitter, until the delay exceeds `max`.
    ///
    /// # Errors
    ///
    /// [`RestError::InvalidRetryPolicy`] if either bound is zero or `max <= min`.
    pub fn exponential_backoff(min: Duration, max: Duration) -> Result<Self, RestError> {
        Self::exponential_backoff_with(min, max, DEFAULT_JITTER_FACTOR, DEFAULT_MULTIPLIER)
    }

    /// Exponential backoff with a custom jitter `factor` and growth `multiplier`.
    ///
    /// Attempt `n` waits `min * multiplier^n`, perturbed uniformly within
    /// `±factor` of that value. Retrying stops once the delay exceeds `max`.
    ///
    /// # Errors
    ///
    /// [`RestError::InvalidRetryPolicy`] if either bound is zero, `max <= min`,
    /// `factor` is outside `0..=1` or `multiplier` is below one.
    pub fn exponential_backoff_with(
        min: Duration,
        max: Duration,
        factor: f64,
        multiplier: f64,
    ) -> Result<Self, RestError> {
        if min.is_zero() || max.is_zero() || max <= min {
            return Err(RestError::InvalidRetryPolicy(format!(
                "backoff bounds must satisfy 0 < min < max (min={min:?}, max={max:?})"
            )));
        }
        if !(0.0..=1.0).contains(&factor) {
            return Err(RestError::InvalidRetryPolicy(format!(
                "jitter factor must be within 0..=1, got {factor}"
            )));
        }
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(RestError::InvalidRetryPolicy(format!(
                "multiplier must be at least 1, got {multiplier}"
            )));
        }
        Ok(Self {
            policy: Policy::ExponentialBackoff(ExponentialBackoff {
                min,
                max,
                factor,
                multiplier,
            }),
            allowed_methods: default_methods(),
        })
    }

    /// Replaces the allow-list of retried methods. An empty list keeps the default.
    #[must_use]
    pub fn with_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        let methods: Vec<Method> = methods.into_iter().collect();
        if !methods.is_empty() {
            self.allowed_methods = methods;
        }
        self
    }

    /// Methods this strategy is willing to retry.
    #[must_use]
    pub fn allowed_methods(&self) -> &[Method] {
        &self.allowed_methods
    }

    /// Decides what to do after attempt number `attempt` (zero-based) produced `outcome`.
    #[must_use]
    pub fn should_retry(&self, method: &Method, outcome: AttemptOutcome, attempt: u32) -> RetryDecision {
        if !outcome.is_retryable() || !self.allowed_methods.contains(method) {
            return RetryDecision::STOP;
        }

        match &self.policy {
            Policy::Simple(simple) => RetryDecision {
                retry: attempt < simple.max_retries,
                delay: simple.delay,
            },
            Policy::ExponentialBackoff(backoff) => match backoff.delay(attempt) {
                Some(delay) if delay <= backoff.max => RetryDecision { retry: true, delay },
                _ => RetryDecision::STOP,
            },
        }
    }
}

impl ExponentialBackoff {
    /// The jittered delay for `attempt`, or `None` once it no longer fits in nanoseconds.
    fn delay(&self, attempt: u32) -> Option<Duration> {
        let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
        let interval = self.min.as_nanos() as f64 * self.multiplier.powi(exp);
        if !interval.is_finite() {
            return None;
        }
        let low = (1.0 - self.factor) * interval;
        let high = (1.0 + self.factor) * interval;
        let nanos = if high > low {
            rand::thread_rng().gen_range(low..=high)
        } else {
            interval
        };
        if nanos >= u64::MAX as f64 {
            return None;
        }
        Some(Duration::from_nanos(nanos as u64))
    }
}
