//! Lock-free token-bucket rate limiter.
//!
//! The limiter publishes an immutable [`TokenState`] behind an [`ArcSwap`].
//! Admission clones the current snapshot, refills and debits the clone, and
//! publishes it with a compare-and-swap. A caller that loses the race reloads
//! and recomputes against the fresher snapshot, so tokens are never spent twice.

mod state;

pub use state::TokenState;

use crate::core::RestError;
use arc_swap::{ArcSwap, Guard};
use std::sync::Arc;
use std::time::{Duration, Instant};

const MINUTE_NANOS: u64 = 60 * 1_000_000_000;
const MINUTE_MILLIS: u64 = 60 * 1_000;
const MIN_REFILL_PERIOD_NANOS: u64 = 1;
/// Multipliers tried when correcting the integer refill period.
const MAX_CORRECTION: u64 = 20;

/// Admits weighted actions against a requests-per-minute budget.
#[derive(Debug)]
pub struct RateLimiter {
    rate_per_minute: u64,
    origin: Instant,
    state: ArcSwap<TokenState>,
}

impl RateLimiter {
    /// Creates a limiter allowing `rate_per_minute` tokens per minute, with a
    /// burst capacity of the tokens earned over `bucket_width`.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::InvalidRate`] when `rate_per_minute` is zero.
    pub fn new(rate_per_minute: u64, bucket_width: Duration) -> Result<Self, RestError> {
        if rate_per_minute == 0 {
            return Err(RestError::InvalidRate);
        }

        let mut period = (MINUTE_NANOS / rate_per_minute).max(MIN_REFILL_PERIOD_NANOS);
        let raw_rate = rate_per_minute as f64 * period as f64 / MINUTE_NANOS as f64;
        let correction = correction_factor(raw_rate);
        period = period.saturating_mul(correction);
        let refill_amount = ((raw_rate * correction as f64).round() as u64).max(1);

        let width_millis = u64::try_from(bucket_width.as_millis()).unwrap_or(u64::MAX);
        let capacity = width_millis
            .saturating_mul(rate_per_minute)
            .div_ceil(MINUTE_MILLIS);

        let origin = Instant::now();
        Ok(Self {
            rate_per_minute,
            origin,
            state: ArcSwap::from_pointee(TokenState::new(period, refill_amount, capacity, 0)),
        })
    }

    /// Deducts `weight` tokens if the bucket holds that many.
    ///
    /// # Errors
    ///
    /// [`RestError::InvalidWeight`] for a zero weight and [`RestError::OverQuota`]
    /// when the bucket is short. Neither consumes tokens.
    pub fn admit(&self, weight: u64) -> Result<(), RestError> {
        if weight == 0 {
            return Err(RestError::InvalidWeight);
        }
        if self.reject(weight) {
            Err(RestError::OverQuota)
        } else {
            Ok(())
        }
    }

    /// Runs `f` only when `weight` tokens were admitted.
    ///
    /// # Errors
    ///
    /// The admission error when the action was refused.
    pub fn action<T>(&self, weight: u64, f: impl FnOnce() -> T) -> Result<T, RestError> {
        self.admit(weight)?;
        Ok(f())
    }

    /// Tokens in the last published snapshot. Not refilled, so it can lag.
    #[must_use]
    pub fn available(&self) -> u64 {
        self.state.load().tokens()
    }

    /// Maximum number of tokens the bucket holds.
    #[must_use]
    pub fn capacity(&self) -> u64 {
        self.state.load().capacity()
    }

    /// Time between refills after drift correction.
    #[must_use]
    pub fn refill_period(&self) -> Duration {
        Duration::from_nanos(self.state.load().refill_period_nanos)
    }

    /// Tokens credited per refill period.
    #[must_use]
    pub fn refill_amount(&self) -> u64 {
        self.state.load().refill_amount
    }

    /// The configured rate.
    #[must_use]
    pub const fn rate_per_minute(&self) -> u64 {
        self.rate_per_minute
    }

    /// Returns `true` when the action must be rejected.
    fn reject(&self, weight: u64) -> bool {
        let mut current = self.state.load_full();
        loop {
            let mut next = TokenState::clone(&current);
            next.refill(self.now_nanos());

            if !next.subtract(weight) {
                return true;
            }

            let previous = self.state.compare_and_swap(&current, Arc::new(next));
            if Arc::ptr_eq(&previous, &current) {
                return false;
            }
            current = Guard::into_inner(previous);
        }
    }

    fn now_nanos(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }
}

/// Picks the multiplier in `1..MAX_CORRECTION` that brings `raw_rate * m`
/// closest to a whole number, so integer truncation of the refill amount
/// does not drift the long-run rate.
fn correction_factor(raw_rate: f64) -> u64 {
    let mut best = f64::MAX;
    let mut output = 1;
    for m in 1..MAX_CORRECTION {
        let product = raw_rate * m as f64;
        let fract = product.fract();
        let diff = fract.min(1.0 - fract);
        if diff < best {
            best = diff;
            output = m;
        }
    }
    output
}
