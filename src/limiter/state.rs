//! Immutable token-bucket snapshot.
//!
//! A published `TokenState` is never mutated; the limiter clones it, works on
//! the copy and swaps the copy in.

/// One snapshot of the bucket. Times are nanoseconds on the limiter's monotonic clock.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenState {
    pub(crate) refill_period_nanos: u64,
    pub(crate) refill_amount: u64,
    pub(crate) capacity: u64,
    pub(crate) bucket: u64,
    pub(crate) last_refill_nanos: u64,
    pub(crate) spill: f64,
}

impl TokenState {
    /// A full bucket. `capacity` is raised to `refill_amount` so one period always fits.
    pub(crate) fn new(refill_period_nanos: u64, refill_amount: u64, capacity: u64, now_nanos: u64) -> Self {
        let capacity = capacity.max(refill_amount);
        Self {
            refill_period_nanos,
            refill_amount,
            capacity,
            bucket: capacity,
            last_refill_nanos: now_nanos,
            spill: 0.0,
        }
    }

    /// Tokens currently in the bucket.
    #[must_use]
    pub const fn tokens(&self) -> u64 {
        self.bucket
    }

    /// Maximum number of tokens the bucket holds.
    #[must_use]
    pub const fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Adds the tokens earned since the last refill.
    ///
    /// Whole periods are credited immediately; the fractional part of the
    /// credit accumulates in `spill` and is paid out once it reaches a full token.
    pub(crate) fn refill(&mut self, now_nanos: u64) {
        if now_nanos < self.last_refill_nanos {
            return;
        }
        let elapsed = now_nanos - self.last_refill_nanos;
        if elapsed <= self.refill_period_nanos {
            return;
        }

        let periods = elapsed as f64 / self.refill_period_nanos as f64;
        let raw = self.refill_amount as f64 * periods;
        let whole = raw.trunc();
        self.spill += raw - whole;
        // `as` saturates for values past u64::MAX.
        self.bucket = self.bucket.saturating_add(whole as u64);

        if self.spill >= 1.0 {
            let correction = self.spill.trunc();
            self.spill -= correction;
            self.bucket = self.bucket.saturating_add(correction as u64);
        }

        self.bucket = self.bucket.min(self.capacity);
        self.last_refill_nanos = now_nanos;
    }

    /// Takes `weight` tokens, or leaves the bucket untouched and returns `false`.
    pub(crate) fn subtract(&mut self, weight: u64) -> bool {
        if weight > self.bucket {
            return false;
        }
        self.bucket -= weight;
        true
    }
}
