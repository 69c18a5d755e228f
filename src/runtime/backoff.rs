//! Exponential backoff between connection attempts.

use embassy_time::Duration;

/// Shortest delay the schedule hands out.
pub const MIN_DELAY: Duration = Duration::from_millis(1);

/// Doubling delay schedule with a ceiling.
///
/// The `n`-th call to [`next_delay`](Backoff::next_delay) returns
/// `min(initial * 2^n, ceiling)`, so `1s` / `30s` yields 1, 2, 4, 8, 16, 30, 30, ...
///
/// Both bounds are raised to [`MIN_DELAY`] so a failing connect loop always
/// sleeps between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    initial: Duration,
    ceiling: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, ceiling: Duration) -> Self {
        let ceiling = if ceiling < MIN_DELAY { MIN_DELAY } else { ceiling };
        let initial = if initial < MIN_DELAY {
            MIN_DELAY
        } else if initial > ceiling {
            ceiling
        } else {
            initial
        };
        Self {
            initial,
            ceiling,
            current: initial,
        }
    }

    /// Returns the delay to wait now and advances the schedule.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        let doubled = Duration::from_ticks(self.current.as_ticks().saturating_mul(2));
        self.current = if doubled > self.ceiling {
            self.ceiling
        } else {
            doubled
        };
        delay
    }

    /// Restarts the schedule from the initial delay.
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}
