use std::time::{Duration, Instant};

/// A source of monotonic time.
#[cfg_attr(test, mockall::automock)]
pub trait Clock {
    /// The current instant.
    fn now(&self) -> Instant;
    /// Sleep for the given duration.
    fn sleep(&self, duration: Duration);
}

/// A `Clock` backed by the system monotonic clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
