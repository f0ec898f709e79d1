use std::time::{Duration, Instant};

/// Client-side fixed-window request quota.
///
/// The count resets once more than `window` has elapsed since the window
/// opened. Bursts across a window boundary are allowed.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    max_requests: u32,
    window: Duration,
    count: u32,
    window_start: Instant,
}

/// Returned when the quota for the current window is used up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaExhausted {
    pub limit: u32,
    pub window: Duration,
}

impl FixedWindowLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self::starting_at(max_requests, window, Instant::now())
    }

    pub fn starting_at(max_requests: u32, window: Duration, now: Instant) -> Self {
        Self {
            max_requests,
            window,
            count: 0,
            window_start: now,
        }
    }

    /// Change quota and window length without resetting the current count.
    pub fn reconfigure(&mut self, max_requests: u32, window: Duration) {
        self.max_requests = max_requests;
        self.window = window;
    }

    /// Record an attempt at `now`, or refuse it if the quota is exhausted.
    pub fn try_acquire_at(&mut self, now: Instant) -> Result<(), QuotaExhausted> {
        if now.saturating_duration_since(self.window_start) > self.window {
            self.count = 0;
            self.window_start = now;
        }

        if self.count >= self.max_requests {
            return Err(QuotaExhausted {
                limit: self.max_requests,
                window: self.window,
            });
        }

        self.count += 1;
        Ok(())
    }

    pub fn try_acquire(&mut self) -> Result<(), QuotaExhausted> {
        self.try_acquire_at(Instant::now())
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}
