/// Seconds until the next automatic refresh.
///
/// Decrements by one per clock tick and never goes below zero. Reaching zero
/// fires and immediately rewinds to the full interval, so observers see
/// `interval ..= 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Countdown {
    interval_secs: u64,
    remaining: u64,
}

impl Countdown {
    pub fn new(interval_secs: u64) -> Self {
        let interval_secs = interval_secs.max(1);
        Self {
            interval_secs,
            remaining: interval_secs,
        }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }

    /// Back to the full interval; called whenever a cycle is scheduled.
    pub fn reset(&mut self) {
        self.remaining = self.interval_secs;
    }

    /// Advances one second. Returns `true` when the countdown expired.
    pub fn tick(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.reset();
            return true;
        }
        false
    }
}
