use std::time::Duration;

use crate::Verdict;

/// Decides whether a payload fits in the server window.
///
/// The oracle holds no session state, every probe is judged on its length alone. The
/// processing delay is only observed by whoever answers on its behalf (see
/// [`crate::server`]), it never changes the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Oracle {
    threshold: u64,
    delay: Duration,
}

impl Oracle {
    /// Create an oracle accepting payloads up to `threshold` bytes, answering immediately.
    pub fn new(threshold: u64) -> Self {
        Self {
            threshold,
            delay: Duration::ZERO,
        }
    }

    /// Set the processing delay applied before every answer
    /// The default value is zero
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn evaluate(&self, len: u64) -> Verdict {
        if len <= self.threshold {
            Verdict::Accept
        } else {
            Verdict::Reject
        }
    }
}
