use super::Growth;
use crate::Verdict;

/// Slow start: the window doubles until the first rejection, halves back to the last accepted
/// size and then grows by one byte per accepted probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Doubling;

impl Growth for Doubling {
    fn on_grow(&mut self, size: u64) -> Option<u64> {
        size.checked_mul(2)
    }

    fn on_overshoot(&mut self, size: u64) -> u64 {
        size / 2
    }

    fn on_narrow(&mut self, size: u64, verdict: Verdict) -> Option<u64> {
        match verdict {
            Verdict::Accept => size.checked_add(1),
            // only reachable when the seed was already above the threshold
            Verdict::Reject => None,
        }
    }
}
