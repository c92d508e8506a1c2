use super::Growth;
use crate::Verdict;

/// The lazy caterer sequence `L(n) = (n^2 + n + 2) / 2`, the maximum number of pieces a disk
/// can be cut into with `n` straight cuts. `None` on overflow.
pub fn lazy_caterer(n: u64) -> Option<u64> {
    n.checked_mul(n)?.checked_add(n)?.checked_add(2).map(|v| v / 2)
}

/// Grows the window by `L(n + 1) - L(n)`, i.e. 1, 2, 3, 4... bytes, which is gentler than
/// doubling but still super-linear. Narrowing is linear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct LazyCaterer {
    /// Number of growth steps taken
    sequence: u64,
}

impl LazyCaterer {
    pub(super) fn new() -> Self {
        Self { sequence: 0 }
    }

    /// The increment applied by the most recent growth step.
    fn last_increment(&self) -> Option<u64> {
        let prev = self.sequence.checked_sub(1)?;
        Some(lazy_caterer(self.sequence)? - lazy_caterer(prev)?)
    }
}

impl Growth for LazyCaterer {
    fn on_grow(&mut self, size: u64) -> Option<u64> {
        let next = self.sequence.checked_add(1)?;
        let increment = lazy_caterer(next)? - lazy_caterer(self.sequence)?;
        self.sequence = next;
        size.checked_add(increment)
    }

    fn on_overshoot(&mut self, size: u64) -> u64 {
        // Roll back the increment that overshot. Starting from a window of 1 the size always
        // equals L(sequence), so this lands on L(sequence - 1).
        match self.last_increment() {
            Some(increment) => size.saturating_sub(increment),
            None => size / 2,
        }
    }

    fn on_narrow(&mut self, size: u64, verdict: Verdict) -> Option<u64> {
        match verdict {
            Verdict::Accept => size.checked_add(1),
            Verdict::Reject => None,
        }
    }
}
