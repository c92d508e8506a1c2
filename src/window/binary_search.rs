use super::Growth;
use crate::Verdict;

/// Doubles like slow start, then walks towards the boundary with a step (`suffix`) that halves
/// after every narrowing probe, needing `O(log threshold)` round trips instead of
/// `O(threshold)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct BinarySearch {
    suffix: u64,
}

impl BinarySearch {
    pub(super) fn new() -> Self {
        Self { suffix: 0 }
    }
}

impl Growth for BinarySearch {
    fn on_grow(&mut self, size: u64) -> Option<u64> {
        size.checked_mul(2)
    }

    fn on_overshoot(&mut self, size: u64) -> u64 {
        let next = size / 2;
        self.suffix = next / 2;
        next
    }

    fn on_narrow(&mut self, size: u64, verdict: Verdict) -> Option<u64> {
        let next = match verdict {
            Verdict::Accept => size.checked_add(self.suffix),
            Verdict::Reject => size.checked_sub(self.suffix),
        };
        self.suffix /= 2;
        // once the suffix is exhausted the window bisects what is left
        next.filter(|next| *next != size)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_binary_search_steps() {
        let mut growth = BinarySearch::new();
        assert_eq!(growth.on_grow(8), Some(16));
        assert_eq!(growth.on_overshoot(16), 8);
        assert_eq!(growth.suffix, 4);
        assert_eq!(growth.on_narrow(8, Verdict::Accept), Some(12));
        assert_eq!(growth.suffix, 2);
        assert_eq!(growth.on_narrow(12, Verdict::Reject), Some(10));
        assert_eq!(growth.suffix, 1);
        assert_eq!(growth.on_narrow(10, Verdict::Accept), Some(11));
        assert_eq!(growth.suffix, 0);
        assert_eq!(growth.on_narrow(11, Verdict::Reject), None);
    }
}
