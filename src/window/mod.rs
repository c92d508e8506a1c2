//! The window growth state machine.
//!
//! A [`Window`] starts `Growing` from an initial size, moves to `Narrowing` at the first
//! rejection and ends `Done` once the rejected size sits directly above the largest accepted
//! one. How the size moves in each phase is decided by the [`Policy`].

/// Binary search narrowing
mod binary_search;

/// Exponential growth with linear narrowing
mod doubling;

/// Lazy caterer growth with linear narrowing
mod lazy_caterer;

use std::fmt;
use std::str::FromStr;

pub use lazy_caterer::lazy_caterer;

use self::binary_search::BinarySearch;
use self::doubling::Doubling;
use self::lazy_caterer::LazyCaterer;
use crate::errors::{Error, Result};
use crate::Verdict;

/// How the window size is moved after each verdict.
trait Growth {
    /// The next size after `size` was accepted while growing, `None` on overflow.
    fn on_grow(&mut self, size: u64) -> Option<u64>;

    /// The first size probed after `size` was rejected while growing.
    fn on_overshoot(&mut self, size: u64) -> u64;

    /// The next size after a verdict on `size` while narrowing. `None` lets the window bisect
    /// the remaining interval.
    fn on_narrow(&mut self, size: u64, verdict: Verdict) -> Option<u64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The window expands on every accepted probe.
    Growing,
    /// The window is adjusted by smaller steps to pinpoint the boundary.
    Narrowing,
    /// The capacity is discovered.
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Growing => write!(f, "growing"),
            Phase::Narrowing => write!(f, "narrowing"),
            Phase::Done => write!(f, "done"),
        }
    }
}

/// Window adjustment policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Policy {
    /// Double on every accept, then probe upwards one byte at a time.
    #[default]
    Doubling,
    /// Grow by the successive differences of the lazy caterer sequence, then probe upwards
    /// one byte at a time.
    LazyCaterer,
    /// Double on every accept, then binary search the boundary with a halving step.
    BinarySearch,
}

impl Policy {
    pub const ALL: [Policy; 3] = [Policy::Doubling, Policy::LazyCaterer, Policy::BinarySearch];

    pub fn as_str(&self) -> &'static str {
        match self {
            Policy::Doubling => "doubling",
            Policy::LazyCaterer => "lazy-caterer",
            Policy::BinarySearch => "binary-search",
        }
    }

    fn strategy(self) -> Strategy {
        match self {
            Policy::Doubling => Strategy::Doubling(Doubling),
            Policy::LazyCaterer => Strategy::LazyCaterer(LazyCaterer::new()),
            Policy::BinarySearch => Strategy::BinarySearch(BinarySearch::new()),
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug)]
#[error("unknown policy '{0}', expected one of doubling, lazy-caterer, binary-search")]
pub struct UnknownPolicy(String);

impl FromStr for Policy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Policy::ALL
            .into_iter()
            .find(|policy| policy.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownPolicy(s.to_owned()))
    }
}

/// Policy state carried between steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    Doubling(Doubling),
    LazyCaterer(LazyCaterer),
    BinarySearch(BinarySearch),
}

impl Strategy {
    fn growth(&mut self) -> &mut dyn Growth {
        match self {
            Strategy::Doubling(growth) => growth,
            Strategy::LazyCaterer(growth) => growth,
            Strategy::BinarySearch(growth) => growth,
        }
    }

    fn policy(&self) -> Policy {
        match self {
            Strategy::Doubling(_) => Policy::Doubling,
            Strategy::LazyCaterer(_) => Policy::LazyCaterer,
            Strategy::BinarySearch(_) => Policy::BinarySearch,
        }
    }
}

/// The probe window of one session.
///
/// Besides the size to probe next, the window remembers the largest accepted size (`floor`)
/// and the smallest rejected size (`ceiling`). While narrowing, the policy moves the size and
/// the window only steps in when a policy would leave `(floor, ceiling)` or stop making
/// progress, bisecting the interval instead. Once `ceiling == floor + 1` the window probes the
/// ceiling once more, and the session is done with `size == floor` on that rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    size: u64,
    phase: Phase,
    strategy: Strategy,
    floor: u64,
    ceiling: Option<u64>,
    limit: u64,
}

impl Window {
    /// Create a growing window.
    ///
    /// # Panics
    /// Panics if `initial` is 0, an empty payload can not be probed.
    pub fn new(policy: Policy, initial: u64) -> Self {
        assert!(initial > 0, "initial window should be at least 1");
        Self {
            size: initial,
            phase: Phase::Growing,
            strategy: policy.strategy(),
            floor: 0,
            ceiling: None,
            limit: u64::MAX,
        }
    }

    /// Cap the window at `limit`. A growth step past the limit probes the limit itself, and
    /// the window is stuck once the limit is accepted.
    ///
    /// # Panics
    /// Panics if `limit` is 0.
    pub fn max_window(mut self, limit: u64) -> Self {
        assert!(limit > 0, "maximum window should be at least 1");
        self.limit = limit;
        self.size = self.size.min(limit);
        self
    }

    /// The size of the next probe, or the discovered capacity once done.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn policy(&self) -> Policy {
        self.strategy.policy()
    }

    /// The discovered capacity, available once the window is done.
    pub fn capacity(&self) -> Option<u64> {
        (self.phase == Phase::Done).then_some(self.size)
    }

    /// Feed the verdict on the current size and return the next window.
    ///
    /// # Errors
    /// Returns [`Error::PolicyStuck`] when stepping a finished window, when the maximum window
    /// is accepted and the window can not grow any further, or when the verdict contradicts an
    /// earlier one (the acceptance threshold moved under us).
    pub fn step(mut self, verdict: Verdict) -> Result<Self> {
        self.observe(verdict)?;
        match (self.phase, verdict) {
            (Phase::Growing, Verdict::Accept) => {
                if self.size >= self.limit {
                    return Err(self.stuck("maximum window accepted"));
                }
                let next = self
                    .strategy
                    .growth()
                    .on_grow(self.size)
                    .map_or(self.limit, |next| next.min(self.limit));
                self.size = next.max(self.size + 1);
            }
            (_, Verdict::Reject) if self.converged() => {
                self.phase = Phase::Done;
                self.size = self.floor;
            }
            (Phase::Growing, Verdict::Reject) => {
                let next = self.strategy.growth().on_overshoot(self.size);
                self.phase = Phase::Narrowing;
                // the first narrowing probe may confirm the floor again
                self.size = self.bounded(Some(next), self.floor.max(1));
            }
            (Phase::Narrowing, verdict) => {
                let next = self.strategy.growth().on_narrow(self.size, verdict);
                self.size = self.bounded(next, self.floor + 1);
            }
            (Phase::Done, _) => return Err(self.stuck("window is already done")),
        }
        Ok(self)
    }

    fn observe(&mut self, verdict: Verdict) -> Result<()> {
        if self.phase == Phase::Done {
            return Err(self.stuck("window is already done"));
        }
        match verdict {
            Verdict::Accept => {
                if self.ceiling.is_some_and(|ceiling| self.size >= ceiling) {
                    return Err(self.stuck("accepted a size at or above a rejected one"));
                }
                self.floor = self.floor.max(self.size);
            }
            Verdict::Reject => {
                if self.size <= self.floor {
                    return Err(self.stuck("rejected a size at or below an accepted one"));
                }
                self.ceiling = Some(self.ceiling.map_or(self.size, |c| c.min(self.size)));
            }
        }
        Ok(())
    }

    fn converged(&self) -> bool {
        self.ceiling
            .is_some_and(|ceiling| ceiling - self.floor <= 1)
    }

    /// Keep the next probe in `[lo, ceiling)`, otherwise bisect `(floor, ceiling)`. With
    /// nothing left in between, the ceiling is probed again to finish on a rejection.
    fn bounded(&self, next: Option<u64>, lo: u64) -> u64 {
        let ceiling = self.ceiling.unwrap_or(u64::MAX);
        if self.converged() {
            return ceiling;
        }
        match next {
            Some(next) if next >= lo && next < ceiling => next,
            _ => self.floor + (ceiling - self.floor) / 2,
        }
    }

    fn stuck(&self, reason: &'static str) -> Error {
        Error::PolicyStuck {
            size: self.size,
            phase: self.phase,
            reason,
        }
    }
}
