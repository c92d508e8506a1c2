use std::future::Future;
use std::time::Duration;

use bytes::Bytes;

use crate::errors::Result;
use crate::window::Policy;
use crate::Verdict;

/// Probe channel implementation by using tokio's TCP framework
#[cfg(feature = "tokio-rt")]
mod tokio;

#[cfg(feature = "tokio-rt")]
pub use self::tokio::{connect, probe, StreamChannel};

/// One request/response exchange with the oracle.
pub trait ProbeChannel {
    /// Send `payload` and wait for the verdict on it. Calls never overlap, the next payload is
    /// only sent once this future resolved.
    ///
    /// # Errors
    /// Transport failures (including timeouts) surface as [`crate::Error::Channel`], anything
    /// but a verdict token as [`crate::Error::ProtocolViolation`].
    fn round_trip(&mut self, payload: Bytes) -> impl Future<Output = Result<Verdict>> + Send;
}

/// Probe session config
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// The window adjustment policy, the default value is `Policy::Doubling`
    pub(crate) policy: Policy,
    /// The size of the first probe, the default value is 1
    pub(crate) initial_window: u64,
    /// Bound of a single round trip (and of connecting), the default value is 5s
    pub(crate) round_trip_timeout: Duration,
    /// Growth is clamped to this size, the default value is 64MiB
    pub(crate) max_window: u64,
    /// Abort after this many round trips, unlimited by default
    pub(crate) max_round_trips: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            policy: Policy::default(),
            initial_window: 1,
            round_trip_timeout: Duration::from_secs(5),
            max_window: 64 * 1024 * 1024,
            max_round_trips: None,
        }
    }

    /// Set the window adjustment policy
    /// The default value is `Policy::Doubling`
    pub fn policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the size of the first probe
    /// The default value is 1
    /// # Panics
    /// Panics if the window is 0
    pub fn initial_window(mut self, window: u64) -> Self {
        assert!(window > 0, "initial window should be at least 1");
        self.initial_window = window;
        self
    }

    /// Set the bound of a single round trip
    /// The default value is 5s
    pub fn round_trip_timeout(mut self, timeout: Duration) -> Self {
        self.round_trip_timeout = timeout;
        self
    }

    /// Set the largest window the session may probe. A growth step past it probes exactly
    /// this size, and the session aborts once this size is accepted.
    /// The default value is 64MiB
    /// # Panics
    /// Panics if the window is 0
    pub fn max_window(mut self, window: u64) -> Self {
        assert!(window > 0, "maximum window should be at least 1");
        self.max_window = window;
        self
    }

    /// Set the round trip budget of a session
    /// Unlimited by default
    pub fn max_round_trips(mut self, round_trips: u64) -> Self {
        self.max_round_trips = Some(round_trips);
        self
    }
}
