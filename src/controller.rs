//! The session loop.
//!
//! One session probes the window produced by the policy, feeds the verdict back into it and
//! stops once the window is done. Exactly one round trip is in flight at any time and nothing
//! is retried, the first failure aborts the session.

use std::fmt;
use std::time::{Duration, Instant};

use fastrace::collector::SpanContext;
use fastrace::future::FutureExt;
use fastrace::Span;
use log::{debug, info, warn};

use crate::client::{Config, ProbeChannel};
use crate::errors::{Error, Result};
use crate::payload::Payload;
use crate::window::{Phase, Policy, Window};

/// Statistics of one session, finalized when the session ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Payload bytes whose verdict was received
    pub bytes_sent: u64,
    pub round_trips: u64,
    pub elapsed: Duration,
}

impl Summary {
    /// Bytes per second over the whole session.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.bytes_sent as f64 / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} bytes in {} round trips over {:.3}s ({:.1} bytes/s)",
            self.bytes_sent,
            self.round_trips,
            self.elapsed.as_secs_f64(),
            self.throughput()
        )
    }
}

/// The outcome of a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    pub policy: Policy,
    /// The largest payload the oracle accepts
    pub capacity: u64,
    pub summary: Summary,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "capacity {} bytes discovered by {}: {}",
            self.capacity, self.policy, self.summary
        )
    }
}

/// A session that failed before discovering the capacity.
#[derive(thiserror::Error, Debug)]
#[error("session aborted: {error}")]
pub struct Aborted {
    #[source]
    pub error: Error,
    /// What was gathered up to the failure
    pub summary: Summary,
}

impl From<Error> for Aborted {
    fn from(error: Error) -> Self {
        Self {
            error,
            summary: Summary::default(),
        }
    }
}

struct Meter {
    started: Instant,
    bytes_sent: u64,
    round_trips: u64,
}

impl Meter {
    fn start() -> Self {
        Self {
            started: Instant::now(),
            bytes_sent: 0,
            round_trips: 0,
        }
    }

    fn record(&mut self, size: u64) {
        self.bytes_sent = self.bytes_sent.saturating_add(size);
        self.round_trips += 1;
    }

    fn finish(self) -> Summary {
        Summary {
            bytes_sent: self.bytes_sent,
            round_trips: self.round_trips,
            elapsed: self.started.elapsed(),
        }
    }
}

/// Run a probe session over `channel` until the capacity is discovered.
///
/// # Errors
/// Returns [`Aborted`] carrying the first channel, protocol or policy error together with the
/// statistics gathered so far.
pub async fn run<C: ProbeChannel>(
    channel: &mut C,
    config: &Config,
) -> std::result::Result<Report, Aborted> {
    let root = Span::root("probe_session", SpanContext::random()).with_properties(|| {
        [
            ("policy", config.policy.to_string()),
            ("initial_window", config.initial_window.to_string()),
        ]
    });
    async move {
        let mut meter = Meter::start();
        info!(
            "[client] probing with {} policy from window {}",
            config.policy, config.initial_window
        );
        match drive(channel, config, &mut meter).await {
            Ok(capacity) => {
                let report = Report {
                    policy: config.policy,
                    capacity,
                    summary: meter.finish(),
                };
                info!("[client] {report}");
                Ok(report)
            }
            Err(error) => {
                let summary = meter.finish();
                warn!("[client] session aborted after {summary}: {error}");
                Err(Aborted { error, summary })
            }
        }
    }
    .in_span(root)
    .await
}

async fn drive<C: ProbeChannel>(
    channel: &mut C,
    config: &Config,
    meter: &mut Meter,
) -> Result<u64> {
    let mut window =
        Window::new(config.policy, config.initial_window).max_window(config.max_window);
    let mut payload = Payload::default();
    loop {
        let size = window.size();
        let len = usize::try_from(size)
            .map_err(|_| stuck(&window, "window exceeds the address space"))?;
        if config
            .max_round_trips
            .is_some_and(|max| meter.round_trips >= max)
        {
            return Err(stuck(&window, "round trip budget exhausted"));
        }

        let verdict = channel
            .round_trip(payload.take(len))
            .in_span(Span::enter_with_local_parent("round_trip"))
            .await?;
        meter.record(size);
        debug!(
            "[client] window {size} answered {verdict} while {}",
            window.phase()
        );

        window = window.step(verdict)?;
        if let Some(capacity) = window.capacity() {
            return Ok(capacity);
        }
    }
}

fn stuck(window: &Window, reason: &'static str) -> Error {
    Error::PolicyStuck {
        size: window.size(),
        phase: window.phase(),
        reason,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::errors::ChannelError;
    use crate::oracle::Oracle;
    use crate::utils::tests::{test_trace_log_setup, SimChannel};

    #[tokio::test]
    async fn test_session_reports_capacity() {
        let _guard = test_trace_log_setup();
        let mut channel = SimChannel::new(Oracle::new(10));
        let report = run(&mut channel, &Config::new()).await.unwrap();
        assert_eq!(report.capacity, 10);
        assert_eq!(report.policy, Policy::Doubling);
        assert_eq!(channel.probes(), &[1, 2, 4, 8, 16, 8, 9, 10, 11]);
        assert_eq!(report.summary.round_trips, 9);
        assert_eq!(report.summary.bytes_sent, 69);
    }

    #[tokio::test]
    async fn test_session_every_policy() {
        for policy in Policy::ALL {
            for threshold in [1, 2, 3, 10, 100, 1000, 4097] {
                let mut channel = SimChannel::new(Oracle::new(threshold));
                let config = Config::new().policy(policy);
                let report = run(&mut channel, &config).await.unwrap();
                assert_eq!(report.capacity, threshold, "{policy}");
                assert_eq!(report.summary.round_trips, channel.probes().len() as u64);
                assert_eq!(
                    report.summary.bytes_sent,
                    channel.probes().iter().sum::<u64>()
                );
            }
        }
    }

    #[tokio::test]
    async fn test_channel_failure_keeps_partial_summary() {
        let _guard = test_trace_log_setup();
        let mut channel = SimChannel::new(Oracle::new(100)).close_after(3);
        let aborted = run(&mut channel, &Config::new()).await.unwrap_err();
        assert!(matches!(
            aborted.error,
            Error::Channel(ChannelError::Closed)
        ));
        assert_eq!(aborted.summary.round_trips, 3);
        assert_eq!(aborted.summary.bytes_sent, 1 + 2 + 4);
    }

    #[tokio::test]
    async fn test_protocol_violation_aborts() {
        let mut channel = SimChannel::new(Oracle::new(100)).garble_after(2);
        let aborted = run(&mut channel, &Config::new()).await.unwrap_err();
        assert!(matches!(aborted.error, Error::ProtocolViolation(_)));
        assert_eq!(aborted.summary.round_trips, 2);
        assert_eq!(aborted.summary.bytes_sent, 3);
    }

    #[tokio::test]
    async fn test_moving_threshold_is_stuck() {
        // 16 is rejected, then the oracle shrinks below the accepted 8
        let mut channel = SimChannel::new(Oracle::new(10)).shrink_after(5, 4);
        let aborted = run(&mut channel, &Config::new()).await.unwrap_err();
        assert!(matches!(
            aborted.error,
            Error::PolicyStuck {
                size: 8,
                phase: Phase::Narrowing,
                ..
            }
        ));
        assert_eq!(aborted.summary.round_trips, 6);
    }

    #[tokio::test]
    async fn test_round_trip_budget() {
        let mut channel = SimChannel::new(Oracle::new(1000));
        let config = Config::new().max_round_trips(5);
        let aborted = run(&mut channel, &config).await.unwrap_err();
        assert!(matches!(aborted.error, Error::PolicyStuck { size: 32, .. }));
        assert_eq!(aborted.summary.round_trips, 5);
    }

    #[tokio::test]
    async fn test_max_window_accepted() {
        let mut channel = SimChannel::new(Oracle::new(u64::MAX));
        let config = Config::new().max_window(1024);
        let aborted = run(&mut channel, &config).await.unwrap_err();
        assert!(matches!(
            aborted.error,
            Error::PolicyStuck {
                size: 1024,
                phase: Phase::Growing,
                ..
            }
        ));
        assert_eq!(channel.probes().last(), Some(&1024));
        assert_eq!(aborted.summary.round_trips, 11);
    }

    #[tokio::test]
    async fn test_threshold_below_max_window() {
        // doubling 512 would reach 1024, past the maximum window
        for policy in Policy::ALL {
            for threshold in [600, 995] {
                let mut channel = SimChannel::new(Oracle::new(threshold));
                let config = Config::new().policy(policy).max_window(1000);
                let report = run(&mut channel, &config).await.unwrap();
                assert_eq!(report.capacity, threshold, "{policy}");
                assert!(channel.probes().iter().all(|size| *size <= 1000));
                assert!(channel.probes().contains(&1000));
            }
        }
    }

    #[test]
    fn test_summary_throughput() {
        let summary = Summary {
            bytes_sent: 500,
            round_trips: 4,
            elapsed: Duration::from_millis(250),
        };
        assert!((summary.throughput() - 2000.0).abs() < 1e-9);
        assert!(Summary::default().throughput().abs() < f64::EPSILON);
    }
}
