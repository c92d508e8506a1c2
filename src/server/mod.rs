use std::future::Future;
use std::io;
use std::time::Duration;

use crate::oracle::Oracle;

/// Payload boundaries on a byte stream
mod incoming;

/// Oracle server implementation by using tokio's TCP framework
mod tokio;

pub use self::tokio::serve_connection;

/// Serve the acceptance oracle on every connection of a listener.
pub trait MakeOracle {
    /// Accept connections forever, answering each one on its own task.
    ///
    /// # Errors
    /// Returns the I/O error raised while accepting. Errors of a single connection are logged
    /// and only end that connection.
    fn serve(self, config: Config) -> impl Future<Output = io::Result<()>> + Send;
}

/// Oracle server config
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// The largest accepted payload, the default value is 256
    threshold: u64,
    /// Delay before every verdict, the default value is 100ms
    processing_delay: Duration,
    /// Idle time of a connection that closes a payload, the default value is 5ms
    coalesce_window: Duration,
    /// Size of the read buffer of a connection, the default value is 4096
    read_buf_cap: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            threshold: 256,
            processing_delay: Duration::from_millis(100),
            coalesce_window: Duration::from_millis(5),
            read_buf_cap: 4096,
        }
    }

    /// Set the largest accepted payload
    /// The default value is 256
    pub fn threshold(mut self, threshold: u64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the delay before every verdict
    /// The default value is 100ms
    pub fn processing_delay(mut self, delay: Duration) -> Self {
        self.processing_delay = delay;
        self
    }

    /// Set the idle time of a connection that closes a payload. It should stay well below the
    /// round trip time of the client, bytes arriving within the window belong to one payload.
    /// The default value is 5ms
    pub fn coalesce_window(mut self, window: Duration) -> Self {
        self.coalesce_window = window;
        self
    }

    /// Set the size of the read buffer of a connection
    /// The default value is 4096
    /// # Panics
    /// Panics if the capacity is 0
    pub fn read_buf_cap(mut self, cap: usize) -> Self {
        assert!(cap > 0, "read buffer capacity should be at least 1");
        self.read_buf_cap = cap;
        self
    }

    pub fn oracle(&self) -> Oracle {
        Oracle::new(self.threshold).with_delay(self.processing_delay)
    }
}
