use std::io;
use std::time::Duration;

use crate::window::Phase;

/// Result type in slowstart
pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("channel error {0}")]
    Channel(#[from] ChannelError),
    #[error("protocol violation, reason: {0}")]
    ProtocolViolation(String),
    #[error("policy stuck at window {size} while {phase}, reason: {reason}")]
    PolicyStuck {
        size: u64,
        phase: Phase,
        reason: &'static str,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum ChannelError {
    #[error("io error {0}")]
    IO(#[from] io::Error),
    #[error("round trip timed out after {0:?}")]
    Timeout(Duration),
    #[error("connection closed by peer")]
    Closed,
}

#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    #[error("io error {0}")]
    IO(#[from] io::Error),
    #[error("unexpected token {0:?}")]
    UnexpectedToken(String),
    #[error("token exceeds {0} bytes without a line feed")]
    TokenTooLong(usize),
    #[error("stream ended inside token {0:?}")]
    Truncated(String),
}

impl From<CodecError> for Error {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::IO(err) => Error::Channel(ChannelError::IO(err)),
            other => Error::ProtocolViolation(other.to_string()),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Channel(ChannelError::IO(err))
    }
}
