use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use log::{debug, warn};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_util::codec::Framed;

use super::{Config, ProbeChannel};
use crate::codec::ProbeCodec;
use crate::controller::{self, Aborted, Report};
use crate::errors::{ChannelError, Error, Result};
use crate::Verdict;

/// A probe channel over any byte stream, usually a [`TcpStream`].
///
/// The channel owns the stream, dropping it closes the connection.
#[derive(Debug)]
pub struct StreamChannel<S> {
    framed: Framed<S, ProbeCodec>,
    timeout: Duration,
}

impl<S> StreamChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S, config: &Config) -> Self {
        Self {
            framed: Framed::new(stream, ProbeCodec),
            timeout: config.round_trip_timeout,
        }
    }

    /// Flush and shut down the write side of the stream.
    ///
    /// # Errors
    /// Returns the I/O error raised while flushing or shutting down.
    pub async fn close(mut self) -> Result<()> {
        SinkExt::<Bytes>::close(&mut self.framed).await?;
        Ok(())
    }
}

impl<S> ProbeChannel for StreamChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn round_trip(&mut self, payload: Bytes) -> Result<Verdict> {
        let timeout = self.timeout;
        let framed = &mut self.framed;
        let exchange = async move {
            framed.send(payload).await?;
            match framed.next().await {
                Some(verdict) => Ok(verdict?),
                None => Err(Error::from(ChannelError::Closed)),
            }
        };
        tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| ChannelError::Timeout(timeout))?
    }
}

/// Connect to an oracle server.
///
/// # Errors
/// Returns [`ChannelError::IO`] if the connection is refused and [`ChannelError::Timeout`] if
/// it is not established within the round trip timeout.
pub async fn connect(
    addr: impl ToSocketAddrs,
    config: &Config,
) -> Result<StreamChannel<TcpStream>> {
    let timeout = config.round_trip_timeout;
    let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| ChannelError::Timeout(timeout))??;
    stream.set_nodelay(true)?;
    debug!("[client] connected to {}", stream.peer_addr()?);
    Ok(StreamChannel::new(stream, config))
}

/// Connect to an oracle server and run one probe session over the connection.
///
/// # Errors
/// Returns [`Aborted`] with the statistics gathered before the failure.
pub async fn probe(
    addr: impl ToSocketAddrs,
    config: &Config,
) -> std::result::Result<Report, Aborted> {
    let mut channel = connect(addr, config).await?;
    let report = controller::run(&mut channel, config).await?;
    if let Err(err) = channel.close().await {
        warn!("[client] failed to close connection: {err}");
    }
    Ok(report)
}
