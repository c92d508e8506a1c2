use std::io;

use fastrace::collector::SpanContext;
use fastrace::future::FutureExt;
use fastrace::Span;
use futures::StreamExt;
use log::{debug, error, info, trace};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;

use super::incoming::Payloads;
use super::{Config, MakeOracle};
use crate::utils::TraceStreamExt;

impl MakeOracle for TcpListener {
    async fn serve(self, config: Config) -> io::Result<()> {
        info!(
            "[server] oracle with threshold {} listening on {}",
            config.threshold,
            self.local_addr()?
        );
        loop {
            let (stream, peer) = self.accept().await?;
            if let Err(err) = stream.set_nodelay(true) {
                error!("[server] failed to set nodelay for {peer}: {err}");
                continue;
            }
            let root = Span::root("oracle_session", SpanContext::random())
                .with_properties(|| [("peer", peer.to_string())]);
            tokio::spawn(
                async move {
                    debug!("[server] accepted connection from {peer}");
                    match serve_connection(stream, &config).await {
                        Ok(served) => {
                            debug!("[server] {peer} disconnected after {served} payloads");
                        }
                        Err(err) => error!("[server] connection from {peer} failed: {err}"),
                    }
                }
                .in_span(root),
            );
        }
    }
}

/// Answer every payload received on `stream` until the peer closes it, returning the number
/// of verdicts written.
///
/// # Errors
/// Returns the I/O error raised while reading payloads or writing verdicts.
pub async fn serve_connection<S>(stream: S, config: &Config) -> io::Result<u64>
where
    S: AsyncRead + AsyncWrite,
{
    let oracle = config.oracle();
    let (reader, mut writer) = tokio::io::split(stream);
    let payloads = Payloads::new(reader, config)
        .enter_on_item(|| Span::enter_with_local_parent("payload"));
    let mut payloads = std::pin::pin!(payloads);
    let mut served = 0;
    while let Some(len) = payloads.next().await {
        let len = len?;
        let verdict = oracle.evaluate(len);
        trace!("[server] received {len} bytes, answering {verdict}");
        if !oracle.delay().is_zero() {
            tokio::time::sleep(oracle.delay()).await;
        }
        writer.write_all(verdict.token()).await?;
        writer.flush().await?;
        served += 1;
    }
    Ok(served)
}

#[cfg(test)]
mod test {
    use std::time::{Duration, Instant};

    use tokio::io::AsyncReadExt;

    use super::*;

    fn config() -> Config {
        Config::new()
            .threshold(4)
            .processing_delay(Duration::ZERO)
            .coalesce_window(Duration::from_millis(20))
    }

    #[tokio::test]
    async fn test_serve_connection_answers_each_payload() {
        let (mut client, server) = tokio::io::duplex(64);
        let handle = tokio::spawn(async move { serve_connection(server, &config()).await });

        let mut token = [0; 4];
        client.write_all(b"abcd").await.unwrap();
        client.read_exact(&mut token).await.unwrap();
        assert_eq!(&token, b"ACK\n");

        // two chunks of one payload, together above the threshold
        client.write_all(b"abc").await.unwrap();
        client.write_all(b"de").await.unwrap();
        client.read_exact(&mut token).await.unwrap();
        assert_eq!(&token, b"NAK\n");

        drop(client);
        assert_eq!(handle.await.unwrap().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_serve_connection_waits_for_processing_delay() {
        let (mut client, server) = tokio::io::duplex(64);
        let config = config().processing_delay(Duration::from_millis(100));
        let handle = tokio::spawn(async move { serve_connection(server, &config).await });

        let start = Instant::now();
        client.write_all(b"a").await.unwrap();
        let mut token = [0; 4];
        client.read_exact(&mut token).await.unwrap();
        assert_eq!(&token, b"ACK\n");
        assert!(start.elapsed() >= Duration::from_millis(100));

        drop(client);
        assert_eq!(handle.await.unwrap().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_serve_connection_eof_without_payload() {
        let (client, server) = tokio::io::duplex(64);
        drop(client);
        assert_eq!(serve_connection(server, &config()).await.unwrap(), 0);
    }
}
