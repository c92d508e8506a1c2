use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use std::time::Duration;

use futures::Stream;
use log::trace;
use pin_project_lite::pin_project;
use tokio::io::{AsyncRead, ReadBuf};
use tokio::time::{sleep_until, Instant, Sleep};

use super::Config;

pin_project! {
    /// The lengths of the payloads received on a connection.
    ///
    /// The client never sends a payload before the verdict on the previous one arrived, so
    /// every byte read until the connection stays idle for the coalesce window belongs to one
    /// payload. Bytes are counted and dropped right away. The stream ends at EOF, a payload
    /// cut short by EOF is never yielded.
    pub(crate) struct Payloads<R> {
        #[pin]
        reader: R,
        buf: Box<[u8]>,
        pending: u64,
        coalesce: Duration,
        settle: Option<Pin<Box<Sleep>>>,
    }
}

impl<R: AsyncRead> Payloads<R> {
    pub(crate) fn new(reader: R, config: &Config) -> Self {
        Self {
            reader,
            buf: vec![0; config.read_buf_cap].into_boxed_slice(),
            pending: 0,
            coalesce: config.coalesce_window,
            settle: None,
        }
    }
}

impl<R: AsyncRead> Stream for Payloads<R> {
    type Item = io::Result<u64>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        loop {
            let mut buf = ReadBuf::new(this.buf);
            match this.reader.as_mut().poll_read(cx, &mut buf) {
                Poll::Ready(Ok(())) => {
                    let read = buf.filled().len();
                    if read == 0 {
                        if *this.pending > 0 {
                            trace!("[server] {} bytes dropped at EOF", this.pending);
                            *this.pending = 0;
                        }
                        return Poll::Ready(None);
                    }
                    *this.pending += read as u64;
                    let deadline = Instant::now() + *this.coalesce;
                    this.settle
                        .get_or_insert_with(|| Box::pin(sleep_until(deadline)))
                        .as_mut()
                        .reset(deadline);
                }
                Poll::Ready(Err(err)) => return Poll::Ready(Some(Err(err))),
                Poll::Pending => break,
            }
        }
        let Some(settle) = this.settle.as_mut() else {
            return Poll::Pending;
        };
        ready!(settle.as_mut().poll(cx));
        this.settle.take();
        Poll::Ready(Some(Ok(std::mem::take(this.pending))))
    }
}
