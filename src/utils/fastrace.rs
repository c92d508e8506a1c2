use std::pin::Pin;
use std::task::{Context, Poll};

use fastrace::Span;
use futures::Stream;
use pin_project_lite::pin_project;

pub(crate) trait TraceStreamExt: Stream + Sized {
    /// Wrap every item of the stream in a span created by `span_fn`.
    ///
    /// The span opens on the first poll after the previous item and closes when the next item
    /// (or the end of the stream) is ready, so on a connection it covers the wait for a payload
    /// and the coalescing of its bytes:
    ///
    /// ```text
    ///           verdict 1                 verdict 2
    ///               v                         v
    /// [payload 1]----[------payload 2-------]----
    ///                ^                      ^
    ///                span opens             span closes
    /// ```
    fn enter_on_item<O: Fn() -> Span>(self, span_fn: O) -> EnterOnItem<Self, O> {
        EnterOnItem {
            inner: self,
            span: None,
            span_fn,
        }
    }
}

impl<S: Stream> TraceStreamExt for S {}

pin_project! {
    /// Stream returned by [`TraceStreamExt::enter_on_item`].
    pub(crate) struct EnterOnItem<T, O> {
        #[pin]
        inner: T,
        // span of the item being produced
        span: Option<Span>,
        span_fn: O,
    }
}

impl<T, O> Stream for EnterOnItem<T, O>
where
    T: Stream,
    O: Fn() -> Span,
{
    type Item = T::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        let span = this.span.get_or_insert_with(this.span_fn);
        // spans entered by the inner stream become children of the item span
        let parent = span.set_local_parent();
        let polled = this.inner.poll_next(cx);
        drop(parent);
        if polled.is_ready() {
            this.span.take();
        }
        polled
    }
}

#[cfg(test)]
mod test {
    use futures::StreamExt;

    use super::*;

    #[tokio::test]
    async fn test_enter_on_item_passes_items_through() {
        let spans = std::cell::Cell::new(0);
        let items: Vec<u64> = futures::stream::iter([3, 1, 4])
            .enter_on_item(|| {
                spans.set(spans.get() + 1);
                Span::noop()
            })
            .collect()
            .await;
        assert_eq!(items, vec![3, 1, 4]);
        // one span per item plus the one ended by the end of the stream
        assert_eq!(spans.get(), 4);
    }
}
