//! # Stream-backed unit of work (`Work`)
//!
//! [`Work`] wraps a boxed stream of lifecycle [`Event`]s and enforces the
//! lifecycle grammar: after the first terminal event the stream is dropped
//! and `Work` yields `None` forever.
//!
//! ## Concurrency semantics
//! - Nothing runs until the work is polled; factories only *describe* work.
//! - Dropping a `Work` at any point is the teardown: the wrapped stream (and any
//!   future inside it) is dropped and never polled again.
//! - A source that ends without a terminal event is reported as `Completed`
//!   by the action driving it.
//!
//! ## Example
//! ```rust
//! use futures::StreamExt;
//! use interruptible_action::{Event, Work};
//!
//! # futures::executor::block_on(async {
//! let work: Work<u32, String> = Work::values([1, 2]);
//! let events: Vec<_> = work.collect().await;
//! assert_eq!(events, vec![Event::Value(1), Event::Value(2), Event::Completed]);
//! # });
//! ```

use std::fmt;
use std::future::{self, Future};
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt};

use crate::events::Event;

/// Deferred, cancellable computation producing values then one terminal event.
pub struct Work<O, E> {
    events: Option<BoxStream<'static, Event<O, E>>>,
    guards: Vec<Box<dyn Send>>,
}

impl<O, E> fmt::Debug for Work<O, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Work")
            .field("done", &self.is_done())
            .field("guards", &self.guards.len())
            .finish()
    }
}

impl<O: Send + 'static, E: Send + 'static> Work<O, E> {
    /// Wraps a stream of lifecycle events; everything after the first terminal event is ignored.
    pub fn from_events<S>(events: S) -> Self
    where
        S: Stream<Item = Event<O, E>> + Send + 'static,
    {
        Self {
            events: Some(events.boxed()),
            guards: Vec::new(),
        }
    }

    /// Wraps a fallible stream: `Ok` items are values, the first `Err` fails the
    /// work, and the end of the stream completes it.
    pub fn from_stream<S>(results: S) -> Self
    where
        S: Stream<Item = Result<O, E>> + Send + 'static,
    {
        Self::from_events(
            results
                .map(Event::from)
                .chain(stream::once(future::ready(Event::Completed))),
        )
    }

    /// Single-shot work: one value then `Completed`, or `Failed`.
    pub fn from_future<F>(fut: F) -> Self
    where
        F: Future<Output = Result<O, E>> + Send + 'static,
    {
        Self::from_stream(stream::once(fut))
    }

    /// Emits every item of `values`, then completes.
    pub fn values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = O>,
        I::IntoIter: Send + 'static,
    {
        Self::from_stream(stream::iter(values.into_iter().map(Ok)))
    }

    /// Completes immediately without values.
    pub fn empty() -> Self {
        Self::from_events(stream::once(future::ready(Event::Completed)))
    }

    /// Fails immediately with `error`.
    pub fn failed(error: E) -> Self {
        Self::from_events(stream::once(future::ready(Event::Failed(error))))
    }

    /// Never produces anything and never terminates on its own.
    pub fn never() -> Self {
        Self::from_events(stream::pending())
    }

    /// Keeps `guard` alive exactly as long as this work is outstanding.
    ///
    /// The guard is dropped together with the work, or as soon as the work
    /// yields its terminal event, whichever happens first.
    pub fn holding<G: Send + 'static>(mut self, guard: G) -> Self {
        self.guards.push(Box::new(guard));
        self
    }
}

impl<O, E> Work<O, E> {
    /// True once the terminal event has been yielded.
    pub fn is_done(&self) -> bool {
        self.events.is_none()
    }

    fn finish(&mut self) {
        self.events = None;
        self.guards.clear();
    }
}

impl<O, E> Stream for Work<O, E> {
    type Item = Event<O, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(events) = this.events.as_mut() else {
            return Poll::Ready(None);
        };
        match events.poll_next_unpin(cx) {
            Poll::Ready(Some(ev)) => {
                if ev.is_terminal() {
                    this.finish();
                }
                Poll::Ready(Some(ev))
            }
            Poll::Ready(None) => {
                this.finish();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Flag(Arc<AtomicBool>);

    impl Drop for Flag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn first_error_is_terminal() {
        let work: Work<u8, &str> =
            Work::from_stream(stream::iter(vec![Ok(1), Err("boom"), Ok(2)]));
        let events: Vec<_> = work.collect().await;
        assert_eq!(events, vec![Event::Value(1), Event::Failed("boom")]);
    }

    #[tokio::test]
    async fn events_after_terminal_are_ignored() {
        let work: Work<u8, ()> = Work::from_events(stream::iter(vec![
            Event::Interrupted,
            Event::Value(9),
            Event::Completed,
        ]));
        let events: Vec<_> = work.collect().await;
        assert_eq!(events, vec![Event::Interrupted]);
    }

    #[tokio::test]
    async fn future_work_yields_value_then_completes() {
        let work: Work<u8, ()> = Work::from_future(async { Ok(4) });
        let events: Vec<_> = work.collect().await;
        assert_eq!(events, vec![Event::Value(4), Event::Completed]);
    }

    #[test]
    fn guard_released_on_terminal_event() {
        let dropped = Arc::new(AtomicBool::new(false));
        let mut work: Work<(), ()> = Work::empty().holding(Flag(Arc::clone(&dropped)));
        assert!(!dropped.load(Ordering::SeqCst));

        let ev = work.next().now_or_never().flatten();
        assert_eq!(ev, Some(Event::Completed));
        assert!(work.is_done());
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[test]
    fn never_stays_pending_until_dropped() {
        let dropped = Arc::new(AtomicBool::new(false));
        let mut work: Work<(), ()> = Work::never().holding(Flag(Arc::clone(&dropped)));
        assert!(work.next().now_or_never().is_none());
        drop(work);
        assert!(dropped.load(Ordering::SeqCst));
    }
}
