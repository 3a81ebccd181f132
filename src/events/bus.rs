//! # Broadcast bus for lifecycle streams.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking publishing from the action core to any number of observers.
//!
//! ## Architecture
//! ```text
//! Publisher (one per action):          Receivers (many):
//!                                   ┌──► events()     (observer A)
//!   action core ──► Bus<T> ─────────┼──► events()     (observer B)
//!                (broadcast chan)   └──► SubscriberSet listener
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks; it calls `broadcast::Sender::send`.
//! - **Hot**: a receiver only observes items sent **after** it subscribed.
//! - **Bounded capacity**: a single ring buffer stores recent items for all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: items are lost if there are no active receivers at send time.

use futures::Stream;
use futures::stream;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

/// Broadcast channel for one lifecycle stream.
///
/// ### Properties
/// - **Non-blocking**: `publish()` returns immediately (send clones internally).
/// - **Fire-and-forget**: no delivery or durability guarantees.
/// - **Cloneable**: cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Debug)]
pub struct Bus<T> {
    tx: broadcast::Sender<T>,
}

impl<T> Clone for Bus<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T: Clone> Bus<T> {
    /// Creates a new bus with the given channel capacity.
    ///
    /// ### Notes
    /// - Capacity is **shared** across all receivers (not per-subscriber).
    /// - The minimum capacity is 1 (clamped).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<T>(capacity);
        Self { tx }
    }

    /// Publishes an item to all active receivers.
    ///
    /// If there are no receivers, the item is dropped (this function still returns immediately).
    pub fn publish(&self, item: T) {
        let _ = self.tx.send(item);
    }

    /// Creates a new receiver that will observe subsequent items.
    ///
    /// - Each call creates an **independent** receiver.
    /// - Slow receivers get `RecvError::Lagged(n)` and skip over missed items.
    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.tx.subscribe()
    }

    /// Number of receivers currently subscribed.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl<T: Clone + Send + 'static> Bus<T> {
    /// Subscribes and adapts the receiver into a [`Stream`].
    ///
    /// Lagged items are skipped silently; the stream ends when the bus is dropped.
    pub fn stream(&self) -> impl Stream<Item = T> + Send + 'static {
        into_stream(self.subscribe())
    }
}

/// Adapts a broadcast receiver into a stream that skips over lag.
pub(crate) fn into_stream<T: Clone + Send + 'static>(
    rx: broadcast::Receiver<T>,
) -> impl Stream<Item = T> + Send + 'static {
    stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(item) => return Some((item, rx)),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "bus receiver lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn receiver_sees_only_later_items() {
        let bus = Bus::new(8);
        bus.publish(1);
        let mut rx = bus.subscribe();
        bus.publish(2);
        assert_eq!(rx.try_recv().ok(), Some(2));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn every_receiver_gets_a_copy() {
        let bus = Bus::new(8);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        bus.publish("x");
        assert_eq!(a.try_recv().ok(), Some("x"));
        assert_eq!(b.try_recv().ok(), Some("x"));
        assert_eq!(bus.receiver_count(), 2);
    }

    #[tokio::test]
    async fn stream_ends_when_bus_dropped() {
        let bus = Bus::new(4);
        let stream = bus.stream();
        bus.publish(7);
        drop(bus);
        let items: Vec<i32> = stream.collect().await;
        assert_eq!(items, vec![7]);
    }
}
