//! # SubscriberSet: non-blocking fan-out over multiple subscribers
//!
//! [`SubscriberSet`] hands each lifecycle [`Event`] to every subscriber
//! **without awaiting** their processing.
//!
//! ## Guarantees
//! - `emit(&Event)` returns immediately.
//! - Per-subscriber FIFO (queue order).
//! - Panics inside subscribers are caught and logged; the worker keeps going.
//!
//! ## Non-guarantees
//! - No ordering across different subscribers.
//! - No retries on queue overflow (the event is dropped for that subscriber).
//!
//! ```text
//!   bus ──► listen ──► emit(&Event)
//!                        ├──► [queue S1] ─► worker S1 ─► on_event()
//!                        ├──► [queue S2] ─► worker S2 ─► on_event()
//!                        └──► [queue SN] ─► worker SN ─► on_event()
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::{FutureExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, warn};

use super::Subscribe;
use crate::events::{Bus, Event, into_stream};

struct SubscriberChannel<O, E> {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event<O, E>>>,
}

/// Fan-out with per-subscriber bounded queues and worker tasks.
pub struct SubscriberSet<O, E> {
    channels: Vec<SubscriberChannel<O, E>>,
    workers: Vec<JoinHandle<()>>,
}

impl<O, E> SubscriberSet<O, E>
where
    O: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Creates the set and spawns one worker per subscriber.
    ///
    /// # Panics
    /// Panics if called outside of a tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe<O, E>>>) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event<O, E>>>(sub.queue_capacity().max(1));

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = sub.on_event(ev.as_ref());
                    if let Err(panic) = AssertUnwindSafe(fut).catch_unwind().await {
                        warn!(subscriber = sub.name(), info = %panic_message(&*panic), "subscriber panicked");
                    }
                }
            });

            channels.push(SubscriberChannel { name, sender: tx });
            workers.push(handle);
        }

        Self { channels, workers }
    }

    /// Hands one event to every subscriber queue.
    pub fn emit(&self, event: &Event<O, E>) {
        let ev = Arc::new(event.clone());
        for channel in &self.channels {
            match channel.sender.try_send(Arc::clone(&ev)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(subscriber = channel.name, event = ev.as_label(), "queue full, event dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    warn!(subscriber = channel.name, event = ev.as_label(), "worker closed, event dropped");
                }
            }
        }
    }

    /// Forwards everything published on `bus` until the bus is dropped,
    /// then shuts the set down.
    pub fn listen(self, bus: &Bus<Event<O, E>>) -> JoinHandle<()> {
        let mut events = Box::pin(into_stream(bus.subscribe()));
        tokio::spawn(async move {
            while let Some(ev) = events.next().await {
                self.emit(&ev);
            }
            debug!(subscribers = self.len(), "event bus closed");
            self.shutdown().await;
        })
    }

    /// Closes all queues and waits for the workers to drain them.
    pub async fn shutdown(self) {
        drop(self.channels);
        for h in self.workers {
            let _ = h.await;
        }
    }
}

impl<O, E> SubscriberSet<O, E> {
    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Record(Mutex<Vec<&'static str>>);

    #[async_trait]
    impl Subscribe<u8, ()> for Record {
        async fn on_event(&self, event: &Event<u8, ()>) {
            self.0.lock().unwrap().push(event.as_label());
        }
    }

    struct Explode;

    #[async_trait]
    impl Subscribe<u8, ()> for Explode {
        async fn on_event(&self, _event: &Event<u8, ()>) {
            panic!("boom");
        }
    }

    #[tokio::test]
    async fn panicking_subscriber_does_not_starve_others() {
        let record = Arc::new(Record::default());
        let set = SubscriberSet::new(vec![
            Arc::new(Explode) as Arc<dyn Subscribe<u8, ()>>,
            Arc::clone(&record) as Arc<dyn Subscribe<u8, ()>>,
        ]);
        assert_eq!(set.len(), 2);

        set.emit(&Event::Value(1));
        set.emit(&Event::Completed);
        set.shutdown().await;

        assert_eq!(*record.0.lock().unwrap(), vec!["value", "completed"]);
    }

    #[tokio::test]
    async fn listen_drains_after_bus_dropped() {
        let record = Arc::new(Record::default());
        let bus: Bus<Event<u8, ()>> = Bus::new(16);
        let handle =
            SubscriberSet::new(vec![Arc::clone(&record) as Arc<dyn Subscribe<u8, ()>>]).listen(&bus);

        bus.publish(Event::Value(3));
        bus.publish(Event::Interrupted);
        drop(bus);
        handle.await.unwrap();

        assert_eq!(*record.0.lock().unwrap(), vec!["value", "interrupted"]);
    }

    #[test]
    fn panic_message_reads_common_payloads() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42u8), "unknown");
    }
}
