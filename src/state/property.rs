//! # Observable state cells.
//!
//! [`MutableProperty`] owns a value and notifies observers on every change;
//! [`Property`] is its read-only, cheaply cloneable view. Both are thin
//! wrappers over [`tokio::sync::watch`].
//!
//! ## Rules
//! - Reads never block and always see the latest value.
//! - A [`Property::constant`] never changes; `changed()` on it returns an error.
//! - Dropping every `MutableProperty` freezes the value seen by its properties.

use std::fmt;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Read-only view of an observable value.
pub struct Property<T> {
    rx: watch::Receiver<T>,
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Property").field(&*self.rx.borrow()).finish()
    }
}

impl<T> Property<T> {
    /// Creates a property whose value never changes.
    pub fn constant(value: T) -> Self {
        let (_tx, rx) = watch::channel(value);
        Self { rx }
    }

    /// Runs `f` against the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.rx.borrow())
    }

    /// Returns a fresh watch receiver observing this property.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.rx.clone()
    }

    /// Waits until the value changes after the last observed version.
    ///
    /// Returns an error if the property can no longer change.
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.rx.changed().await
    }

    /// Waits until `predicate` holds for the current value.
    ///
    /// Returns an error if the property can no longer change and the predicate never held.
    pub async fn wait_for(
        &mut self,
        predicate: impl FnMut(&T) -> bool,
    ) -> Result<(), watch::error::RecvError> {
        self.rx.wait_for(predicate).await.map(|_| ())
    }
}

impl<T: Clone> Property<T> {
    /// Returns a clone of the current value.
    pub fn get(&self) -> T {
        self.rx.borrow().clone()
    }
}

impl<T: Send + Sync + 'static> Property<T> {
    /// Calls `on_change` after every change until it returns `false`,
    /// `stop` is cancelled, or the property can no longer change.
    ///
    /// Needs a tokio runtime; outside of one this is a no-op.
    pub(crate) fn watch(&self, stop: CancellationToken, on_change: impl Fn() -> bool + Send + 'static) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let mut rx = self.rx.clone();
        rx.mark_unchanged();
        handle.spawn(async move {
            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    res = rx.changed() => {
                        if res.is_err() || !on_change() {
                            break;
                        }
                    }
                }
            }
        });
    }
}

impl<T> From<watch::Receiver<T>> for Property<T> {
    fn from(rx: watch::Receiver<T>) -> Self {
        Self { rx }
    }
}

/// Owned, writable observable value.
pub struct MutableProperty<T> {
    tx: watch::Sender<T>,
}

impl<T: fmt::Debug> fmt::Debug for MutableProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MutableProperty")
            .field(&*self.tx.borrow())
            .finish()
    }
}

impl<T> MutableProperty<T> {
    /// Creates a new property holding `value`.
    pub fn new(value: T) -> Self {
        let (tx, _rx) = watch::channel(value);
        Self { tx }
    }

    /// Replaces the value and notifies observers.
    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Mutates the value in place and notifies observers.
    pub fn modify(&self, f: impl FnOnce(&mut T)) {
        self.tx.send_modify(f);
    }

    /// Returns a read-only view.
    pub fn property(&self) -> Property<T> {
        Property {
            rx: self.tx.subscribe(),
        }
    }
}

impl<T: PartialEq> MutableProperty<T> {
    /// Replaces the value, notifying observers only if it differs.
    ///
    /// Returns `true` if observers were notified.
    pub fn set_if_changed(&self, value: T) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        })
    }
}

impl<T: Clone> MutableProperty<T> {
    /// Returns a clone of the current value.
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }
}

impl<T> MutableProperty<T> {
    /// Number of live receivers, including every [`Property`] view and follower.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl<T: Default> Default for MutableProperty<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_follows_mutations() {
        let cell = MutableProperty::new(1);
        let view = cell.property();
        cell.set(2);
        assert_eq!(view.get(), 2);
        cell.modify(|v| *v += 10);
        assert_eq!(view.get(), 12);
        assert_eq!(view.with(|v| *v * 2), 24);
    }

    #[test]
    fn set_if_changed_skips_equal_values() {
        let cell = MutableProperty::new("a");
        assert!(!cell.set_if_changed("a"));
        assert!(cell.set_if_changed("b"));
        assert_eq!(cell.get(), "b");
    }

    #[tokio::test]
    async fn constant_never_changes() {
        let mut prop = Property::constant(5);
        assert_eq!(prop.get(), 5);
        assert!(prop.changed().await.is_err());
    }

    #[tokio::test]
    async fn watch_reports_changes_until_stopped() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let cell = MutableProperty::new(0);
        let seen = Arc::new(AtomicUsize::new(0));
        let (done_tx, mut done_rx) = tokio::sync::mpsc::unbounded_channel();
        {
            let seen = Arc::clone(&seen);
            cell.property().watch(CancellationToken::new(), move || {
                seen.fetch_add(1, Ordering::SeqCst);
                let _ = done_tx.send(());
                false
            });
        }
        cell.set(1);
        done_rx.recv().await;
        cell.set(2);
        tokio::task::yield_now().await;
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancelled_watch_releases_receiver() {
        let cell = MutableProperty::new(0);
        let stop = CancellationToken::new();
        cell.property().watch(stop.clone(), || true);
        assert_eq!(cell.receiver_count(), 1);

        stop.cancel();
        for _ in 0..16 {
            if cell.receiver_count() == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(cell.receiver_count(), 0);
    }
}
