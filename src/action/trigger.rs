//! # Synchronous start notifier.
//!
//! [`Trigger`] calls every registered callback on the thread that fires it.
//! Actions fire their trigger right after an execution successfully starts,
//! which lets another action react before the starting invocation yields
//! anything.
//!
//! ## Rules
//! - Callbacks run **outside** the listener lock; a callback may register or
//!   drop listeners without deadlocking.
//! - Callbacks run in registration order.
//! - A [`Listener`] unregisters itself on drop.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use super::lock;

type Callback = Arc<dyn Fn() + Send + Sync>;

/// One-to-many synchronous notifier.
#[derive(Default)]
pub(crate) struct Trigger {
    next_id: AtomicU64,
    listeners: Mutex<BTreeMap<u64, Callback>>,
}

impl Trigger {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers `callback` until the returned guard is dropped.
    pub(crate) fn listen(self: &Arc<Self>, callback: impl Fn() + Send + Sync + 'static) -> Listener {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.listeners).insert(id, Arc::new(callback));
        Listener {
            id,
            trigger: Arc::downgrade(self),
        }
    }

    /// Calls every current listener; returns how many were called.
    pub(crate) fn fire(&self) -> usize {
        let callbacks: Vec<Callback> = lock(&self.listeners).values().cloned().collect();
        for cb in &callbacks {
            cb();
        }
        callbacks.len()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        lock(&self.listeners).len()
    }
}

/// Registration guard returned by [`Trigger::listen`].
pub(crate) struct Listener {
    id: u64,
    trigger: Weak<Trigger>,
}

impl Drop for Listener {
    fn drop(&mut self) {
        if let Some(trigger) = self.trigger.upgrade() {
            lock(&trigger.listeners).remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn fires_until_listener_dropped() {
        let trigger = Trigger::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let listener = {
            let hits = Arc::clone(&hits);
            trigger.listen(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            })
        };

        assert_eq!(trigger.fire(), 1);
        drop(listener);
        assert_eq!(trigger.fire(), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(trigger.len(), 0);
    }

    #[test]
    fn callback_may_drop_listeners() {
        let trigger = Trigger::new();
        let slot: Arc<Mutex<Option<Listener>>> = Arc::new(Mutex::new(None));
        let listener = {
            let slot = Arc::clone(&slot);
            trigger.listen(move || {
                lock(&slot).take();
            })
        };
        *lock(&slot) = Some(listener);

        assert_eq!(trigger.fire(), 1);
        assert_eq!(trigger.len(), 0);
    }

    #[test]
    fn listener_outliving_trigger_is_harmless() {
        let trigger = Trigger::new();
        let listener = trigger.listen(|| {});
        drop(trigger);
        drop(listener);
    }
}
