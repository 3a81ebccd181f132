//! # Subscriber trait
//!
//! `Subscribe` is the extension point for reacting to the lifecycle of an
//! action's executions. Each subscriber is driven by its own worker task fed by
//! a bounded queue owned by the [`SubscriberSet`](crate::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching); they do **not** block the
//!   action nor other subscribers.
//! - Each subscriber declares its queue capacity via
//!   [`Subscribe::queue_capacity`]. On overflow, events for that subscriber are
//!   **dropped** (warn).
//!
//! ## Example
//! ```rust
//! use interruptible_action::{Event, Subscribe};
//!
//! struct Audit;
//!
//! #[async_trait::async_trait]
//! impl Subscribe<String, std::io::Error> for Audit {
//!     async fn on_event(&self, event: &Event<String, std::io::Error>) {
//!         let _ = event.as_label();
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "audit"
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Contract for lifecycle event subscribers.
///
/// Called from a subscriber-dedicated worker task; avoid blocking the runtime.
#[async_trait]
pub trait Subscribe<O, E>: Send + Sync + 'static {
    /// Handles a single event.
    async fn on_event(&self, event: &Event<O, E>);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
