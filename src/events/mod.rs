//! Lifecycle events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to the lifecycle of every execution an action starts.
//!
//! ## Contents
//! - [`Event`], [`EventKind`] lifecycle classification and payload
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: the action core (start attempts, values, terminal events).
//! - **Consumers**: any holder of a receiver from `Action::events()` and friends,
//!   and `SubscriberSet` listeners created by `observe`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};

pub(crate) use bus::into_stream;
