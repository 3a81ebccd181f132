//! # Lifecycle event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`]
//! fan-out and the built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//!   Action ── publish(Event) ──► Bus ──► observe() listener
//!                                              │
//!                                        SubscriberSet
//!                                  ┌───────────┼───────────┐
//!                                  ▼           ▼           ▼
//!                              LogWriter    Metrics      Custom
//! ```
//!
//! Subscribers are attached with `Action::observe` or
//! `InterruptibleAction::observe`; each gets its own queue and worker, so a
//! slow or panicking subscriber never affects the action or its peers.

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
