//! # Action: gated command primitive.
//!
//! An [`Action`] wraps a unit-of-work factory with a [`Gate`](crate::Gate)
//! and allows **at most one** execution at a time.
//!
//! ## Architecture
//! ```text
//! apply(input) ──► Invocation (cold)
//!                      │ first poll
//!                      ▼
//!                 Core::try_start
//!                      ├─ slot busy / gate closed ──► disabled_errors, Failed(Disabled)
//!                      └─ factory(state, input, ctx) ──► Work
//!                                │  started trigger fires (sync)
//!                                ▼
//!                      poll Work ──► Value* ──► values, events
//!                                └─► terminal ──► Core::finish (exactly once)
//!                                                   ├─ errors / completed / events
//!                                                   ├─ slot freed, executing = false
//!                                                   └─ execution token cancelled
//! ```
//!
//! Internal modules:
//! - [`core`]: execution slot, buses, exactly-once terminal publishing;
//! - [`context`]: per-execution handle given to factories;
//! - [`invocation`]: the cold handle returned by `apply`;
//! - [`trigger`]: synchronous "execution started" notifier;
//! - [`primitive`]: the public [`Action`] type.

mod context;
mod core;
mod invocation;
mod primitive;
mod trigger;

pub use context::ExecutionContext;
pub use invocation::{Invocation, Outcome};
pub use primitive::Action;

pub(crate) use trigger::Listener;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks `m`, recovering the guard if a previous holder panicked.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
