//! # Interruptible actions.
//!
//! An [`InterruptibleAction`] pairs two actions over one [`Gate`](crate::Gate):
//! - `inner` runs the user's work, one execution at a time;
//! - `interrupt` is a trivial action whose successful start cancels whatever
//!   `inner` is currently running.
//!
//! ## Wiring
//! ```text
//!  inner.apply(input) ──► factory(state, input) ──► Work
//!                                                    │ holding(listener)
//!                                                    ▼
//!  interrupt.fire() ──► started trigger ──► listener ──► ctx.interrupt()
//!                                                          ├─ events: Interrupted
//!                                                          ├─ is_executing = false
//!                                                          └─ Work dropped on next poll
//! ```
//!
//! The listener lives exactly as long as the work it was created for, so an
//! idle action has no listeners and an interrupt while idle has no effect
//! beyond the interrupt action's own completion.
//!
//! ## Restart
//! [`BindingTarget`] turns a stream of inputs into "cancel the current run,
//! then start a fresh one with the new input", which is the usual shape of
//! search-as-you-type and refresh-on-change flows.

mod action;
mod binding;

pub use action::InterruptibleAction;
pub use binding::BindingTarget;
