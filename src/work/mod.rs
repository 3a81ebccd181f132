//! # Units of work.
//!
//! A [`Work`] is the deferred, cancellable computation an action factory
//! creates for each successful start. It produces zero or more values and then
//! exactly one terminal event; dropping it disposes whatever it holds.
//!
//! ```text
//! factory(state, input) ──► Work ──► Value* ─► Completed | Failed(E) | Interrupted
//! ```

mod unit;

pub use unit::Work;
