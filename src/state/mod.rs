//! # External state and gating.
//!
//! - [`Property`] / [`MutableProperty`] observable state cells backed by
//!   `tokio::sync::watch`
//! - [`Gate`] derives "may I start" and the factory's state argument from a
//!   property
//!
//! Every action constructor shape reduces to a [`Gate`]:
//! ```text
//! Gate::new(state, predicate)   → enabled = predicate(&state), yields state
//! Gate::open()                  → always enabled, yields ()
//! Gate::flag(bool property)     → enabled = value, yields ()
//! Gate::unwrapping(Option<S>)   → enabled = is_some(), yields S
//! ```

mod gate;
mod property;

pub use gate::Gate;
pub use property::{MutableProperty, Property};
