//! # interruptible-action
//!
//! **interruptible-action** provides gated, observable commands for async Rust
//! whose running work can be cancelled by a second command.
//!
//! Typical uses are "search as you type" and "refresh on change": every new
//! input cancels the work started for the previous one and starts fresh.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!        MutableProperty<S> ──► Property<S> ──► Gate<T> (predicate + state)
//!                                                  │ shared
//!                              ┌───────────────────┴───────────────────┐
//!                              ▼                                       ▼
//! ┌────────────────────────────────────────┐   ┌──────────────────────────────────┐
//! │ inner: Action<I, O, E>                 │   │ interrupt: Action<(), (), !>     │
//! │ - single execution slot                │   │ - factory: Work::empty()         │
//! │ - factory(state, input) ─► Work        │◄──┤ - started trigger (sync)         │
//! │ - executing / enabled properties       │   └──────────────────────────────────┘
//! │ - buses: events, values, errors,       │        ▲
//! │          completed, disabled_errors    │        │ interrupt().fire()
//! └───────────────┬────────────────────────┘        │
//!                 │                           BindingTarget::send(input)
//!                 ▼                             1. interrupt.fire()
//!        Bus<Event<O, E>> ──► observe()          2. inner.apply(input).start()
//!                                │
//!                          SubscriberSet
//!                       ┌────────┼────────┐
//!                       ▼        ▼        ▼
//!                  LogWriter  worker2  workerN
//! ```
//!
//! ### Lifecycle of one execution
//! ```text
//! apply(input) ──► Invocation (cold) ──► first poll
//!   ├─ gate closed / slot busy ──► disabled_errors, Failed(Disabled)
//!   └─ factory(state, input) ──► Work (holds interrupt listener)
//!         ├─ Value* ──► values, events
//!         └─ exactly one of:
//!              Completed    ──► completed, events
//!              Failed(e)    ──► errors, events
//!              Interrupted  ──► events  (interrupt fired, context interrupted,
//!                                        or invocation dropped)
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                          |
//! |-------------------|--------------------------------------------------------------|---------------------------------------------|
//! | **Actions**       | Gated single-flight commands with hot lifecycle streams.     | [`Action`], [`Invocation`], [`Outcome`]     |
//! | **Interruption**  | Cancel the running work; restart it from an input stream.    | [`InterruptibleAction`], [`BindingTarget`]  |
//! | **State**         | Observable values and enabling predicates.                   | [`Property`], [`MutableProperty`], [`Gate`] |
//! | **Work**          | Deferred cancellable computations.                           | [`Work`], [`ExecutionContext`]              |
//! | **Subscriber API**| Hook into the lifecycle (logging, metrics, custom).          | [`Subscribe`], [`SubscriberSet`], [`LogWriter`] |
//! | **Errors**        | Typed start, producer and binding errors.                    | [`ActionError`], [`BindingError`]           |
//! | **Configuration** | Names and bus capacity.                                      | [`Config`]                                  |
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use interruptible_action::{Event, InterruptibleAction, MutableProperty, Work};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let online = MutableProperty::new(true);
//!     let search: InterruptibleAction<String, String, ()> =
//!         InterruptibleAction::enabled_if(online.property(), |query: String| {
//!             Work::from_future(async move {
//!                 tokio::time::sleep(Duration::from_millis(10)).await;
//!                 Ok(format!("results for {query}"))
//!             })
//!         });
//!
//!     let mut events = search.events();
//!     let target = search.binding_target();
//!     target.send("ru".into()).unwrap();
//!     let last = target.send("rust".into()).unwrap();
//!
//!     let outcome = last.await.unwrap().unwrap();
//!     assert_eq!(outcome.values(), ["results for rust".to_string()]);
//!     assert_eq!(events.recv().await.ok(), Some(Event::Interrupted));
//! }
//! ```
mod action;
mod config;
mod error;
mod events;
mod interruptible;
mod state;
mod subscribers;
mod work;

// ---- Public re-exports ----

pub use action::{Action, ExecutionContext, Invocation, Outcome};
pub use config::Config;
pub use error::{ActionError, BindingError};
pub use events::{Bus, Event, EventKind};
pub use interruptible::{BindingTarget, InterruptibleAction};
pub use state::{Gate, MutableProperty, Property};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
pub use work::Work;
