//! # `Action`: public handle over an action core.
//!
//! ## Example
//! ```rust
//! use interruptible_action::{Action, Event, Outcome, Work};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let double: Action<u32, u32, String> = Action::from_factory(|n| Work::values([n * 2]));
//!
//! let mut events = double.events();
//! let outcome = double.apply(21).run().await;
//!
//! assert_eq!(outcome, Ok(Outcome::Completed { values: vec![42] }));
//! assert_eq!(events.recv().await.ok(), Some(Event::Value(42)));
//! assert_eq!(events.recv().await.ok(), Some(Event::Completed));
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::context::ExecutionContext;
use super::core::Core;
use super::invocation::Invocation;
use super::trigger::Listener;
use crate::config::Config;
use crate::events::Event;
use crate::state::{Gate, Property};
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::work::Work;

/// Gated command producing at most one outstanding unit of work at a time.
///
/// Cloning an `Action` is cheap and yields another handle to the same action.
///
/// ### Rules
/// - `apply` returns a cold [`Invocation`]; the start attempt happens on its first poll.
/// - A start attempt while executing, or while the gate is closed, fails with
///   [`ActionError::Disabled`](crate::ActionError::Disabled) and publishes on
///   [`Action::disabled_errors`]; the factory is not called.
/// - Every stream accessor returns a fresh receiver of a hot broadcast stream.
pub struct Action<I, O, E> {
    core: Arc<Core<I, O, E>>,
}

impl<I, O, E> Clone for Action<I, O, E> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<I, O, E> fmt::Debug for Action<I, O, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.core.name)
            .field("executing", &*self.core.executing.borrow())
            .finish()
    }
}

impl<I, O, E> Action<I, O, E>
where
    I: Send + 'static,
    O: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Canonical constructor: the factory also receives the execution's context.
    pub fn with_context<T, F>(config: Config, gate: Gate<T>, factory: F) -> Self
    where
        T: 'static,
        F: Fn(T, I, &ExecutionContext) -> Work<O, E> + Send + Sync + 'static,
    {
        Self {
            core: Core::new(&config, gate, factory),
        }
    }

    /// Builds an action from a gate and a `(state, input)` factory.
    pub fn with_gate<T, F>(config: Config, gate: Gate<T>, factory: F) -> Self
    where
        T: 'static,
        F: Fn(T, I) -> Work<O, E> + Send + Sync + 'static,
    {
        Self::with_context(config, gate, move |state, input, _ctx: &ExecutionContext| {
            factory(state, input)
        })
    }

    /// Explicit state and enabling predicate.
    pub fn new<S, P, F>(state: Property<S>, is_enabled: P, factory: F) -> Self
    where
        S: Clone + Send + Sync + 'static,
        P: Fn(&S) -> bool + Send + Sync + 'static,
        F: Fn(S, I) -> Work<O, E> + Send + Sync + 'static,
    {
        Self::with_gate(Config::default(), Gate::new(state, is_enabled), factory)
    }

    /// Always enabled, no state.
    pub fn from_factory<F>(factory: F) -> Self
    where
        F: Fn(I) -> Work<O, E> + Send + Sync + 'static,
    {
        Self::with_gate(Config::default(), Gate::open(), move |(), input| {
            factory(input)
        })
    }

    /// Creates a cold invocation that will try to start with `input` when first polled.
    pub fn apply(&self, input: I) -> Invocation<I, O, E> {
        Invocation::new(Arc::clone(&self.core), input)
    }
}

impl<I, O: Clone, E: Clone> Action<I, O, E> {
    /// Configured action name.
    pub fn name(&self) -> &str {
        &self.core.name
    }

    /// Lifecycle events of every execution.
    pub fn events(&self) -> broadcast::Receiver<Event<O, E>> {
        self.core.buses.events.subscribe()
    }

    /// Values of every execution.
    pub fn values(&self) -> broadcast::Receiver<O> {
        self.core.buses.values.subscribe()
    }

    /// Errors of every failed execution.
    pub fn errors(&self) -> broadcast::Receiver<E> {
        self.core.buses.errors.subscribe()
    }

    /// One item per denied start attempt.
    pub fn disabled_errors(&self) -> broadcast::Receiver<()> {
        self.core.buses.disabled.subscribe()
    }

    /// One item per execution that completed on its own.
    pub fn completed(&self) -> broadcast::Receiver<()> {
        self.core.buses.completed.subscribe()
    }

    /// Whether an execution is current.
    pub fn is_executing(&self) -> Property<bool> {
        Property::from(self.core.executing.subscribe())
    }

    /// Whether a start attempt would currently succeed (`gate open && !executing`).
    pub fn is_enabled(&self) -> Property<bool> {
        self.core.refresh_enabled();
        Property::from(self.core.enabled.subscribe())
    }

    /// Registers a callback fired synchronously on every successful start.
    pub(crate) fn on_started(&self, callback: impl Fn() + Send + Sync + 'static) -> Listener {
        self.core.on_started(callback)
    }

    #[cfg(test)]
    pub(crate) fn started_listeners(&self) -> usize {
        self.core.started_listeners()
    }
}

impl<I, O, E> Action<I, O, E>
where
    O: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Fans every lifecycle event out to `subscribers`.
    ///
    /// Spawns the subscriber workers and a listener on the current tokio runtime.
    /// Once the action is dropped, the listener drains the subscriber queues and
    /// the returned handle completes.
    pub fn observe(&self, subscribers: Vec<Arc<dyn Subscribe<O, E>>>) -> JoinHandle<()> {
        SubscriberSet::new(subscribers).listen(&self.core.buses.events)
    }
}

impl<O, E> Action<(), O, E>
where
    O: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Zero-argument `apply` for unit-input actions.
    pub fn fire(&self) -> Invocation<(), O, E> {
        self.apply(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ActionError;
    use crate::state::MutableProperty;
    use crate::work::Work;
    use crate::Outcome;
    use futures::{FutureExt, StreamExt};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn drain<T: Clone>(rx: &mut broadcast::Receiver<T>) -> Vec<T> {
        let mut out = Vec::new();
        while let Ok(item) = rx.try_recv() {
            out.push(item);
        }
        out
    }

    #[test]
    fn invocation_is_cold_until_polled() {
        let calls = Arc::new(AtomicUsize::new(0));
        let action: Action<(), u8, ()> = {
            let calls = Arc::clone(&calls);
            Action::from_factory(move |()| {
                calls.fetch_add(1, Ordering::SeqCst);
                Work::values([1])
            })
        };

        let invocation = action.fire();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        drop(invocation);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn synchronous_work_completes_in_one_poll() {
        let action: Action<u8, u8, ()> = Action::from_factory(|n| Work::values([n, n + 1]));
        let mut events = action.events();
        let mut values = action.values();
        let mut completed = action.completed();

        let outcome = action.apply(1).run().now_or_never();
        assert_eq!(outcome, Some(Ok(Outcome::Completed { values: vec![1, 2] })));
        assert_eq!(
            drain(&mut events),
            vec![Event::Value(1), Event::Value(2), Event::Completed]
        );
        assert_eq!(drain(&mut values), vec![1, 2]);
        assert_eq!(drain(&mut completed).len(), 1);
        assert!(!action.is_executing().get());
    }

    #[test]
    fn producer_error_reaches_handle_and_errors_stream() {
        let action: Action<(), u8, &'static str> =
            Action::from_factory(|()| Work::failed("boom"));
        let mut errors = action.errors();
        let mut events = action.events();

        let res = action.fire().run().now_or_never();
        assert_eq!(res, Some(Err(ActionError::Producer("boom"))));
        assert_eq!(drain(&mut errors), vec!["boom"]);
        assert_eq!(drain(&mut events), vec![Event::Failed("boom")]);
    }

    #[test]
    fn second_apply_is_denied_while_executing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let action: Action<(), (), ()> = {
            let calls = Arc::clone(&calls);
            Action::from_factory(move |()| {
                calls.fetch_add(1, Ordering::SeqCst);
                Work::never()
            })
        };
        let mut disabled = action.disabled_errors();

        let mut first = action.fire();
        assert!(first.next().now_or_never().is_none());
        assert!(action.is_executing().get());
        assert!(!action.is_enabled().get());

        let second = action.fire().run().now_or_never();
        assert_eq!(second, Some(Err(ActionError::Disabled)));
        assert_eq!(drain(&mut disabled).len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn closed_gate_denies_without_calling_factory() {
        let flag = MutableProperty::new(false);
        let calls = Arc::new(AtomicUsize::new(0));
        let action: Action<(), (), ()> = {
            let calls = Arc::clone(&calls);
            Action::with_gate(Config::named("gated"), Gate::flag(flag.property()), move |(), ()| {
                calls.fetch_add(1, Ordering::SeqCst);
                Work::empty()
            })
        };
        let mut disabled = action.disabled_errors();

        assert!(!action.is_enabled().get());
        assert_eq!(action.fire().run().now_or_never(), Some(Err(ActionError::Disabled)));
        assert_eq!(drain(&mut disabled).len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!action.is_executing().get());

        flag.set(true);
        assert!(action.is_enabled().get());
        assert!(matches!(
            action.fire().run().now_or_never(),
            Some(Ok(Outcome::Completed { .. }))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_started_invocation_interrupts_it() {
        let action: Action<(), (), ()> = Action::from_factory(|()| Work::never());
        let mut events = action.events();

        let mut invocation = action.fire();
        assert!(invocation.next().now_or_never().is_none());
        assert_eq!(invocation.execution_id(), Some(1));
        drop(invocation);

        assert_eq!(drain(&mut events), vec![Event::Interrupted]);
        assert!(!action.is_executing().get());
        assert!(action.is_enabled().get());
    }

    #[test]
    fn context_interrupt_terminates_execution_once() {
        let contexts: Arc<std::sync::Mutex<Vec<ExecutionContext>>> = Arc::default();
        let action: Action<(), u8, ()> = {
            let contexts = Arc::clone(&contexts);
            Action::with_context(Config::default(), Gate::open(), move |(), (), ctx| {
                contexts.lock().unwrap().push(ctx.clone());
                Work::never()
            })
        };
        let mut events = action.events();

        let mut invocation = action.fire();
        assert!(invocation.next().now_or_never().is_none());

        let ctx = contexts.lock().unwrap().pop().unwrap();
        assert!(ctx.interrupt());
        assert!(!ctx.interrupt());
        assert!(ctx.is_finished());

        let next = invocation.next().now_or_never().flatten();
        assert_eq!(next, Some(Event::Interrupted));
        assert_eq!(invocation.next().now_or_never().flatten(), None);
        assert_eq!(drain(&mut events), vec![Event::Interrupted]);
    }

    #[tokio::test]
    async fn gate_changes_refresh_enabled_property() {
        let flag = MutableProperty::new(false);
        let action: Action<(), (), ()> =
            Action::with_gate(Config::default(), Gate::flag(flag.property()), |(), ()| {
                Work::empty()
            });
        let mut enabled = action.is_enabled();
        assert!(!enabled.get());

        flag.set(true);
        enabled.wait_for(|on| *on).await.unwrap();
        assert!(enabled.get());
    }

    #[tokio::test]
    async fn start_spawns_on_runtime() {
        let action: Action<u32, u32, ()> =
            Action::from_factory(|n| Work::from_future(async move { Ok(n + 1) }));
        let res = action.apply(1).start().await.unwrap();
        assert_eq!(res, Ok(Outcome::Completed { values: vec![2] }));
    }

    #[tokio::test]
    async fn observe_delivers_every_event_until_action_dropped() {
        #[derive(Default)]
        struct Labels(std::sync::Mutex<Vec<&'static str>>);

        #[async_trait::async_trait]
        impl Subscribe<u8, ()> for Labels {
            async fn on_event(&self, event: &Event<u8, ()>) {
                self.0.lock().unwrap().push(event.as_label());
            }
        }

        let labels = Arc::new(Labels::default());
        let action: Action<u8, u8, ()> = Action::from_factory(|n| Work::values([n]));
        let observer = action.observe(vec![Arc::clone(&labels) as Arc<dyn Subscribe<u8, ()>>]);

        action.apply(4).run().await.unwrap();
        drop(action);
        observer.await.unwrap();

        assert_eq!(*labels.0.lock().unwrap(), vec!["value", "completed"]);
    }

    #[tokio::test]
    async fn dropped_action_stops_following_its_gate() {
        let flag = MutableProperty::new(true);
        let action: Action<(), (), ()> =
            Action::with_gate(Config::default(), Gate::flag(flag.property()), |(), ()| {
                Work::empty()
            });
        assert!(flag.receiver_count() > 0);

        drop(action);
        for _ in 0..16 {
            if flag.receiver_count() == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(flag.receiver_count(), 0);
    }

    #[test]
    fn interrupt_inside_factory_skips_started_notification() {
        let action: Action<(), u8, ()> =
            Action::with_context(Config::default(), Gate::open(), |(), (), ctx| {
                assert!(ctx.interrupt());
                Work::values([1])
            });
        let starts = Arc::new(AtomicUsize::new(0));
        let _listener = {
            let starts = Arc::clone(&starts);
            action.on_started(move || {
                starts.fetch_add(1, Ordering::SeqCst);
            })
        };
        let mut events = action.events();

        let res = action.fire().run().now_or_never();
        assert_eq!(res, Some(Ok(Outcome::Interrupted { values: vec![] })));
        assert_eq!(starts.load(Ordering::SeqCst), 0);
        assert_eq!(drain(&mut events), vec![Event::Interrupted]);
        assert!(!action.is_executing().get());
        assert!(action.is_enabled().get());
    }
}
