//! # `InterruptibleAction`: an action that can be cancelled by another action.

use std::convert::Infallible;
use std::fmt;
use std::sync::{Arc, Weak};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

use super::binding::BindingTarget;
use crate::action::{Action, ExecutionContext, Invocation};
use crate::config::Config;
use crate::events::Event;
use crate::state::{Gate, Property};
use crate::subscribers::Subscribe;
use crate::work::Work;

/// The two actions behind an [`InterruptibleAction`].
pub(crate) struct Shared<I, O, E> {
    pub(crate) interrupt: Action<(), (), Infallible>,
    pub(crate) inner: Action<I, O, E>,
}

/// Action whose running execution can be cancelled through [`interrupt`](Self::interrupt).
///
/// All execution state lives in the inner action; this type only wires the
/// two actions together and re-exports the inner action's streams and flags.
/// Events of the interrupt action itself never appear on [`events`](Self::events).
///
/// Cloning is cheap; clones share both actions.
///
/// ## Example
/// ```rust
/// use interruptible_action::{Event, InterruptibleAction, Work};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let search: InterruptibleAction<String, String, ()> =
///     InterruptibleAction::from_factory(|_query| Work::never());
/// let mut events = search.events();
///
/// let running = search.apply("rust".into()).start();
/// tokio::task::yield_now().await;
///
/// search.interrupt().fire().run().await.unwrap();
/// assert_eq!(events.recv().await.ok(), Some(Event::Interrupted));
/// assert!(running.await.unwrap().unwrap().is_interrupted());
/// # }
/// ```
pub struct InterruptibleAction<I, O, E> {
    shared: Arc<Shared<I, O, E>>,
}

impl<I, O, E> Clone for InterruptibleAction<I, O, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<I, O, E> fmt::Debug for InterruptibleAction<I, O, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterruptibleAction")
            .field("inner", &self.shared.inner)
            .field("interrupt", &self.shared.interrupt)
            .finish()
    }
}

impl<I, O, E> InterruptibleAction<I, O, E>
where
    I: Send + 'static,
    O: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Canonical constructor every other shape delegates to.
    ///
    /// Both actions share `gate`; the interrupt action is named `"<name>.interrupt"`.
    pub fn with_gate<T, F>(config: Config, gate: Gate<T>, factory: F) -> Self
    where
        T: 'static,
        F: Fn(T, I) -> Work<O, E> + Send + Sync + 'static,
    {
        let shared = Arc::new_cyclic(|this: &Weak<Shared<I, O, E>>| {
            let this = this.clone();
            let interrupt =
                Action::with_gate(config.interrupt(), gate.clone(), |_: T, ()| Work::empty());
            let inner = Action::with_context(config, gate, move |state, input, ctx| {
                let work = factory(state, input);
                match this.upgrade() {
                    Some(shared) => work.holding(shared.interrupt_listener(ctx)),
                    None => work,
                }
            });
            Shared { interrupt, inner }
        });
        Self { shared }
    }

    /// Full form: explicit state and enabling predicate.
    pub fn new<S, P, F>(state: Property<S>, is_enabled: P, factory: F) -> Self
    where
        S: Clone + Send + Sync + 'static,
        P: Fn(&S) -> bool + Send + Sync + 'static,
        F: Fn(S, I) -> Work<O, E> + Send + Sync + 'static,
    {
        Self::with_gate(Config::default(), Gate::new(state, is_enabled), factory)
    }

    /// State only; always enabled.
    pub fn with_state<S, F>(state: Property<S>, factory: F) -> Self
    where
        S: Clone + Send + Sync + 'static,
        F: Fn(S, I) -> Work<O, E> + Send + Sync + 'static,
    {
        Self::with_gate(Config::default(), Gate::with_state(state), factory)
    }

    /// Boolean state doubling as the predicate.
    pub fn enabled_if<F>(enabled: Property<bool>, factory: F) -> Self
    where
        F: Fn(I) -> Work<O, E> + Send + Sync + 'static,
    {
        Self::with_gate(Config::default(), Gate::flag(enabled), move |(), input| {
            factory(input)
        })
    }

    /// Enabled while the state is `Some`; the factory gets the unwrapped value.
    ///
    /// The factory is never called while the state is `None`.
    pub fn unwrapping<S, F>(state: Property<Option<S>>, factory: F) -> Self
    where
        S: Clone + Send + Sync + 'static,
        F: Fn(S, I) -> Work<O, E> + Send + Sync + 'static,
    {
        Self::with_gate(Config::default(), Gate::unwrapping(state), factory)
    }

    /// No state; always enabled.
    pub fn from_factory<F>(factory: F) -> Self
    where
        F: Fn(I) -> Work<O, E> + Send + Sync + 'static,
    {
        Self::with_gate(Config::default(), Gate::open(), move |(), input| {
            factory(input)
        })
    }

    /// Creates a cold invocation of the inner action.
    ///
    /// This never interrupts anything: while an execution is running, the
    /// returned invocation fails with `ActionError::Disabled`.
    pub fn apply(&self, input: I) -> Invocation<I, O, E> {
        self.shared.inner.apply(input)
    }
}

impl<I, O: Clone, E: Clone> Shared<I, O, E> {
    /// Guard that interrupts the execution behind `ctx` whenever the
    /// interrupt action starts, until dropped.
    fn interrupt_listener(&self, ctx: &ExecutionContext) -> crate::action::Listener {
        let ctx = ctx.clone();
        let action = Arc::<str>::from(self.inner.name());
        self.interrupt.on_started(move || {
            if ctx.interrupt() {
                debug!(action = %action, execution = ctx.id(), "execution interrupted");
            }
        })
    }
}

impl<I, O: Clone, E: Clone> InterruptibleAction<I, O, E> {
    /// The cancellation action; `interrupt().fire()` requests cancellation.
    pub fn interrupt(&self) -> &Action<(), (), Infallible> {
        &self.shared.interrupt
    }

    /// Name of the inner action.
    pub fn name(&self) -> &str {
        self.shared.inner.name()
    }

    /// Lifecycle events of inner executions.
    pub fn events(&self) -> broadcast::Receiver<Event<O, E>> {
        self.shared.inner.events()
    }

    pub fn values(&self) -> broadcast::Receiver<O> {
        self.shared.inner.values()
    }

    pub fn errors(&self) -> broadcast::Receiver<E> {
        self.shared.inner.errors()
    }

    /// One item per denied start attempt of the inner action.
    pub fn disabled_errors(&self) -> broadcast::Receiver<()> {
        self.shared.inner.disabled_errors()
    }

    pub fn completed(&self) -> broadcast::Receiver<()> {
        self.shared.inner.completed()
    }

    pub fn is_executing(&self) -> Property<bool> {
        self.shared.inner.is_executing()
    }

    pub fn is_enabled(&self) -> Property<bool> {
        self.shared.inner.is_enabled()
    }

    /// Write-only sink restarting the action with every input it receives.
    ///
    /// The target holds a weak reference; it does not keep the action alive.
    pub fn binding_target(&self) -> BindingTarget<I, O, E> {
        BindingTarget::new(Arc::downgrade(&self.shared))
    }

    #[cfg(test)]
    pub(crate) fn interrupt_listeners(&self) -> usize {
        self.shared.interrupt.started_listeners()
    }
}

impl<I, O, E> InterruptibleAction<I, O, E>
where
    O: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Fans every lifecycle event of the inner action out to `subscribers`.
    ///
    /// See [`Action::observe`].
    pub fn observe(&self, subscribers: Vec<Arc<dyn Subscribe<O, E>>>) -> JoinHandle<()> {
        self.shared.inner.observe(subscribers)
    }
}

impl<O, E> InterruptibleAction<(), O, E>
where
    O: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Zero-argument `apply`.
    pub fn fire(&self) -> Invocation<(), O, E> {
        self.apply(())
    }

    /// Always enabled, no state, no input.
    pub fn from_fn<F>(factory: F) -> Self
    where
        F: Fn() -> Work<O, E> + Send + Sync + 'static,
    {
        Self::from_factory(move |()| factory())
    }

    /// State only, no input.
    pub fn from_state_fn<S, F>(state: Property<S>, factory: F) -> Self
    where
        S: Clone + Send + Sync + 'static,
        F: Fn(S) -> Work<O, E> + Send + Sync + 'static,
    {
        Self::with_state(state, move |s, ()| factory(s))
    }
}
