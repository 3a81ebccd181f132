//! # Gate: the "may I start" signal of an action.
//!
//! A [`Gate<T>`] is the canonical pair of
//! - an **enabling predicate** over some external state, and
//! - the **state value** (`T`) handed to the factory when the gate is open.
//!
//! Every constructor shape of [`Action`](crate::Action) and
//! [`InterruptibleAction`](crate::InterruptibleAction) is a thin adapter that
//! builds one of these.
//!
//! ## Rules
//! - [`Gate::snapshot`] reads the state **once**: the predicate and the value
//!   passed on come from the same read.
//! - A closed gate never yields a value, so a factory behind it is never called.

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::Property;

type Snapshot<T> = dyn Fn() -> Option<T> + Send + Sync;
type Check = dyn Fn() -> bool + Send + Sync;
type Watch = dyn Fn(CancellationToken, Box<dyn Fn() -> bool + Send + 'static>) + Send + Sync;

/// Enabling predicate plus state source, with the state type erased.
pub struct Gate<T> {
    snapshot: Arc<Snapshot<T>>,
    check: Arc<Check>,
    watch: Arc<Watch>,
}

impl<T> Clone for Gate<T> {
    fn clone(&self) -> Self {
        Self {
            snapshot: Arc::clone(&self.snapshot),
            check: Arc::clone(&self.check),
            watch: Arc::clone(&self.watch),
        }
    }
}

impl<T: 'static> fmt::Debug for Gate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gate")
            .field("open", &self.is_open())
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> Gate<T> {
    /// Full form: explicit state and predicate; the factory receives the state.
    pub fn new(
        state: Property<T>,
        is_enabled: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self::project(state, move |s: &T| is_enabled(s).then(|| s.clone()))
    }

    /// State only: always enabled; the factory receives the state.
    pub fn with_state(state: Property<T>) -> Self {
        Self::new(state, |_| true)
    }

    /// Unwrapping form: enabled while the state is `Some`; the factory receives the inner value.
    pub fn unwrapping(state: Property<Option<T>>) -> Self {
        Gate::project(state, |s: &Option<T>| s.clone())
    }
}

impl Gate<()> {
    /// Always enabled, no state.
    pub fn open() -> Self {
        Self::with_state(Property::constant(()))
    }

    /// Boolean state doubling as the predicate.
    pub fn flag(enabled: Property<bool>) -> Self {
        Gate::project(enabled, |on: &bool| on.then_some(()))
    }
}

impl<T: 'static> Gate<T> {
    /// Most general form: `project` returns `Some(value)` when enabled.
    pub fn project<S>(
        state: Property<S>,
        project: impl Fn(&S) -> Option<T> + Send + Sync + 'static,
    ) -> Self
    where
        S: Send + Sync + 'static,
    {
        let project = Arc::new(project);

        let snapshot = {
            let state = state.clone();
            let project = Arc::clone(&project);
            move || state.with(|s| project(s))
        };
        let check = {
            let state = state.clone();
            let project = Arc::clone(&project);
            move || state.with(|s| project(s).is_some())
        };
        let watch = move |stop: CancellationToken, on_change: Box<dyn Fn() -> bool + Send + 'static>| {
            state.watch(stop, on_change);
        };

        Self {
            snapshot: Arc::new(snapshot),
            check: Arc::new(check),
            watch: Arc::new(watch),
        }
    }

    /// True if a start attempt would currently pass the predicate.
    pub fn is_open(&self) -> bool {
        (self.check)()
    }

    /// Reads the state once; `Some` carries the factory argument.
    pub fn snapshot(&self) -> Option<T> {
        (self.snapshot)()
    }

    /// Calls `on_change` whenever the underlying state changes, until it
    /// returns `false` or `stop` is cancelled.
    pub(crate) fn watch(&self, stop: CancellationToken, on_change: impl Fn() -> bool + Send + 'static) {
        (self.watch)(stop, Box::new(on_change));
    }
}
