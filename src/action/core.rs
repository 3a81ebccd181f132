//! # Action core: execution slot and lifecycle publishing.
//!
//! [`Core`] is the shared state behind an [`Action`](crate::Action) and every
//! [`Invocation`](crate::Invocation) it hands out.
//!
//! ## Rules
//! - **Single slot**: at most one [`Execution`] is current; a start attempt
//!   while the slot is taken is denied, never queued.
//! - **Exactly once**: the terminal event of an execution is published by
//!   whichever of `finish` callers gets to its `finished` flag first; later
//!   callers get `false` and publish nothing.
//! - **No late values**: values are published while holding the same flag, so
//!   nothing is published for an execution after its terminal event.
//! - The gate, user factories and trigger callbacks run with no lock held.
//! - Lock order is slot, then `finished`; `finish` never holds both.
//! - Dropping the core stops its gate follower.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::context::ExecutionContext;
use super::lock;
use super::trigger::{Listener, Trigger};
use crate::config::Config;
use crate::error::ActionError;
use crate::events::{Bus, Event};
use crate::state::Gate;
use crate::work::Work;

type Launch<I, O, E> = dyn Fn(I, &ExecutionContext) -> Option<Work<O, E>> + Send + Sync;

/// Record of one started (or starting) execution.
pub(crate) struct Execution {
    pub(crate) id: u64,
    launched: AtomicBool,
    finished: Mutex<bool>,
    token: CancellationToken,
}

impl Execution {
    fn new(id: u64) -> Self {
        Self {
            id,
            launched: AtomicBool::new(false),
            finished: Mutex::new(false),
            token: CancellationToken::new(),
        }
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// Lifecycle buses of one action.
pub(crate) struct Buses<O, E> {
    pub(crate) events: Bus<Event<O, E>>,
    pub(crate) values: Bus<O>,
    pub(crate) errors: Bus<E>,
    pub(crate) completed: Bus<()>,
    pub(crate) disabled: Bus<()>,
}

impl<O: Clone, E: Clone> Buses<O, E> {
    fn new(capacity: usize) -> Self {
        Self {
            events: Bus::new(capacity),
            values: Bus::new(capacity),
            errors: Bus::new(capacity),
            completed: Bus::new(capacity),
            disabled: Bus::new(capacity),
        }
    }
}

/// Shared state of an action.
pub(crate) struct Core<I, O, E> {
    pub(crate) name: Arc<str>,
    gate_open: Box<dyn Fn() -> bool + Send + Sync>,
    launch: Box<Launch<I, O, E>>,
    current: Mutex<Option<Arc<Execution>>>,
    next_id: AtomicU64,
    pub(crate) executing: watch::Sender<bool>,
    pub(crate) enabled: watch::Sender<bool>,
    started: Arc<Trigger>,
    pub(crate) buses: Buses<O, E>,
    /// Stops the gate follower when the core is dropped.
    watcher: CancellationToken,
}

impl<I, O, E> Drop for Core<I, O, E> {
    fn drop(&mut self) {
        self.watcher.cancel();
    }
}

impl<I, O, E> Core<I, O, E>
where
    I: Send + 'static,
    O: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Builds the core and, inside a tokio runtime, starts following gate changes.
    pub(crate) fn new<T, F>(config: &Config, gate: Gate<T>, factory: F) -> Arc<Self>
    where
        T: 'static,
        F: Fn(T, I, &ExecutionContext) -> Work<O, E> + Send + Sync + 'static,
    {
        let gate_open = {
            let gate = gate.clone();
            move || gate.is_open()
        };
        let launch = {
            let gate = gate.clone();
            move |input: I, ctx: &ExecutionContext| {
                gate.snapshot().map(|state| factory(state, input, ctx))
            }
        };

        let initially_enabled = gate.is_open();
        let (executing, _) = watch::channel(false);
        let (enabled, _) = watch::channel(initially_enabled);

        let core = Arc::new(Self {
            name: Arc::from(config.name.as_ref()),
            gate_open: Box::new(gate_open),
            launch: Box::new(launch),
            current: Mutex::new(None),
            next_id: AtomicU64::new(1),
            executing,
            enabled,
            started: Trigger::new(),
            buses: Buses::new(config.bus_capacity_clamped()),
            watcher: CancellationToken::new(),
        });

        let weak = Arc::downgrade(&core);
        gate.watch(core.watcher.clone(), move || match weak.upgrade() {
            Some(core) => {
                core.refresh_enabled();
                true
            }
            None => false,
        });

        core
    }

    /// Attempts to take the slot and create the unit of work.
    pub(crate) fn try_start(
        self: &Arc<Self>,
        input: I,
    ) -> Result<(Arc<Execution>, Work<O, E>), ActionError<E>> {
        let exec = {
            let mut current = lock(&self.current);
            if current.is_some() {
                drop(current);
                return Err(self.deny("busy"));
            }
            let exec = Arc::new(Execution::new(self.next_id.fetch_add(1, Ordering::Relaxed)));
            *current = Some(Arc::clone(&exec));
            exec
        };

        let ctx = self.context(&exec);
        let Some(work) = (self.launch)(input, &ctx) else {
            self.release(&exec);
            return Err(self.deny("gate_closed"));
        };

        let launched = {
            let current = lock(&self.current);
            let still_current =
                current.as_ref().is_some_and(|c| c.id == exec.id) && !*lock(&exec.finished);
            if still_current {
                exec.launched.store(true, Ordering::Release);
                self.sync_executing(&current);
            }
            still_current
        };
        self.refresh_enabled();
        if !launched {
            // Interrupted from inside the factory; the terminal event is already out.
            debug!(action = %self.name, execution = exec.id, "execution finished before start");
            return Ok((exec, work));
        }
        debug!(action = %self.name, execution = exec.id, "execution started");

        self.started.fire();
        Ok((exec, work))
    }

    /// Builds the context handed to the factory of `exec`.
    fn context(self: &Arc<Self>, exec: &Arc<Execution>) -> ExecutionContext {
        let weak = Arc::downgrade(self);
        let target = Arc::clone(exec);
        ExecutionContext::new(exec.id, exec.token.clone(), move || {
            weak.upgrade()
                .is_some_and(|core| core.finish(&target, Event::Interrupted))
        })
    }

    fn deny(&self, reason: &'static str) -> ActionError<E> {
        debug!(action = %self.name, reason, "start denied");
        self.buses.disabled.publish(());
        ActionError::Disabled
    }
}

impl<I, O: Clone, E: Clone> Core<I, O, E> {
    /// Publishes a value unless the execution already terminated.
    pub(crate) fn emit_value(&self, exec: &Execution, value: O) -> bool {
        let finished = lock(&exec.finished);
        if *finished {
            return false;
        }
        trace!(action = %self.name, execution = exec.id, "value");
        self.buses.values.publish(value.clone());
        self.buses.events.publish(Event::Value(value));
        true
    }

    /// Publishes `terminal` and frees the slot, unless the execution already terminated.
    pub(crate) fn finish(&self, exec: &Execution, terminal: Event<O, E>) -> bool {
        debug_assert!(terminal.is_terminal());
        {
            let mut finished = lock(&exec.finished);
            if *finished {
                return false;
            }
            *finished = true;

            let outcome = terminal.as_label();
            match &terminal {
                Event::Failed(err) => self.buses.errors.publish(err.clone()),
                Event::Completed => self.buses.completed.publish(()),
                Event::Value(_) | Event::Interrupted => {}
            }
            self.buses.events.publish(terminal);
            debug!(action = %self.name, execution = exec.id, outcome, "execution finished");
        }

        self.release(exec);
        exec.token.cancel();
        true
    }
}

impl<I, O, E> Core<I, O, E> {
    /// Frees the slot if `exec` holds it.
    fn release(&self, exec: &Execution) {
        {
            let mut current = lock(&self.current);
            if current.as_ref().is_some_and(|c| c.id == exec.id) {
                *current = None;
            }
            self.sync_executing(&current);
        }
        self.refresh_enabled();
    }

    /// Mirrors the slot into the `executing` cell; call with the slot locked.
    fn sync_executing(&self, current: &Option<Arc<Execution>>) {
        let executing = current
            .as_ref()
            .is_some_and(|c| c.launched.load(Ordering::Acquire));
        self.executing.send_if_modified(|v| replace_if_changed(v, executing));
    }

    /// Recomputes `enabled = gate open && !executing`.
    pub(crate) fn refresh_enabled(&self) {
        let executing = *self.executing.borrow();
        let enabled = !executing && (self.gate_open)();
        self.enabled.send_if_modified(|v| replace_if_changed(v, enabled));
    }

    /// Registers a callback fired on every successful start.
    pub(crate) fn on_started(&self, callback: impl Fn() + Send + Sync + 'static) -> Listener {
        self.started.listen(callback)
    }

    #[cfg(test)]
    pub(crate) fn started_listeners(&self) -> usize {
        self.started.len()
    }
}

fn replace_if_changed(slot: &mut bool, value: bool) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}
