//! # Invocation: the cold handle returned by `apply`.
//!
//! An [`Invocation`] does nothing until it is polled. Its first poll is the
//! start attempt; after that it forwards the lifecycle of the unit of work it
//! created.
//!
//! ## Event flow
//! ```text
//! denied:       Failed(ActionError::Disabled)
//! started:      Value* ─► Completed
//!                      ─► Failed(ActionError::Producer(e))
//!                      ─► Interrupted
//! ```
//!
//! ## Rules
//! - Always yields **exactly one** terminal event, then `None`.
//! - After an interrupt, the wrapped work is dropped on the next poll and
//!   nothing it produced later is forwarded.
//! - Dropping a started, unfinished invocation interrupts its execution.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use tokio::task::JoinHandle;
use tokio_util::sync::WaitForCancellationFutureOwned;

use super::core::{Core, Execution};
use crate::error::ActionError;
use crate::events::Event;
use crate::work::Work;

/// Successful end of an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<O> {
    /// The work finished on its own.
    Completed {
        /// Values forwarded before completion.
        values: Vec<O>,
    },
    /// The work was interrupted.
    Interrupted {
        /// Values forwarded before the interrupt.
        values: Vec<O>,
    },
}

impl<O> Outcome<O> {
    /// Values forwarded before the terminal event.
    pub fn values(&self) -> &[O] {
        match self {
            Outcome::Completed { values } | Outcome::Interrupted { values } => values,
        }
    }

    pub fn into_values(self) -> Vec<O> {
        match self {
            Outcome::Completed { values } | Outcome::Interrupted { values } => values,
        }
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, Outcome::Interrupted { .. })
    }
}

/// A started execution being driven by an invocation.
struct Running<I, O: Clone, E: Clone> {
    core: Arc<Core<I, O, E>>,
    exec: Arc<Execution>,
    work: Work<O, E>,
    cancelled: Pin<Box<WaitForCancellationFutureOwned>>,
}

impl<I, O: Clone, E: Clone> Drop for Running<I, O, E> {
    fn drop(&mut self) {
        self.core.finish(&self.exec, Event::Interrupted);
    }
}

enum Stage<I, O: Clone, E: Clone> {
    Idle { core: Arc<Core<I, O, E>>, input: I },
    Running(Running<I, O, E>),
    Denied(ActionError<E>),
    Done,
}

impl<I, O, E> Stage<I, O, E>
where
    I: Send + 'static,
    O: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn launch(core: Arc<Core<I, O, E>>, input: I) -> Self {
        match core.try_start(input) {
            Ok((exec, work)) => {
                let cancelled = Box::pin(exec.token().clone().cancelled_owned());
                Stage::Running(Running {
                    core,
                    exec,
                    work,
                    cancelled,
                })
            }
            Err(err) => Stage::Denied(err),
        }
    }
}

/// Cold, lazily-started handle for one start attempt of an action.
///
/// Poll it as a [`Stream`], await [`Invocation::run`], or hand it to the
/// runtime with [`Invocation::start`].
#[must_use = "an invocation does nothing until it is polled, run or started"]
pub struct Invocation<I, O: Clone, E: Clone> {
    stage: Stage<I, O, E>,
}

impl<I, O: Clone, E: Clone> Unpin for Invocation<I, O, E> {}

impl<I, O: Clone, E: Clone> fmt::Debug for Invocation<I, O, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("Invocation");
        match &self.stage {
            Stage::Idle { .. } => d.field("stage", &"idle"),
            Stage::Running(run) => d.field("stage", &"running").field("execution", &run.exec.id),
            Stage::Denied(_) => d.field("stage", &"denied"),
            Stage::Done => d.field("stage", &"done"),
        };
        d.finish()
    }
}

impl<I, O: Clone, E: Clone> Invocation<I, O, E> {
    pub(crate) fn new(core: Arc<Core<I, O, E>>, input: I) -> Self {
        Self {
            stage: Stage::Idle { core, input },
        }
    }

    /// Id of the started execution, once the invocation is running.
    pub fn execution_id(&self) -> Option<u64> {
        match &self.stage {
            Stage::Running(run) => Some(run.exec.id),
            Stage::Idle { .. } | Stage::Denied(_) | Stage::Done => None,
        }
    }
}

impl<I, O, E> Invocation<I, O, E>
where
    I: Send + 'static,
    O: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Performs the start attempt now instead of on the first poll.
    ///
    /// Used where the start must be ordered with respect to the caller, e.g.
    /// before a spawned task gets its first poll.
    pub(crate) fn begin(mut self) -> Self {
        self.stage = match std::mem::replace(&mut self.stage, Stage::Done) {
            Stage::Idle { core, input } => Stage::launch(core, input),
            other => other,
        };
        self
    }

    /// Drives the invocation to its terminal event.
    ///
    /// - `Ok(Outcome::Completed)` / `Ok(Outcome::Interrupted)` carry the values seen.
    /// - `Err(ActionError::Disabled)` if the start attempt was denied.
    /// - `Err(ActionError::Producer(e))` if the work failed.
    pub async fn run(mut self) -> Result<Outcome<O>, ActionError<E>> {
        let mut values = Vec::new();
        while let Some(ev) = self.next().await {
            match ev {
                Event::Value(v) => values.push(v),
                Event::Failed(err) => return Err(err),
                Event::Completed => return Ok(Outcome::Completed { values }),
                Event::Interrupted => return Ok(Outcome::Interrupted { values }),
            }
        }
        Ok(Outcome::Completed { values })
    }

    /// Spawns [`Invocation::run`] on the current tokio runtime.
    ///
    /// # Panics
    /// Panics if called outside of a tokio runtime, like [`tokio::spawn`].
    pub fn start(self) -> JoinHandle<Result<Outcome<O>, ActionError<E>>> {
        tokio::spawn(self.run())
    }
}

impl<I, O, E> Stream for Invocation<I, O, E>
where
    I: Send + 'static,
    O: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    type Item = Event<O, ActionError<E>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match std::mem::replace(&mut this.stage, Stage::Done) {
                Stage::Idle { core, input } => this.stage = Stage::launch(core, input),
                Stage::Denied(err) => return Poll::Ready(Some(Event::Failed(err))),
                Stage::Running(mut run) => {
                    if run.cancelled.as_mut().poll(cx).is_ready() {
                        return Poll::Ready(Some(Event::Interrupted));
                    }
                    match run.work.poll_next_unpin(cx) {
                        Poll::Pending => {
                            this.stage = Stage::Running(run);
                            return Poll::Pending;
                        }
                        Poll::Ready(Some(Event::Value(v))) => {
                            if !run.core.emit_value(&run.exec, v.clone()) {
                                return Poll::Ready(Some(Event::Interrupted));
                            }
                            this.stage = Stage::Running(run);
                            return Poll::Ready(Some(Event::Value(v)));
                        }
                        Poll::Ready(terminal) => {
                            let terminal = terminal.unwrap_or(Event::Completed);
                            if !run.core.finish(&run.exec, terminal.clone()) {
                                return Poll::Ready(Some(Event::Interrupted));
                            }
                            return Poll::Ready(Some(terminal.map_err(ActionError::Producer)));
                        }
                    }
                }
                Stage::Done => return Poll::Ready(None),
            }
        }
    }
}
