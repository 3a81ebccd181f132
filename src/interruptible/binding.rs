//! # BindingTarget: cancel-then-restart sink.
//!
//! For every input it receives, a [`BindingTarget`]:
//! 1. fires the interrupt action and resolves it in place (its work is
//!    instantaneous); a failed interrupt attempt is logged and ignored;
//! 2. starts the inner action with the new input.
//!
//! Step 1 frees the inner execution slot synchronously, so step 2 is never
//! denied because of the run it replaces.
//!
//! ```text
//!  input ──► interrupt.fire() ──► (running work ─► Interrupted)
//!        └─► inner.apply(input).start() ──► fresh execution
//! ```

use std::fmt;
use std::pin::Pin;
use std::sync::Weak;
use std::task::{Context, Poll};

use futures::{FutureExt, Sink, Stream, StreamExt};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::action::Shared;
use crate::action::Outcome;
use crate::error::{ActionError, BindingError};

/// Write-only sink feeding an [`InterruptibleAction`](crate::InterruptibleAction).
///
/// Holds a weak reference: once the action is dropped the target is inert
/// and every input is discarded.
///
/// As a [`Sink`] it fails with [`BindingError::NoRuntime`] outside of a tokio
/// runtime instead of panicking.
pub struct BindingTarget<I, O, E> {
    action: Weak<Shared<I, O, E>>,
}

impl<I, O, E> Clone for BindingTarget<I, O, E> {
    fn clone(&self) -> Self {
        Self {
            action: Weak::clone(&self.action),
        }
    }
}

impl<I, O, E> fmt::Debug for BindingTarget<I, O, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingTarget")
            .field("bound", &(self.action.strong_count() > 0))
            .finish()
    }
}

impl<I, O, E> BindingTarget<I, O, E> {
    pub(crate) fn new(action: Weak<Shared<I, O, E>>) -> Self {
        Self { action }
    }

    /// True while the action behind this target is alive.
    pub fn is_bound(&self) -> bool {
        self.action.strong_count() > 0
    }
}

impl<I, O, E> BindingTarget<I, O, E>
where
    I: Send + 'static,
    O: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Interrupts the current execution, then starts a new one with `input`.
    ///
    /// The new execution's start attempt happens before this returns; the
    /// handle resolves when it ends.
    ///
    /// # Errors
    /// - [`BindingError::Unbound`] if the action is gone.
    /// - [`BindingError::NoRuntime`] if called outside of a tokio runtime.
    ///   Nothing is interrupted in that case.
    pub fn send(
        &self,
        input: I,
    ) -> Result<JoinHandle<Result<Outcome<O>, ActionError<E>>>, BindingError> {
        let Some(action) = self.action.upgrade() else {
            debug!("binding target unbound, input dropped");
            return Err(BindingError::Unbound);
        };
        let Ok(handle) = Handle::try_current() else {
            warn!(action = action.inner.name(), "binding target used outside a runtime");
            return Err(BindingError::NoRuntime);
        };

        match action.interrupt.fire().run().now_or_never() {
            Some(Ok(_)) => {}
            Some(Err(err)) => {
                debug!(action = action.interrupt.name(), error = %err, "interrupt skipped");
            }
            None => {
                debug!(action = action.interrupt.name(), "interrupt did not resolve in place");
            }
        }

        Ok(handle.spawn(action.inner.apply(input).begin().run()))
    }

    /// Feeds every item of `inputs` through [`send`](Self::send).
    ///
    /// Stops early once the action is gone.
    pub async fn consume<S>(&self, inputs: S)
    where
        S: Stream<Item = I>,
    {
        let mut inputs = std::pin::pin!(inputs);
        while let Some(input) = inputs.next().await {
            if self.send(input).is_err() {
                break;
            }
        }
    }

    /// Spawns [`consume`](Self::consume) on the current tokio runtime.
    ///
    /// # Panics
    /// Panics if called outside of a tokio runtime.
    pub fn bind<S>(&self, inputs: S) -> JoinHandle<()>
    where
        S: Stream<Item = I> + Send + 'static,
    {
        let target = self.clone();
        tokio::spawn(async move { target.consume(inputs).await })
    }
}

impl<I, O, E> Sink<I> for BindingTarget<I, O, E>
where
    I: Send + 'static,
    O: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    type Error = BindingError;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        match Handle::try_current() {
            Ok(_) => Poll::Ready(Ok(())),
            Err(_) => Poll::Ready(Err(BindingError::NoRuntime)),
        }
    }

    /// An unbound target accepts and discards the input.
    fn start_send(self: Pin<&mut Self>, item: I) -> Result<(), Self::Error> {
        match self.send(item) {
            Ok(_) | Err(BindingError::Unbound) => Ok(()),
            Err(err) => Err(err),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }
}
