//! # Per-execution context.
//!
//! An [`ExecutionContext`] is handed to factories registered with
//! [`Action::with_context`](crate::Action::with_context). It identifies the
//! execution and lets the work cooperate with interruption, the same way a
//! task receives a [`CancellationToken`] it should watch.

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// Handle to one execution of an action.
///
/// Cheap to clone; all clones refer to the same execution.
#[derive(Clone)]
pub struct ExecutionContext {
    id: u64,
    token: CancellationToken,
    interrupt: Arc<dyn Fn() -> bool + Send + Sync>,
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("id", &self.id)
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl ExecutionContext {
    pub(crate) fn new(
        id: u64,
        token: CancellationToken,
        interrupt: impl Fn() -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            id,
            token,
            interrupt: Arc::new(interrupt),
        }
    }

    /// Execution id, unique and increasing per action (starting at 1).
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Token cancelled once the execution has terminated, whatever the cause.
    ///
    /// Work that holds its own resources can `select!` on `token().cancelled()`
    /// to stop early after an interrupt.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// True once the execution's terminal event has been published.
    pub fn is_finished(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Terminates the execution as `Interrupted`.
    ///
    /// Returns `false` if the execution had already terminated or its action is gone.
    pub fn interrupt(&self) -> bool {
        (self.interrupt)()
    }
}
