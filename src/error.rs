//! Error types surfaced by actions.
//!
//! [`ActionError`] is the failure type of every [`Invocation`](crate::Invocation):
//!
//! - [`ActionError::Disabled`] — the start attempt was denied by the gate or
//!   because another execution is current. No unit of work was created.
//! - [`ActionError::Producer`] — the unit of work itself failed.
//!
//! Interruption is deliberately **not** an error: it is reported as
//! [`Event::Interrupted`](crate::Event::Interrupted) /
//! [`Outcome::Interrupted`](crate::Outcome::Interrupted).
//!
//! [`BindingError`] is returned when a [`BindingTarget`](crate::BindingTarget)
//! cannot accept an input.

use thiserror::Error;

/// # Errors produced by applying an action.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError<E> {
    /// The action was disabled when the invocation tried to start.
    #[error("action is disabled")]
    Disabled,

    /// The unit of work terminated with its own error.
    #[error("producer failed: {0}")]
    Producer(E),
}

impl<E> ActionError<E> {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use interruptible_action::ActionError;
    ///
    /// let err: ActionError<String> = ActionError::Disabled;
    /// assert_eq!(err.as_label(), "action_disabled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ActionError::Disabled => "action_disabled",
            ActionError::Producer(_) => "action_producer_failed",
        }
    }

    /// True if the invocation was denied before any work was created.
    pub fn is_disabled(&self) -> bool {
        matches!(self, ActionError::Disabled)
    }

    /// Returns the producer error, if any.
    pub fn producer(&self) -> Option<&E> {
        match self {
            ActionError::Producer(e) => Some(e),
            ActionError::Disabled => None,
        }
    }

    /// Consumes the error and returns the producer error, if any.
    pub fn into_producer(self) -> Option<E> {
        match self {
            ActionError::Producer(e) => Some(e),
            ActionError::Disabled => None,
        }
    }
}

impl<E: std::fmt::Display> ActionError<E> {
    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ActionError::Disabled => "disabled".to_string(),
            ActionError::Producer(e) => format!("error: {e}"),
        }
    }
}

/// # Errors produced by feeding a binding target.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingError {
    /// The action behind the target has been dropped.
    #[error("binding target is unbound")]
    Unbound,

    /// The target was fed outside of a tokio runtime.
    #[error("binding target needs a tokio runtime")]
    NoRuntime,
}

impl BindingError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            BindingError::Unbound => "binding_unbound",
            BindingError::NoRuntime => "binding_no_runtime",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn producer_error_keeps_payload() {
        let err: ActionError<&str> = ActionError::Producer("boom");
        assert_eq!(err.as_label(), "action_producer_failed");
        assert_eq!(err.as_message(), "error: boom");
        assert_eq!(err.to_string(), "producer failed: boom");
        assert!(!err.is_disabled());
        assert_eq!(err.into_producer(), Some("boom"));
    }

    #[test]
    fn disabled_has_no_producer_error() {
        let err: ActionError<&str> = ActionError::Disabled;
        assert!(err.is_disabled());
        assert_eq!(err.producer(), None);
        assert_eq!(err.to_string(), "action is disabled");
    }

    #[test]
    fn binding_error_labels() {
        assert_eq!(BindingError::Unbound.as_label(), "binding_unbound");
        assert_eq!(
            BindingError::NoRuntime.to_string(),
            "binding target needs a tokio runtime"
        );
    }
}
