//! # Lifecycle events emitted for every execution.
//!
//! The [`Event`] enum is the tagged lifecycle of one unit of work:
//! - **Value events**: zero or more [`Event::Value`] items
//! - **Terminal events**: exactly one of [`Event::Failed`], [`Event::Completed`]
//!   or [`Event::Interrupted`]
//!
//! ```text
//! Value* ─► Completed
//!        ─► Failed(E)
//!        ─► Interrupted
//! ```
//!
//! ## Example
//! ```rust
//! use interruptible_action::{Event, EventKind};
//!
//! let ev: Event<u32, String> = Event::Value(3);
//! assert_eq!(ev.kind(), EventKind::Value);
//! assert!(!ev.is_terminal());
//! assert!(Event::<u32, String>::Interrupted.is_terminal());
//! ```

/// Classification of lifecycle events (payload-free).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A value produced by the unit of work.
    Value,
    /// The unit of work failed (terminal).
    Failed,
    /// The unit of work finished normally (terminal).
    Completed,
    /// The unit of work was cancelled before it finished (terminal).
    Interrupted,
}

impl EventKind {
    /// True for `Failed`, `Completed` and `Interrupted`.
    #[inline]
    pub fn is_terminal(self) -> bool {
        !matches!(self, EventKind::Value)
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            EventKind::Value => "value",
            EventKind::Failed => "failed",
            EventKind::Completed => "completed",
            EventKind::Interrupted => "interrupted",
        }
    }
}

/// Lifecycle event of a single unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<O, E> {
    /// A produced value.
    Value(O),
    /// Terminal failure with the work's error.
    Failed(E),
    /// Terminal success.
    Completed,
    /// Terminal cancellation; neither success nor failure.
    Interrupted,
}

impl<O, E> Event<O, E> {
    /// Returns the payload-free classification.
    #[inline]
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Value(_) => EventKind::Value,
            Event::Failed(_) => EventKind::Failed,
            Event::Completed => EventKind::Completed,
            Event::Interrupted => EventKind::Interrupted,
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.kind().is_terminal()
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        self.kind().as_label()
    }

    /// Returns the value payload, if any.
    pub fn value(&self) -> Option<&O> {
        match self {
            Event::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the error payload, if any.
    pub fn error(&self) -> Option<&E> {
        match self {
            Event::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Maps the value payload.
    pub fn map<P>(self, f: impl FnOnce(O) -> P) -> Event<P, E> {
        match self {
            Event::Value(v) => Event::Value(f(v)),
            Event::Failed(e) => Event::Failed(e),
            Event::Completed => Event::Completed,
            Event::Interrupted => Event::Interrupted,
        }
    }

    /// Maps the error payload.
    pub fn map_err<F>(self, f: impl FnOnce(E) -> F) -> Event<O, F> {
        match self {
            Event::Value(v) => Event::Value(v),
            Event::Failed(e) => Event::Failed(f(e)),
            Event::Completed => Event::Completed,
            Event::Interrupted => Event::Interrupted,
        }
    }
}

impl<O, E> From<Result<O, E>> for Event<O, E> {
    fn from(res: Result<O, E>) -> Self {
        match res {
            Ok(v) => Event::Value(v),
            Err(e) => Event::Failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_value_is_non_terminal() {
        assert!(!EventKind::Value.is_terminal());
        assert!(EventKind::Failed.is_terminal());
        assert!(EventKind::Completed.is_terminal());
        assert!(EventKind::Interrupted.is_terminal());
    }

    #[test]
    fn map_err_keeps_other_variants() {
        let ev: Event<u8, &str> = Event::Failed("boom");
        assert_eq!(ev.map_err(str::len), Event::Failed(4));

        let ev: Event<u8, &str> = Event::Value(1);
        assert_eq!(ev.map_err(str::len), Event::Value(1));
    }

    #[test]
    fn result_converts_into_event() {
        let ok: Event<u8, ()> = Ok(5).into();
        assert_eq!(ok.value(), Some(&5));
        let err: Event<u8, &str> = Err("no").into();
        assert_eq!(err.error(), Some(&"no"));
        assert_eq!(err.as_label(), "failed");
    }
}
