//! # LogWriter: lifecycle events as tracing records
//!
//! A minimal subscriber that turns every [`Event`] into a `tracing` record.
//! Useful in tests and demos; install a `tracing-subscriber` to see the output.
//!
//! ## Example output
//! ```text
//! DEBUG interruptible_action: value action="search" value="ru"
//!  INFO interruptible_action: completed action="search"
//!  INFO interruptible_action: interrupted action="search"
//!  WARN interruptible_action: failed action="search" error=Timeout
//! ```

use std::borrow::Cow;
use std::fmt::Debug;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::Event;
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Debug, Clone)]
pub struct LogWriter {
    action: Cow<'static, str>,
}

impl Default for LogWriter {
    fn default() -> Self {
        Self::new("action")
    }
}

impl LogWriter {
    /// Writer tagging every record with `action`.
    #[must_use]
    pub fn new(action: impl Into<Cow<'static, str>>) -> Self {
        Self {
            action: action.into(),
        }
    }
}

#[async_trait]
impl<O, E> Subscribe<O, E> for LogWriter
where
    O: Debug + Send + Sync + 'static,
    E: Debug + Send + Sync + 'static,
{
    async fn on_event(&self, e: &Event<O, E>) {
        let action = self.action.as_ref();
        match e {
            Event::Value(v) => debug!(action, value = ?v, "value"),
            Event::Failed(err) => warn!(action, error = ?err, "failed"),
            Event::Completed => info!(action, "completed"),
            Event::Interrupted => info!(action, "interrupted"),
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
