//! # Example: search_as_you_type
//!
//! Feeds a burst of keystrokes into an [`InterruptibleAction`] through its
//! [`BindingTarget`]: every keystroke cancels the lookup started for the
//! previous one, so only the last query produces results.
//!
//! Shows how to:
//! - Gate an action on a [`MutableProperty`] (here: "online").
//! - Restart work from an input stream with `binding_target().bind(..)`.
//! - Cancel explicitly with `interrupt().fire()`.
//! - Observe the lifecycle with the built-in [`LogWriter`].
//!
//! ## Flow
//! ```text
//! keystrokes ──► BindingTarget
//!                  ├─► interrupt.fire()        (previous lookup ─► Interrupted)
//!                  └─► search.apply(query)     (fresh lookup)
//! last query  ──► Value(results) ──► Completed
//! offline     ──► apply denied    ──► disabled_errors
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example search_as_you_type
//! ```

use std::{sync::Arc, time::Duration};

use futures::{StreamExt, stream};
use interruptible_action::{
    Config, Event, Gate, InterruptibleAction, LogWriter, MutableProperty, Subscribe, Work,
};
use tracing_subscriber::EnvFilter;

const CATALOG: &[&str] = &["rust", "rustc", "rustup", "ruby", "rails", "tokio", "tracing"];

#[derive(Debug, Clone, thiserror::Error)]
#[error("empty query")]
struct EmptyQuery;

fn lookup(query: String) -> Work<Vec<&'static str>, EmptyQuery> {
    Work::from_future(async move {
        if query.is_empty() {
            return Err(EmptyQuery);
        }
        tokio::time::sleep(Duration::from_millis(150)).await;
        Ok(CATALOG
            .iter()
            .copied()
            .filter(|item| item.starts_with(&query))
            .collect())
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== search_as_you_type example ===\n");

    // 1. Gate the search on connectivity.
    let online = MutableProperty::new(true);
    let search: InterruptibleAction<String, Vec<&'static str>, EmptyQuery> =
        InterruptibleAction::with_gate(
            Config::named("search"),
            Gate::flag(online.property()),
            |(), query| lookup(query),
        );

    // 2. Attach a logging subscriber.
    let subs: Vec<Arc<dyn Subscribe<Vec<&'static str>, EmptyQuery>>> =
        vec![Arc::new(LogWriter::new("search"))];
    let observer = search.observe(subs);

    // 3. Type "rust" one key at a time, faster than a lookup takes.
    let mut events = search.events();
    let keystrokes = stream::iter(["r", "ru", "rus", "rust"])
        .map(String::from)
        .then(|query| async move {
            tokio::time::sleep(Duration::from_millis(40)).await;
            query
        });
    search.binding_target().bind(keystrokes).await?;

    let mut interrupted = 0;
    loop {
        match events.recv().await? {
            Event::Interrupted => interrupted += 1,
            Event::Value(results) => println!("[search] results: {results:?}"),
            Event::Completed => break,
            Event::Failed(err) => anyhow::bail!("search failed: {err:?}"),
        }
    }
    println!("[search] {interrupted} stale lookups interrupted\n");

    // 4. Explicit cancellation.
    let pending = search.apply("to".into()).start();
    tokio::time::sleep(Duration::from_millis(20)).await;
    search.interrupt().fire().run().await?;
    println!("[search] explicit cancel: {:?}", pending.await??);

    // 5. Producer errors reach the caller and `errors()`.
    if let Err(err) = search.apply(String::new()).run().await {
        println!("[search] rejected: {err}");
    }

    // 6. Going offline disables the action.
    online.set(false);
    let mut disabled = search.disabled_errors();
    if let Err(err) = search.apply("tracing".into()).run().await {
        println!("[search] offline: {err}");
    }
    disabled.recv().await?;

    drop(search);
    observer.await?;
    Ok(())
}
