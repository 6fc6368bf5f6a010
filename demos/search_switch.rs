//! # Example: search_switch
//!
//! Type-ahead search where only the latest query matters.
//!
//! Shows how to:
//! - Feed user input into a [`Hub`].
//! - Use [`Stream::switch_map`] so a new query cancels the in-flight lookup.
//! - Defer emission onto a `LocalSet` task that honours [`CancelToken::cancelled`].
//! - Install a custom [`Report`] for failures nobody handled.
//!
//! ## Flow
//! ```text
//! keystrokes ──► Hub<&str> ──► switch_map(lookup) ──► Sink (prints results)
//!                                  │
//!                                  └─ new query ──► cancel previous lookup task
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example search_switch
//! ```

use std::sync::Arc;
use std::time::Duration;

use pushflow::{
    CancelToken, Config, Handlers, Hub, Multicast, Report, Sink, Stream, StreamError, Unhandled,
};
use tokio::task::LocalSet;

/// Prints unhandled failures to stdout.
struct ConsoleReporter;

#[async_trait::async_trait]
impl Report for ConsoleReporter {
    async fn on_unhandled(&self, failure: &Unhandled) {
        println!(
            "[report] seq={} kind={} error={}",
            failure.seq,
            failure.kind.as_label(),
            failure.error
        );
    }

    fn name(&self) -> &'static str {
        "console"
    }
}

/// Simulated remote lookup: answers after a latency proportional to the query length.
fn lookup(query: &'static str) -> Stream<String> {
    Stream::new(move |sink: &Sink<String>| {
        if query.is_empty() {
            return Err(StreamError::msg("empty query"));
        }
        let sink = sink.clone();
        let token: CancelToken = sink.token().clone();
        tokio::task::spawn_local(async move {
            let latency = Duration::from_millis(40 * query.len() as u64);
            tokio::select! {
                _ = token.cancelled() => println!("[lookup] cancelled: {query}"),
                _ = tokio::time::sleep(latency) => {
                    for hit in ["docs", "crates", "forum"] {
                        sink.value(format!("{query}: {hit}"));
                    }
                    sink.complete();
                }
            }
        });
        Ok(())
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let _config = Config::default()
        .with_reporter(Arc::new(ConsoleReporter))
        .install();

    LocalSet::new()
        .run_until(async {
            let keystrokes = Hub::new();
            let (done_tx, done_rx) = tokio::sync::oneshot::channel::<()>();

            keystrokes
                .stream()
                .switch_map(|query, index| {
                    println!("[search] #{index} looking up {query:?}");
                    Ok(lookup(query))
                })
                .activate(
                    Handlers::new()
                        .on_value(|hit: String| println!("[result] {hit}"))
                        .on_complete(move || {
                            let _ = done_tx.send(());
                        })
                        .on_fail(|e| println!("[search] failed: {e}")),
                );

            for query in ["r", "ru", "rus", "rust"] {
                keystrokes.value(query);
                tokio::time::sleep(Duration::from_millis(30)).await;
            }
            keystrokes.complete();

            let _ = done_rx.await;

            // Nobody listens to this hub: its failure goes to the reporter.
            let orphan: Hub<()> = Hub::new();
            orphan.fail(StreamError::msg("orphaned hub"));
            tokio::time::sleep(Duration::from_millis(20)).await;
        })
        .await;
}
