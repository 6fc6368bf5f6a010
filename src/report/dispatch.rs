//! # Out-of-band escalation.
//!
//! [`escalate`] hands an [`Unhandled`] record to every configured reporter without
//! unwinding through the code that produced the failure.
//!
//! ## Architecture
//! ```text
//! Sink::fail (no handler) ─┐
//! terminal handler panic ──┼──► escalate(record) ──► [tokio task | report thread]
//! Hub::fail (no members) ──┘                               │
//!                                                          ├──► reporter1.on_unhandled()
//!                                                          │        └─► panic → tracing::error!
//!                                                          └──► reporterN.on_unhandled()
//! ```
//!
//! ## Rules
//! - **Never inline**: the caller returns before any reporter runs.
//! - **Runtime first**: with [`Dispatch::Runtime`] the job is spawned on the ambient tokio
//!   runtime when there is one, else on a detached thread.
//! - **Isolation**: a panicking reporter doesn't affect the others.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use super::reporter::Report;
use super::unhandled::Unhandled;
use crate::config::{Config, Dispatch};
use crate::error::StreamError;

/// Schedules delivery of `failure` to the reporters of the current [`Config`].
pub(crate) fn escalate(failure: Unhandled) {
    let config = Config::current();
    tracing::debug!(
        seq = failure.seq,
        kind = failure.kind.as_label(),
        reporters = config.reporters.len(),
        "escalating unhandled failure"
    );

    let job = deliver(config.reporters, failure).boxed();
    match config.dispatch {
        Dispatch::Runtime => match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(job);
            }
            Err(_) => spawn_thread(job),
        },
        Dispatch::Thread => spawn_thread(job),
    }
}

async fn deliver(reporters: Vec<Arc<dyn Report>>, failure: Unhandled) {
    for reporter in reporters {
        let fut = reporter.on_unhandled(&failure);
        if let Err(panic_err) = AssertUnwindSafe(fut).catch_unwind().await {
            let info = StreamError::from_panic(panic_err);
            tracing::error!(reporter = reporter.name(), %info, "reporter panicked");
        }
    }
}

fn spawn_thread(job: BoxFuture<'static, ()>) {
    let spawned = std::thread::Builder::new()
        .name("pushflow-report".into())
        .spawn(move || futures::executor::block_on(job));
    if let Err(err) = spawned {
        tracing::error!(%err, "failed to spawn report thread; failure dropped");
    }
}
