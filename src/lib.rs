//! # pushflow
//!
//! **pushflow** is a push-based event-stream engine for Rust.
//!
//! A producer emits values to a consumer under a cooperative cancellation protocol,
//! ending in exactly one terminal outcome: completion or failure. The crate provides
//! the primitives a combinator library is built from: sinks, cold streams, hot
//! multicast hubs and the flattening combinators.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐        activate(sink)        ┌──────────────┐
//!     │    Stream    │ ◄─────────────────────────── │   consumer   │
//!     │  (producer)  │                              └──────┬───────┘
//!     └──────┬───────┘                                     │ Handlers
//!            │ value / complete / fail                     ▼
//!            │                                   ┌───────────────────┐
//!            └─────────────────────────────────► │       Sink        │
//!                                                │  - CancelToken    │
//!                                                │  - on_value       │
//!                                                │  - on_complete    │
//!                                                │  - on_fail ───────┼──► (none) ──► report::escalate
//!                                                └───────────────────┘                    │
//!                                                                                         ▼
//! ┌───────────────────────────────────────────────────────────────────┐        ┌──────────────────┐
//! │  Hub / ReplayHub / CurrentHub / FinalHub                          │        │ Report (async)   │
//! │  - one upstream sink, many downstream sinks                       │        │ TraceReporter    │
//! │  - membership set + lazily rebuilt snapshot                       │        │ LogWriter        │
//! │  - terminal state replayed to late subscribers                    │        └──────────────────┘
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ### Cancellation
//! ```text
//! consumer ──cancel──► output token
//!                          ├──► outer sink token ──► producer stops (polls is_cancelled)
//!                          ├──► inner sink token #1
//!                          └──► inner sink token #N
//! ```
//! Cancellation flows from consumer to producer only. `complete()` and `fail()` cancel
//! the sink's token before any handler runs.
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                         |
//! |-------------------|---------------------------------------------------------------|--------------------------------------------|
//! | **Sinks**         | Terminal-safe receivers with an owned cancellation token.     | [`Sink`], [`Handlers`], [`Notification`]   |
//! | **Streams**       | Cold producer templates, one run per activation.              | [`Stream`]                                 |
//! | **Hubs**          | Hot multicast with snapshot isolation and buffered variants.  | [`Multicast`], [`Hub`], [`ReplayHub`]      |
//! | **Flattening**    | merge / concat / switch / exhaust / expand on `Stream`.       | [`Stream::merge_map`], [`Stream::expand`]  |
//! | **Cancellation**  | Linked single-transition tokens bridged to tokio.             | [`CancelToken`], [`CancelReason`]          |
//! | **Reporting**     | Out-of-band escalation of unhandled failures.                 | [`Report`], [`Unhandled`]                  |
//! | **Configuration** | Reporters and dispatch mode for the current thread.           | [`Config`], [`Dispatch`]                   |
//! | **Errors**        | Data-plane failures and usage errors.                         | [`StreamError`], [`UsageError`]            |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] reporter _(demo/reference only)_.
//!
//! ## Execution model
//! Everything runs on one thread: handles are `Rc`-based and `!Send`. Producers that
//! defer emission spawn onto a `tokio::task::LocalSet` (or any other local source).
//!
//! ## Example
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use pushflow::{Handlers, Hub, Multicast, Sink, Stream, StreamError};
//!
//! let queries = Hub::new();
//! let results = queries.stream().switch_map(|query: &'static str, _| {
//!     Ok::<_, StreamError>(Stream::new(move |sink: &Sink<String>| {
//!         sink.value(format!("results for {query}"));
//!         sink.complete();
//!         Ok(())
//!     }))
//! });
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let log = seen.clone();
//! results.activate(
//!     Handlers::new()
//!         .on_value(move |r: String| log.borrow_mut().push(r))
//!         .on_fail(|e| eprintln!("search failed: {e}")),
//! );
//!
//! queries.value("rust");
//! queries.value("tokio");
//! queries.complete();
//!
//! assert_eq!(*seen.borrow(), vec!["results for rust", "results for tokio"]);
//! ```
mod cancel;
mod config;
mod error;
mod flatten;
mod hub;
mod report;
mod sink;
mod stream;

#[cfg(test)]
mod testing;

// ---- Public re-exports ----

pub use cancel::{CancelReason, CancelToken, Registration};
pub use config::{Config, ConfigGuard, Dispatch};
pub use error::{StreamError, UsageError};
pub use hub::{CurrentHub, FinalHub, Hub, HubState, Multicast, ReplayHub};
pub use report::{Report, TraceReporter, Unhandled, UnhandledKind};
pub use sink::{Handlers, Notification, Sink};
pub use stream::Stream;

// Optional: expose a simple built-in stderr reporter (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use report::LogWriter;
