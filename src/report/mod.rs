//! # Out-of-band failure reporting.
//!
//! Failures that no `on_fail` handler consumed are never dropped and never thrown
//! back into the producer. They are wrapped in an [`Unhandled`] record and handed
//! to the configured [`Report`] implementations from a detached task.
//!
//! ## Built-in reporters
//! - [`TraceReporter`] - logs through `tracing` (installed by default).
//! - `LogWriter` - prints to stderr (feature `logging`).
//!
//! Configure reporters with [`Config`](crate::Config).

mod dispatch;
#[cfg(feature = "logging")]
mod log;
mod reporter;
mod unhandled;

pub(crate) use dispatch::escalate;
#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use reporter::{Report, TraceReporter};
pub use unhandled::{Unhandled, UnhandledKind};
