//! # Unhandled-failure reporter trait.
//!
//! Provides [`Report`], the extension point for plugging custom sinks for
//! failures that escaped every `on_fail` handler.
//!
//! ## Rules
//! - Reports run on a detached task, never on the stack that produced the failure.
//! - Panics inside a reporter are caught and logged; they are not re-escalated.
//! - Reporters are invoked in the order they were configured.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use pushflow::{Report, Unhandled, UnhandledKind};
//!
//! struct Alerts;
//!
//! #[async_trait]
//! impl Report for Alerts {
//!     async fn on_unhandled(&self, failure: &Unhandled) {
//!         if failure.kind == UnhandledKind::NoHubMembers {
//!             // page someone
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "alerts" }
//! }
//! ```

use async_trait::async_trait;

use super::unhandled::Unhandled;

/// Receiver of escalated failures.
#[async_trait]
pub trait Report: Send + Sync + 'static {
    /// Handles a single escalated failure.
    async fn on_unhandled(&self, failure: &Unhandled);

    /// Returns the reporter name used in logs.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose - override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Default reporter: logs every escalation through `tracing` at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TraceReporter;

#[async_trait]
impl Report for TraceReporter {
    async fn on_unhandled(&self, failure: &Unhandled) {
        tracing::error!(
            seq = failure.seq,
            kind = failure.kind.as_label(),
            error = %failure.error,
            "unhandled stream failure"
        );
    }

    fn name(&self) -> &'static str {
        "trace"
    }
}
