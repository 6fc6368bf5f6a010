//! # Unhandled-failure records.
//!
//! [`Unhandled`] is what reporters receive when a data-plane failure had nowhere to go.
//! It carries the failure, a classification ([`UnhandledKind`]), a wall-clock timestamp,
//! and a process-wide sequence number.
//!
//! ## Ordering guarantees
//! `seq` increases monotonically across all threads. Reports are delivered from
//! detached tasks, so use `seq` to restore the order in which failures were escalated.
//!
//! ## Example
//! ```rust
//! use pushflow::{StreamError, Unhandled, UnhandledKind};
//!
//! let a = Unhandled::new(UnhandledKind::NoFailHandler, StreamError::msg("first"));
//! let b = Unhandled::new(UnhandledKind::NoHubMembers, StreamError::msg("second"));
//! assert!(a.seq < b.seq);
//! assert_eq!(b.kind.as_label(), "no_hub_members");
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::error::StreamError;

/// Global sequence counter for escalation ordering.
static UNHANDLED_SEQ: AtomicU64 = AtomicU64::new(0);

/// Where an unhandled failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnhandledKind {
    /// A sink failed without an `on_fail` handler.
    NoFailHandler,
    /// A terminal handler (`on_complete` / `on_fail`) panicked.
    HandlerPanicked,
    /// A hub failed while no sink was attached.
    NoHubMembers,
}

impl UnhandledKind {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            UnhandledKind::NoFailHandler => "no_fail_handler",
            UnhandledKind::HandlerPanicked => "handler_panicked",
            UnhandledKind::NoHubMembers => "no_hub_members",
        }
    }
}

/// An escalated data-plane failure.
#[derive(Debug, Clone)]
pub struct Unhandled {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock time of escalation.
    pub at: SystemTime,
    /// Classification.
    pub kind: UnhandledKind,
    /// The failure itself.
    pub error: StreamError,
}

impl Unhandled {
    /// Creates a record stamped with the current time and the next sequence number.
    pub fn new(kind: UnhandledKind, error: StreamError) -> Self {
        Self {
            seq: UNHANDLED_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            error,
        }
    }

    /// Returns `"<kind>:<error label>"`, e.g. `no_fail_handler:stream_failed`.
    pub fn as_label(&self) -> String {
        format!("{}:{}", self.kind.as_label(), self.error.as_label())
    }
}
