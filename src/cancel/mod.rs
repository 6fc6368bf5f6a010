//! # Cooperative cancellation.
//!
//! Provides [`CancelToken`], the single terminal switch owned by every [`Sink`](crate::Sink).
//!
//! ## Architecture
//! ```text
//! output token ──cancel──► linked child (outer sink) ──► on_cancel callbacks
//!      │
//!      ├──────cancel──► linked child (inner #1) ──► on_cancel callbacks
//!      └──────cancel──► linked child (inner #N) ──► on_cancel callbacks
//! ```
//!
//! ## Rules
//! - A token transitions at most once, irreversibly, to cancelled.
//! - Callbacks fire in registration order at the transition and never again.
//! - Cancellation flows from parent to child only.

mod token;

pub use token::{CancelReason, CancelToken, Registration};
