//! # Consumer side of the protocol.
//!
//! This module provides:
//! - [`Sink`] - terminal-safe receiver owning a [`CancelToken`](crate::CancelToken)
//! - [`Handlers`] - the record of optional callbacks a sink is built from
//! - [`Notification`] - the value/complete/fail vocabulary as a closed sum type

mod handlers;
mod notification;
#[allow(clippy::module_inception)]
mod sink;

pub use handlers::Handlers;
pub use notification::Notification;
pub use sink::Sink;
