//! Error types used by pushflow.
//!
//! This module defines two error enums that travel on separate channels:
//!
//! - [`StreamError`] - data-plane failures carried by `fail(reason)` notifications.
//! - [`UsageError`] - misuse of a public entry point, returned synchronously to the caller.
//!
//! A `StreamError` never crosses a Stream/Sink boundary as a panic or an `Err` return:
//! producers and projections return it, and the engine converts it into a `fail` call.

use std::any::Any;
use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

/// # Failure reason carried by the data plane.
///
/// Cheap to clone (all payloads are reference-counted) because a hub replays the
/// same failure to every current and late subscriber.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum StreamError {
    /// A producer or projection reported a failure with a message.
    #[error("stream failed: {message}")]
    Failed {
        /// Human-readable failure message.
        message: Arc<str>,
    },

    /// A foreign error wrapped as a stream failure.
    #[error("{0}")]
    Other(Arc<dyn StdError + Send + Sync>),

    /// A handler, producer or projection panicked; the panic was caught at the boundary.
    #[error("panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: Arc<str>,
    },
}

impl StreamError {
    /// Builds a [`StreamError::Failed`] from a message.
    ///
    /// # Example
    /// ```
    /// use pushflow::StreamError;
    ///
    /// let err = StreamError::msg("boom");
    /// assert_eq!(err.to_string(), "stream failed: boom");
    /// ```
    pub fn msg(message: impl Into<String>) -> Self {
        StreamError::Failed {
            message: message.into().into(),
        }
    }

    /// Wraps any error type as a stream failure.
    pub fn other<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        StreamError::Other(Arc::new(error))
    }

    /// Converts a caught panic payload into [`StreamError::Panicked`].
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let info = if let Some(msg) = payload.downcast_ref::<&'static str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "unknown panic".to_string()
        };
        StreamError::Panicked { info: info.into() }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use pushflow::StreamError;
    ///
    /// assert_eq!(StreamError::msg("x").as_label(), "stream_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            StreamError::Failed { .. } => "stream_failed",
            StreamError::Other(_) => "stream_other",
            StreamError::Panicked { .. } => "stream_panicked",
        }
    }

    /// Returns a human-readable message with details about the failure.
    pub fn as_message(&self) -> String {
        match self {
            StreamError::Failed { message } => format!("failed: {message}"),
            StreamError::Other(err) => format!("error: {err}"),
            StreamError::Panicked { info } => format!("panic: {info}"),
        }
    }

    /// Indicates whether the failure originates from a caught panic.
    pub fn is_panic(&self) -> bool {
        matches!(self, StreamError::Panicked { .. })
    }
}

/// # Misuse of a public entry point.
///
/// These are programmer errors, reported at the call site and never routed
/// through a sink.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    /// A replay hub needs room for at least one value.
    #[error("replay capacity must be at least 1, got {capacity}")]
    ZeroReplayCapacity {
        /// The rejected capacity.
        capacity: usize,
    },

    /// A bounded flattening combinator needs at least one concurrent inner stream.
    #[error("concurrency limit must be at least 1, got {limit}")]
    ZeroConcurrency {
        /// The rejected limit.
        limit: usize,
    },
}

impl UsageError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            UsageError::ZeroReplayCapacity { .. } => "usage_zero_replay_capacity",
            UsageError::ZeroConcurrency { .. } => "usage_zero_concurrency",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("disk on fire")]
    struct DiskError;

    #[test]
    fn test_from_panic_reads_str_and_string_payloads() {
        let err = StreamError::from_panic(Box::new("static boom"));
        assert_eq!(err.as_message(), "panic: static boom");

        let err = StreamError::from_panic(Box::new(String::from("owned boom")));
        assert!(err.is_panic());
        assert_eq!(err.to_string(), "panicked: owned boom");

        let err = StreamError::from_panic(Box::new(42_u8));
        assert_eq!(err.as_message(), "panic: unknown panic");
    }

    #[test]
    fn test_other_keeps_display_of_wrapped_error() {
        let err = StreamError::other(DiskError);
        assert_eq!(err.to_string(), "disk on fire");
        assert_eq!(err.as_label(), "stream_other");
        assert!(!err.is_panic());
    }

    #[test]
    fn test_usage_error_labels() {
        let err = UsageError::ZeroConcurrency { limit: 0 };
        assert_eq!(err.as_label(), "usage_zero_concurrency");
        assert_eq!(err.to_string(), "concurrency limit must be at least 1, got 0");
    }
}
