//! # Terminal-safe receiver.
//!
//! [`Sink`] wraps a [`Handlers`] record and owns a [`CancelToken`].
//!
//! ## Rules
//! - After the token cancels (external cancel, `complete()` or `fail()`), no handler runs again.
//! - **Cancel-before-notify**: `complete()`/`fail()` cancel the token *before* calling the
//!   handler, so code re-entering the sink from the handler observes the terminated state.
//! - A panicking value handler turns into `fail(StreamError::Panicked)`.
//! - A failure without `on_fail`, or a panicking terminal handler, is escalated out of
//!   band (see [`Report`](crate::Report)); it never unwinds into the caller.

use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use super::handlers::{CompleteFn, FailFn, Handlers, ValueFn};
use super::notification::Notification;
use crate::cancel::{CancelReason, CancelToken};
use crate::error::StreamError;
use crate::report::{self, Unhandled, UnhandledKind};

#[derive(Default)]
struct Terminal {
    on_complete: Option<CompleteFn>,
    on_fail: Option<FailFn>,
}

struct SinkInner<T> {
    token: CancelToken,
    on_value: Option<ValueFn<T>>,
    terminal: RefCell<Terminal>,
}

/// Receiver of values, completion and failure.
///
/// Cloning yields another handle to the same sink.
pub struct Sink<T> {
    inner: Rc<SinkInner<T>>,
}

impl<T: 'static> Sink<T> {
    /// Builds a sink from a handler record.
    ///
    /// With an external token the sink's own token is linked to it; an already
    /// cancelled external token yields a pre-cancelled sink.
    pub fn new(handlers: Handlers<T>) -> Self {
        let Handlers {
            on_value,
            on_complete,
            on_fail,
            token,
        } = handlers;

        let token = match token {
            Some(external) => CancelToken::linked([&external]),
            None => CancelToken::new(),
        };

        Self {
            inner: Rc::new(SinkInner {
                token,
                on_value,
                terminal: RefCell::new(Terminal {
                    on_complete,
                    on_fail,
                }),
            }),
        }
    }

    /// A sink with no handlers. Failures delivered to it are escalated.
    pub fn silent() -> Self {
        Self::new(Handlers::new())
    }

    /// A sink with only a value handler.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(T) + 'static,
    {
        Self::new(Handlers::new().on_value(f))
    }

    /// Delivers a value. No-op once cancelled.
    pub fn value(&self, v: T) {
        if self.is_cancelled() {
            return;
        }
        let Some(handler) = self.inner.on_value.clone() else {
            return;
        };
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| handler(v))) {
            let err = StreamError::from_panic(payload);
            // the handler terminated its own sink before panicking: fail() would drop it
            if self.is_cancelled() {
                report::escalate(Unhandled::new(UnhandledKind::HandlerPanicked, err));
            } else {
                self.fail(err);
            }
        }
    }

    /// Completes the sink. No-op once cancelled.
    pub fn complete(&self) {
        let Some(terminal) = self.terminate(CancelReason::Completed) else {
            return;
        };
        if let Some(f) = terminal.on_complete {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
                report::escalate(Unhandled::new(
                    UnhandledKind::HandlerPanicked,
                    StreamError::from_panic(payload),
                ));
            }
        }
    }

    /// Fails the sink. No-op once cancelled.
    pub fn fail(&self, err: StreamError) {
        let Some(terminal) = self.terminate(CancelReason::Failed(err.clone())) else {
            return;
        };
        match terminal.on_fail {
            Some(f) => {
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| f(err))) {
                    report::escalate(Unhandled::new(
                        UnhandledKind::HandlerPanicked,
                        StreamError::from_panic(payload),
                    ));
                }
            }
            None => report::escalate(Unhandled::new(UnhandledKind::NoFailHandler, err)),
        }
    }

    /// Delivers one [`Notification`].
    pub fn notify(&self, notification: Notification<T>) {
        match notification {
            Notification::Value(v) => self.value(v),
            Notification::Complete => self.complete(),
            Notification::Fail(err) => self.fail(err),
        }
    }

    /// Cancels the sink on behalf of its consumer.
    pub fn cancel(&self) {
        self.inner.token.cancel();
    }

    /// Takes the terminal handlers and cancels the token, in that order.
    fn terminate(&self, reason: CancelReason) -> Option<Terminal> {
        if self.is_cancelled() {
            return None;
        }
        let terminal = std::mem::take(&mut *self.inner.terminal.borrow_mut());
        self.inner.token.cancel_with(reason).then_some(terminal)
    }
}

impl<T> Sink<T> {
    /// The sink's cancellation token.
    pub fn token(&self) -> &CancelToken {
        &self.inner.token
    }

    /// Shorthand for `token().is_cancelled()`.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// `true` if both handles refer to the same sink.
    pub fn ptr_eq(&self, other: &Sink<T>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Clone for Sink<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> From<Handlers<T>> for Sink<T> {
    fn from(handlers: Handlers<T>) -> Self {
        Sink::new(handlers)
    }
}

impl<T> fmt::Debug for Sink<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("token", &self.inner.token)
            .field("has_value_handler", &self.inner.on_value.is_some())
            .finish()
    }
}
