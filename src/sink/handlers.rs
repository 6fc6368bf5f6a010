//! # Handler record used to build a [`Sink`](crate::Sink).
//!
//! [`Handlers`] bundles the three optional callbacks plus an optional external
//! [`CancelToken`] to link against.
//!
//! ## Example
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use pushflow::{Handlers, Sink};
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let log = seen.clone();
//!
//! let sink: Sink<i32> = Handlers::new()
//!     .on_value(move |v| log.borrow_mut().push(v))
//!     .on_complete(|| {})
//!     .into();
//!
//! sink.value(1);
//! sink.complete();
//! sink.value(2);
//! assert_eq!(*seen.borrow(), vec![1]);
//! ```

use std::rc::Rc;

use crate::cancel::CancelToken;
use crate::error::StreamError;

pub(crate) type ValueFn<T> = Rc<dyn Fn(T)>;
pub(crate) type CompleteFn = Box<dyn FnOnce()>;
pub(crate) type FailFn = Box<dyn FnOnce(StreamError)>;

/// Optional callbacks for a sink.
///
/// The value handler is `Fn` (not `FnMut`): a handler may re-enter the sink it is
/// attached to, so it cannot hold an exclusive borrow of its own state. Use
/// `Cell`/`RefCell` inside the closure for mutation.
pub struct Handlers<T> {
    pub(crate) on_value: Option<ValueFn<T>>,
    pub(crate) on_complete: Option<CompleteFn>,
    pub(crate) on_fail: Option<FailFn>,
    pub(crate) token: Option<CancelToken>,
}

impl<T> Handlers<T> {
    /// Creates an empty record (a silent sink).
    pub fn new() -> Self {
        Self {
            on_value: None,
            on_complete: None,
            on_fail: None,
            token: None,
        }
    }

    /// Sets the value handler.
    pub fn on_value<F>(mut self, f: F) -> Self
    where
        F: Fn(T) + 'static,
    {
        self.on_value = Some(Rc::new(f));
        self
    }

    /// Sets the completion handler.
    pub fn on_complete<F>(mut self, f: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        self.on_complete = Some(Box::new(f));
        self
    }

    /// Sets the failure handler.
    ///
    /// Without one, failures are escalated out of band.
    pub fn on_fail<F>(mut self, f: F) -> Self
    where
        F: FnOnce(StreamError) + 'static,
    {
        self.on_fail = Some(Box::new(f));
        self
    }

    /// Links the sink to an external token: cancelling `token` cancels the sink.
    pub fn with_token(mut self, token: CancelToken) -> Self {
        self.token = Some(token);
        self
    }
}

impl<T> Default for Handlers<T> {
    fn default() -> Self {
        Self::new()
    }
}
