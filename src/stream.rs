//! # Producer side of the protocol.
//!
//! [`Stream`] wraps a producer function `Fn(&Sink<T>) -> Result<(), StreamError>` and
//! runs it once per activation ("cold" semantics).
//!
//! ## Activation
//! ```text
//! activate(sink)
//!     ├─ sink already cancelled ──► return, producer never runs
//!     └─ producer(&sink)
//!            ├─ Ok(())   ──► nothing (producer drives the sink itself)
//!            ├─ Err(e)   ──► sink.fail(e)
//!            └─ panic    ──► sink.fail(StreamError::Panicked)
//! ```
//!
//! A producer may emit synchronously or defer to any external source (a timer, a
//! task spawned on a `LocalSet`, a hub). Producers that loop must poll
//! `sink.is_cancelled()` on every iteration.
//!
//! ## Example
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use pushflow::{Sink, Stream, StreamError};
//!
//! let numbers = Stream::new(|sink: &Sink<u32>| {
//!     for n in 1..=3 {
//!         if sink.is_cancelled() {
//!             break;
//!         }
//!         sink.value(n);
//!     }
//!     sink.complete();
//!     Ok::<_, StreamError>(())
//! });
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let log = seen.clone();
//! numbers.subscribe(move |n| log.borrow_mut().push(n));
//! numbers.subscribe(|_| {}); // independent second run
//!
//! assert_eq!(*seen.borrow(), vec![1, 2, 3]);
//! ```

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use crate::error::StreamError;
use crate::sink::{Handlers, Notification, Sink};

type Producer<T> = dyn Fn(&Sink<T>) -> Result<(), StreamError>;

/// Reusable, immutable stream template.
///
/// Cloning shares the producer function, not any execution state.
pub struct Stream<T> {
    producer: Rc<Producer<T>>,
}

impl<T: 'static> Stream<T> {
    /// Creates a stream from a producer function.
    pub fn new<F>(producer: F) -> Self
    where
        F: Fn(&Sink<T>) -> Result<(), StreamError> + 'static,
    {
        Self {
            producer: Rc::new(producer),
        }
    }

    /// Runs the producer against `sink`.
    ///
    /// Failures raised by the producer are routed into `sink.fail` and never
    /// reach the caller.
    pub fn activate(&self, sink: impl Into<Sink<T>>) {
        let sink = sink.into();
        if sink.is_cancelled() {
            return;
        }
        match panic::catch_unwind(AssertUnwindSafe(|| (self.producer)(&sink))) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => sink.fail(err),
            Err(payload) => sink.fail(StreamError::from_panic(payload)),
        }
    }

    /// Activates with a value-only sink and returns it for later cancellation.
    pub fn subscribe<F>(&self, f: F) -> Sink<T>
    where
        F: Fn(T) + 'static,
    {
        let sink = Sink::from_fn(f);
        self.activate(sink.clone());
        sink
    }

    /// Emits every notification of this stream as a value, then completes.
    ///
    /// The resulting stream never fails.
    pub fn materialize(&self) -> Stream<Notification<T>> {
        let source = self.clone();
        Stream::new(move |out: &Sink<Notification<T>>| {
            let (values, done, failed) = (out.clone(), out.clone(), out.clone());
            source.activate(
                Handlers::<T>::new()
                    .on_value(move |v| values.value(Notification::Value(v)))
                    .on_complete(move || {
                        done.value(Notification::Complete);
                        done.complete();
                    })
                    .on_fail(move |e| {
                        failed.value(Notification::Fail(e));
                        failed.complete();
                    })
                    .with_token(out.token().clone()),
            );
            Ok(())
        })
    }
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            producer: Rc::clone(&self.producer),
        }
    }
}

impl<T> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream").finish_non_exhaustive()
    }
}
