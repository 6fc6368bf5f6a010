//! # Flattening combinators.
//!
//! Each combinator projects the values of an outer [`Stream`] into inner streams and
//! reduces them to one output stream. They differ only in the inner-subscription policy:
//!
//! | Method                          | Policy                                                     |
//! |---------------------------------|------------------------------------------------------------|
//! | [`Stream::merge_map`]           | activate every inner at once                                |
//! | [`Stream::merge_map_with`]      | at most `limit` inners; the rest wait in a FIFO queue       |
//! | [`Stream::concat_map`]          | one inner at a time, FIFO                                   |
//! | [`Stream::switch_map`]          | a new outer value cancels the active inner                  |
//! | [`Stream::exhaust_map`]         | outer values arriving while an inner is active are dropped  |
//! | [`Stream::expand`]              | every emitted value is projected again, recursively         |
//!
//! ## Architecture
//! ```text
//!            output sink (token T)
//!           ┌─────────┴───────────────────────────┐
//!  outer sink (linked to T)            inner sinks (each linked to T)
//!           │ value(v)                            ▲
//!           └──► project(v, index) ── Stream ─────┘ activate
//! ```
//!
//! ## Rules
//! - The projection receives the value and its positional index within one activation.
//! - A projection returning `Err` or panicking fails the output.
//! - The first failure (outer, inner, or projection) fails the output; every other
//!   subscription is linked to the output token and stops with it.
//! - Cancelling the output cancels the outer and every active inner exactly once.
//! - The output completes once the outer completed and no inner is active or queued.

mod exhaust;
mod merge;
mod switch;

use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use crate::error::{StreamError, UsageError};
use crate::stream::Stream;

use merge::{Expansion, Merger};

pub(crate) type Project<T, U> = Rc<dyn Fn(T, usize) -> Result<Stream<U>, StreamError>>;

/// Runs the projection inside a failure boundary.
pub(crate) fn try_project<T, U>(
    project: &Project<T, U>,
    value: T,
    index: usize,
) -> Result<Stream<U>, StreamError> {
    let result = match panic::catch_unwind(AssertUnwindSafe(|| project(value, index))) {
        Ok(result) => result,
        Err(payload) => Err(StreamError::from_panic(payload)),
    };
    if let Err(err) = &result {
        tracing::debug!(index, error = err.as_label(), "projection failed");
    }
    result
}

impl<T: 'static> Stream<T> {
    /// Projects every value and merges all inner streams concurrently.
    ///
    /// # Example
    /// ```rust
    /// use std::cell::RefCell;
    /// use std::rc::Rc;
    /// use pushflow::{Sink, Stream, StreamError};
    ///
    /// let words = Stream::new(|sink: &Sink<&'static str>| {
    ///     sink.value("ab");
    ///     sink.value("cd");
    ///     sink.complete();
    ///     Ok(())
    /// });
    /// let letters = words.merge_map(|word, _| {
    ///     Ok::<_, StreamError>(Stream::new(move |sink: &Sink<char>| {
    ///         word.chars().for_each(|c| sink.value(c));
    ///         sink.complete();
    ///         Ok(())
    ///     }))
    /// });
    ///
    /// let seen = Rc::new(RefCell::new(String::new()));
    /// let log = seen.clone();
    /// letters.subscribe(move |c| log.borrow_mut().push(c));
    /// assert_eq!(*seen.borrow(), "abcd");
    /// ```
    pub fn merge_map<U, F>(&self, project: F) -> Stream<U>
    where
        U: 'static,
        F: Fn(T, usize) -> Result<Stream<U>, StreamError> + 'static,
    {
        Merger::stream(self.clone(), Rc::new(project), usize::MAX, None)
    }

    /// Like [`merge_map`](Stream::merge_map) with at most `limit` active inners.
    ///
    /// Outer values beyond the limit are queued and activated in arrival order.
    ///
    /// # Errors
    /// [`UsageError::ZeroConcurrency`] when `limit == 0`.
    pub fn merge_map_with<U, F>(&self, limit: usize, project: F) -> Result<Stream<U>, UsageError>
    where
        U: 'static,
        F: Fn(T, usize) -> Result<Stream<U>, StreamError> + 'static,
    {
        if limit == 0 {
            return Err(UsageError::ZeroConcurrency { limit });
        }
        Ok(Merger::stream(self.clone(), Rc::new(project), limit, None))
    }

    /// Projects every value and activates the inners one after another.
    pub fn concat_map<U, F>(&self, project: F) -> Stream<U>
    where
        U: 'static,
        F: Fn(T, usize) -> Result<Stream<U>, StreamError> + 'static,
    {
        Merger::stream(self.clone(), Rc::new(project), 1, None)
    }

    /// Projects every value; each new inner replaces (cancels) the active one.
    pub fn switch_map<U, F>(&self, project: F) -> Stream<U>
    where
        U: 'static,
        F: Fn(T, usize) -> Result<Stream<U>, StreamError> + 'static,
    {
        switch::stream(self.clone(), Rc::new(project))
    }

    /// Projects a value only while no inner is active; other values are dropped.
    pub fn exhaust_map<U, F>(&self, project: F) -> Stream<U>
    where
        U: 'static,
        F: Fn(T, usize) -> Result<Stream<U>, StreamError> + 'static,
    {
        exhaust::stream(self.clone(), Rc::new(project))
    }
}

impl<T: Clone + 'static> Stream<T> {
    /// Emits every value and projects it again, recursively, merging every inner.
    ///
    /// One index counter is shared by every recursion level of an activation.
    ///
    /// # Example
    /// ```rust
    /// use std::cell::RefCell;
    /// use std::rc::Rc;
    /// use pushflow::{Sink, Stream, StreamError};
    ///
    /// let one = Stream::new(|sink: &Sink<u32>| {
    ///     sink.value(1);
    ///     sink.complete();
    ///     Ok(())
    /// });
    /// let powers = one.expand(|n, _| {
    ///     Ok::<_, StreamError>(Stream::new(move |sink: &Sink<u32>| {
    ///         if n < 8 {
    ///             sink.value(n * 2);
    ///         }
    ///         sink.complete();
    ///         Ok(())
    ///     }))
    /// });
    ///
    /// let seen = Rc::new(RefCell::new(Vec::new()));
    /// let log = seen.clone();
    /// powers.subscribe(move |n| log.borrow_mut().push(n));
    /// assert_eq!(*seen.borrow(), vec![1, 2, 4, 8]);
    /// ```
    pub fn expand<F>(&self, project: F) -> Stream<T>
    where
        F: Fn(T, usize) -> Result<Stream<T>, StreamError> + 'static,
    {
        Merger::stream(
            self.clone(),
            Rc::new(project),
            usize::MAX,
            Some(Expansion::identity()),
        )
    }

    /// Like [`expand`](Stream::expand) with at most `limit` active inners.
    ///
    /// # Errors
    /// [`UsageError::ZeroConcurrency`] when `limit == 0`.
    pub fn expand_with<F>(&self, limit: usize, project: F) -> Result<Stream<T>, UsageError>
    where
        F: Fn(T, usize) -> Result<Stream<T>, StreamError> + 'static,
    {
        if limit == 0 {
            return Err(UsageError::ZeroConcurrency { limit });
        }
        Ok(Merger::stream(
            self.clone(),
            Rc::new(project),
            limit,
            Some(Expansion::identity()),
        ))
    }
}

impl<U: 'static> Stream<Stream<U>> {
    /// Merges every inner stream concurrently.
    pub fn merge_all(&self) -> Stream<U> {
        self.merge_map(|inner, _| Ok(inner))
    }

    /// Activates the inner streams one after another.
    pub fn concat_all(&self) -> Stream<U> {
        self.concat_map(|inner, _| Ok(inner))
    }

    /// Follows only the most recent inner stream.
    pub fn switch_all(&self) -> Stream<U> {
        self.switch_map(|inner, _| Ok(inner))
    }

    /// Follows an inner stream to its end, dropping the ones arriving meanwhile.
    pub fn exhaust_all(&self) -> Stream<U> {
        self.exhaust_map(|inner, _| Ok(inner))
    }
}
