//! # Hubs: one upstream, many downstream sinks.
//!
//! A hub is simultaneously a sink (it ingests values from a single producer) and a
//! stream (it multicasts to any number of sinks). Unlike [`Stream`], activation does
//! not start a new producer run: all attached sinks share one ("hot").
//!
//! ## Variants
//! | Type            | Late subscriber receives                                   |
//! |-----------------|------------------------------------------------------------|
//! | [`Hub`]         | only the terminal outcome, if any                          |
//! | [`ReplayHub`]   | the last N values, then the terminal outcome               |
//! | [`CurrentHub`]  | the current value (while open), or the terminal outcome    |
//! | [`FinalHub`]    | nothing until completion; then the final value + complete  |
//!
//! ## Example
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use pushflow::{Hub, Multicast};
//!
//! let hub = Hub::new();
//! let (a, b) = (Rc::new(RefCell::new(Vec::new())), Rc::new(RefCell::new(Vec::new())));
//!
//! let log = a.clone();
//! hub.stream().subscribe(move |v: i32| log.borrow_mut().push(v));
//! let log = b.clone();
//! hub.stream().subscribe(move |v: i32| log.borrow_mut().push(v * 10));
//!
//! hub.value(1);
//! hub.value(2);
//! hub.complete();
//!
//! assert_eq!(*a.borrow(), vec![1, 2]);
//! assert_eq!(*b.borrow(), vec![10, 20]);
//! assert_eq!(hub.member_count(), 0);
//! ```

mod core;
mod current;
mod last;
mod plain;
mod replay;

pub use current::CurrentHub;
pub use last::FinalHub;
pub use plain::Hub;
pub use replay::ReplayHub;

use crate::error::StreamError;
use crate::sink::{Handlers, Sink};
use crate::stream::Stream;

/// Terminal state of a hub.
#[derive(Debug, Clone)]
pub enum HubState {
    /// Still accepting values.
    Open,
    /// Completed; late subscribers are completed immediately.
    Completed,
    /// Failed; late subscribers are failed immediately with the same reason.
    Failed(StreamError),
}

impl HubState {
    /// `true` for `Completed` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, HubState::Open)
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            HubState::Open => "open",
            HubState::Completed => "completed",
            HubState::Failed(_) => "failed",
        }
    }
}

/// Common surface of every hub variant.
///
/// The upstream producer drives [`value`](Multicast::value),
/// [`complete`](Multicast::complete) and [`fail`](Multicast::fail);
/// downstream consumers [`attach`](Multicast::attach).
pub trait Multicast<T: Clone + 'static>: Clone + 'static {
    /// Multicasts a value to every attached sink. Ignored once terminal.
    fn value(&self, v: T);

    /// Completes the hub and every attached sink. Only the first terminal call counts.
    fn complete(&self);

    /// Fails the hub and every attached sink. Only the first terminal call counts.
    ///
    /// With no sink attached, the failure is also escalated out of band.
    fn fail(&self, err: StreamError);

    /// Attaches a sink; it detaches itself when its token cancels.
    fn attach(&self, sink: Sink<T>);

    /// Current terminal state.
    fn state(&self) -> HubState;

    /// Number of currently attached sinks.
    fn member_count(&self) -> usize;

    /// Attaches anything convertible into a sink.
    fn activate(&self, sink: impl Into<Sink<T>>)
    where
        Self: Sized,
    {
        self.attach(sink.into());
    }

    /// A sink forwarding every notification into this hub.
    ///
    /// Use it to connect an upstream stream: `source.activate(hub.sink())`.
    fn sink(&self) -> Sink<T> {
        let (values, done, failed) = (self.clone(), self.clone(), self.clone());
        Sink::new(
            Handlers::<T>::new()
                .on_value(move |v| values.value(v))
                .on_complete(move || done.complete())
                .on_fail(move |e| failed.fail(e)),
        )
    }

    /// This hub as a [`Stream`]: every activation attaches the sink.
    fn stream(&self) -> Stream<T> {
        let hub = self.clone();
        Stream::new(move |sink: &Sink<T>| {
            hub.attach(sink.clone());
            Ok(())
        })
    }
}
