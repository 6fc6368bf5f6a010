//! # Hub replaying the last N values.
//!
//! ## Example
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use pushflow::{Multicast, ReplayHub};
//!
//! let hub = ReplayHub::new(2)?;
//! hub.value(1);
//! hub.value(2);
//! hub.value(3);
//! hub.complete();
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let log = seen.clone();
//! hub.stream().subscribe(move |v: i32| log.borrow_mut().push(v));
//! assert_eq!(*seen.borrow(), vec![2, 3]);
//! # Ok::<(), pushflow::UsageError>(())
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use super::core::HubCore;
use super::{HubState, Multicast};
use crate::error::{StreamError, UsageError};
use crate::sink::Sink;

/// Multicast hub that replays up to `capacity` recent values to late subscribers,
/// oldest evicted first.
///
/// A late subscriber is attached first (while open), then receives the buffered
/// values, then the terminal outcome if the hub already terminated.
pub struct ReplayHub<T> {
    core: Rc<HubCore<T>>,
    buffer: Rc<RefCell<VecDeque<T>>>,
    capacity: usize,
}

impl<T: Clone + 'static> ReplayHub<T> {
    /// Creates a hub keeping the last `capacity` values.
    ///
    /// # Errors
    /// [`UsageError::ZeroReplayCapacity`] when `capacity == 0`.
    pub fn new(capacity: usize) -> Result<Self, UsageError> {
        if capacity == 0 {
            return Err(UsageError::ZeroReplayCapacity { capacity });
        }
        Ok(Self {
            core: HubCore::new(),
            buffer: Rc::new(RefCell::new(VecDeque::new())),
            capacity,
        })
    }

    /// Creates a hub that replays every value it ever received.
    pub fn unbounded() -> Self {
        Self {
            core: HubCore::new(),
            buffer: Rc::new(RefCell::new(VecDeque::new())),
            capacity: usize::MAX,
        }
    }

    /// Maximum number of retained values.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of values currently retained.
    pub fn buffered(&self) -> usize {
        self.buffer.borrow().len()
    }
}

impl<T> Clone for ReplayHub<T> {
    fn clone(&self) -> Self {
        Self {
            core: Rc::clone(&self.core),
            buffer: Rc::clone(&self.buffer),
            capacity: self.capacity,
        }
    }
}

impl<T: Clone + 'static> Multicast<T> for ReplayHub<T> {
    fn value(&self, v: T) {
        if !self.core.is_open() {
            return;
        }
        {
            let mut buffer = self.buffer.borrow_mut();
            buffer.push_back(v.clone());
            while buffer.len() > self.capacity {
                buffer.pop_front();
            }
        }
        self.core.dispatch(v);
    }

    fn complete(&self) {
        self.core.complete();
    }

    fn fail(&self, err: StreamError) {
        self.core.fail(err);
    }

    fn attach(&self, sink: Sink<T>) {
        self.core.register(&sink);

        let replay: Vec<T> = self.buffer.borrow().iter().cloned().collect();
        for v in replay {
            if sink.is_cancelled() {
                return;
            }
            sink.value(v);
        }
        self.core.replay_terminal(&sink);
    }

    fn state(&self) -> HubState {
        self.core.state()
    }

    fn member_count(&self) -> usize {
        self.core.member_count()
    }
}

impl<T: Clone + 'static> fmt::Debug for ReplayHub<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplayHub")
            .field("state", &self.core.state())
            .field("members", &self.core.member_count())
            .field("buffered", &self.buffered())
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{capture_reports, Recorder};

    #[test]
    fn test_zero_capacity_is_rejected() {
        let err = ReplayHub::<u8>::new(0).unwrap_err();
        assert_eq!(err, UsageError::ZeroReplayCapacity { capacity: 0 });
    }

    #[test]
    fn test_late_subscriber_sees_last_two_then_complete() {
        let hub = ReplayHub::<i32>::new(2).unwrap();
        hub.value(1);
        hub.value(2);
        hub.value(3);
        hub.complete();

        let rec = Recorder::<i32>::new();
        hub.activate(rec.sink());
        assert_eq!(rec.values(), vec![2, 3]);
        assert!(rec.completed());
        assert_eq!(hub.member_count(), 0);
    }

    #[test]
    fn test_subscriber_joining_while_open_gets_replay_then_live_values() {
        let hub = ReplayHub::<i32>::new(3).unwrap();
        hub.value(1);
        hub.value(2);

        let rec = Recorder::<i32>::new();
        hub.activate(rec.sink());
        hub.value(3);

        assert_eq!(rec.values(), vec![1, 2, 3]);
        assert_eq!(hub.buffered(), 3);
        assert_eq!(hub.member_count(), 1);
    }

    #[test]
    fn test_failed_hub_replays_values_then_failure() {
        let (_guard, _reports) = capture_reports();
        let hub = ReplayHub::<&str>::unbounded();
        hub.value("a");
        hub.value("b");
        hub.fail(StreamError::msg("gone"));
        hub.value("c");

        let rec = Recorder::<&str>::new();
        hub.activate(rec.sink());
        assert_eq!(rec.values(), vec!["a", "b"]);
        assert!(rec.failure().is_some());
    }

    #[test]
    fn test_replay_stops_when_sink_cancels_itself() {
        let hub = ReplayHub::<u32>::new(5).unwrap();
        for v in 0..5 {
            hub.value(v);
        }

        let seen = Rc::new(RefCell::new(Vec::new()));
        let slot: Rc<RefCell<Option<Sink<u32>>>> = Rc::new(RefCell::new(None));
        let (log, me) = (seen.clone(), slot.clone());
        let sink = Sink::from_fn(move |v| {
            log.borrow_mut().push(v);
            if v == 1 {
                if let Some(s) = me.borrow().as_ref() {
                    s.cancel();
                }
            }
        });
        *slot.borrow_mut() = Some(sink.clone());

        hub.activate(sink);
        assert_eq!(*seen.borrow(), vec![0, 1]);
        assert_eq!(hub.member_count(), 0);
    }
}
