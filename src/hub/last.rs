use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::core::HubCore;
use super::{HubState, Multicast};
use crate::error::StreamError;
use crate::sink::Sink;

/// Multicast hub that releases only its final value, at completion.
///
/// Values are stored, not dispatched. `complete()` delivers the last stored value
/// (if any) to every member and then completes them; late subscribers get the same
/// pair. A failure discards the stored value.
///
/// # Example
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use pushflow::{FinalHub, Multicast};
///
/// let total = FinalHub::new();
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let log = seen.clone();
/// total.stream().subscribe(move |v: u64| log.borrow_mut().push(v));
///
/// total.value(10);
/// total.value(30);
/// assert!(seen.borrow().is_empty());
///
/// total.complete();
/// assert_eq!(*seen.borrow(), vec![30]);
/// ```
pub struct FinalHub<T> {
    core: Rc<HubCore<T>>,
    last: Rc<RefCell<Option<T>>>,
}

impl<T: Clone + 'static> FinalHub<T> {
    /// Creates an open hub with no stored value.
    pub fn new() -> Self {
        Self {
            core: HubCore::new(),
            last: Rc::new(RefCell::new(None)),
        }
    }
}

impl<T: Clone + 'static> Default for FinalHub<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for FinalHub<T> {
    fn clone(&self) -> Self {
        Self {
            core: Rc::clone(&self.core),
            last: Rc::clone(&self.last),
        }
    }
}

impl<T: Clone + 'static> Multicast<T> for FinalHub<T> {
    fn value(&self, v: T) {
        if self.core.is_open() {
            *self.last.borrow_mut() = Some(v);
        }
    }

    fn complete(&self) {
        let Some(members) = self.core.close(HubState::Completed) else {
            return;
        };
        let last = self.last.borrow().clone();
        if let Some(v) = last {
            for sink in members.iter() {
                sink.value(v.clone());
            }
        }
        for sink in members.iter() {
            sink.complete();
        }
    }

    fn fail(&self, err: StreamError) {
        if self.core.is_open() {
            self.last.borrow_mut().take();
        }
        self.core.fail(err);
    }

    fn attach(&self, sink: Sink<T>) {
        if matches!(self.core.state(), HubState::Completed) {
            let last = self.last.borrow().clone();
            if let Some(v) = last {
                sink.value(v);
            }
            sink.complete();
            return;
        }
        if self.core.replay_terminal(&sink) {
            return;
        }
        self.core.register(&sink);
    }

    fn state(&self) -> HubState {
        self.core.state()
    }

    fn member_count(&self) -> usize {
        self.core.member_count()
    }
}

impl<T: Clone + 'static> fmt::Debug for FinalHub<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinalHub")
            .field("state", &self.core.state())
            .field("members", &self.core.member_count())
            .field("has_value", &self.last.borrow().is_some())
            .finish()
    }
}
