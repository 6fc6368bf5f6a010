use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::core::HubCore;
use super::{HubState, Multicast};
use crate::error::StreamError;
use crate::sink::Sink;

/// Multicast hub holding a current value, required at construction.
///
/// While open, a new subscriber receives the current value right after attaching.
/// After termination it receives only the terminal outcome.
///
/// # Example
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use pushflow::{CurrentHub, Multicast};
///
/// let temperature = CurrentHub::new(20);
/// temperature.value(21);
///
/// let seen = Rc::new(Cell::new(0));
/// let slot = seen.clone();
/// temperature.stream().subscribe(move |t| slot.set(t));
/// assert_eq!(seen.get(), 21);
/// assert_eq!(temperature.current().ok(), Some(21));
/// ```
pub struct CurrentHub<T> {
    core: Rc<HubCore<T>>,
    current: Rc<RefCell<T>>,
}

impl<T: Clone + 'static> CurrentHub<T> {
    /// Creates an open hub whose current value is `initial`.
    pub fn new(initial: T) -> Self {
        Self {
            core: HubCore::new(),
            current: Rc::new(RefCell::new(initial)),
        }
    }

    /// Returns the current value, or the failure once the hub failed.
    ///
    /// # Errors
    /// The hub's failure reason, if it failed.
    pub fn current(&self) -> Result<T, StreamError> {
        match self.core.state() {
            HubState::Failed(err) => Err(err),
            _ => Ok(self.current.borrow().clone()),
        }
    }
}

impl<T> Clone for CurrentHub<T> {
    fn clone(&self) -> Self {
        Self {
            core: Rc::clone(&self.core),
            current: Rc::clone(&self.current),
        }
    }
}

impl<T: Clone + 'static> Multicast<T> for CurrentHub<T> {
    fn value(&self, v: T) {
        if !self.core.is_open() {
            return;
        }
        *self.current.borrow_mut() = v.clone();
        self.core.dispatch(v);
    }

    fn complete(&self) {
        self.core.complete();
    }

    fn fail(&self, err: StreamError) {
        self.core.fail(err);
    }

    fn attach(&self, sink: Sink<T>) {
        if self.core.replay_terminal(&sink) {
            return;
        }
        self.core.register(&sink);
        if !sink.is_cancelled() {
            let current = self.current.borrow().clone();
            sink.value(current);
        }
    }

    fn state(&self) -> HubState {
        self.core.state()
    }

    fn member_count(&self) -> usize {
        self.core.member_count()
    }
}

impl<T: Clone + fmt::Debug + 'static> fmt::Debug for CurrentHub<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrentHub")
            .field("state", &self.core.state())
            .field("members", &self.core.member_count())
            .field("current", &*self.current.borrow())
            .finish()
    }
}
