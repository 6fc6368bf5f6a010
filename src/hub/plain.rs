use std::fmt;
use std::rc::Rc;

use super::core::HubCore;
use super::{HubState, Multicast};
use crate::error::StreamError;
use crate::sink::Sink;

/// Multicast hub without value retention.
///
/// Late subscribers never see values dispatched before they attached; after
/// termination they receive the terminal outcome synchronously and are not registered.
pub struct Hub<T> {
    core: Rc<HubCore<T>>,
}

impl<T: Clone + 'static> Hub<T> {
    /// Creates an open hub with no members.
    pub fn new() -> Self {
        Self {
            core: HubCore::new(),
        }
    }
}

impl<T: Clone + 'static> Default for Hub<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Hub<T> {
    fn clone(&self) -> Self {
        Self {
            core: Rc::clone(&self.core),
        }
    }
}

impl<T: Clone + 'static> Multicast<T> for Hub<T> {
    fn value(&self, v: T) {
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
    }

    fn state(&self) -> HubState {
        self.core.state()
    }

    fn member_count(&self) -> usize {
        self.core.member_count()
    }
}

impl<T: Clone + 'static> fmt::Debug for Hub<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hub")
            .field("state", &self.core.state())
            .field("members", &self.core.member_count())
            .finish()
    }
}
