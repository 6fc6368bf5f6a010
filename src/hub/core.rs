//! # Membership and terminal state shared by every hub variant.
//!
//! ## Architecture
//! ```text
//! attach(sink) ──► members: BTreeMap<id, Sink>  ──(lazy rebuild)──► snapshot: Rc<[Sink]>
//!                      ▲                                                  │
//!      token.on_cancel ─┘ (auto-detach, invalidates)      dispatch iterates ┘ the frozen copy
//! ```
//!
//! ## Rules
//! - The snapshot is rebuilt only after membership changed.
//! - Every multicast iterates the snapshot taken when it started, never the live set,
//!   so attach/detach from inside a handler takes effect with the next dispatch.
//! - Once terminal, sinks are never added to the membership set.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use super::HubState;
use crate::error::StreamError;
use crate::report::{self, Unhandled, UnhandledKind};
use crate::sink::Sink;

pub(crate) struct HubCore<T> {
    members: RefCell<BTreeMap<u64, Sink<T>>>,
    snapshot: RefCell<Option<Rc<[Sink<T>]>>>,
    next_id: Cell<u64>,
    state: RefCell<HubState>,
}

impl<T: 'static> HubCore<T> {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self {
            members: RefCell::new(BTreeMap::new()),
            snapshot: RefCell::new(None),
            next_id: Cell::new(0),
            state: RefCell::new(HubState::Open),
        })
    }

    pub(crate) fn state(&self) -> HubState {
        self.state.borrow().clone()
    }

    pub(crate) fn is_open(&self) -> bool {
        matches!(*self.state.borrow(), HubState::Open)
    }

    pub(crate) fn member_count(&self) -> usize {
        self.members.borrow().len()
    }

    /// Adds `sink` to the membership set; it leaves the set when its token cancels.
    pub(crate) fn register(self: &Rc<Self>, sink: &Sink<T>) {
        if sink.is_cancelled() || !self.is_open() {
            return;
        }
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.members.borrow_mut().insert(id, sink.clone());
        self.invalidate();

        let weak = Rc::downgrade(self);
        sink.token().on_cancel(move |_| {
            if let Some(core) = weak.upgrade() {
                core.deregister(id);
            }
        });
    }

    fn deregister(&self, id: u64) {
        let removed = self.members.borrow_mut().remove(&id);
        if removed.is_some() {
            self.invalidate();
        }
    }

    fn invalidate(&self) {
        self.snapshot.borrow_mut().take();
    }

    pub(crate) fn snapshot(&self) -> Rc<[Sink<T>]> {
        let cached = self.snapshot.borrow().clone();
        if let Some(snapshot) = cached {
            return snapshot;
        }
        let fresh: Rc<[Sink<T>]> = self.members.borrow().values().cloned().collect();
        *self.snapshot.borrow_mut() = Some(Rc::clone(&fresh));
        fresh
    }

    /// Delivers the terminal outcome to a late sink. Returns `false` while open.
    pub(crate) fn replay_terminal(&self, sink: &Sink<T>) -> bool {
        let state = self.state();
        match state {
            HubState::Open => false,
            HubState::Completed => {
                sink.complete();
                true
            }
            HubState::Failed(err) => {
                sink.fail(err);
                true
            }
        }
    }

    /// Transitions out of `Open` once and returns the members at that moment.
    pub(crate) fn close(&self, next: HubState) -> Option<Rc<[Sink<T>]>> {
        {
            let mut state = self.state.borrow_mut();
            if !matches!(*state, HubState::Open) {
                return None;
            }
            *state = next;
        }
        let snapshot = self.snapshot();
        tracing::debug!(
            state = self.state.borrow().as_label(),
            members = snapshot.len(),
            "hub terminated"
        );
        Some(snapshot)
    }

    pub(crate) fn complete(&self) {
        if let Some(members) = self.close(HubState::Completed) {
            for sink in members.iter() {
                sink.complete();
            }
        }
    }

    pub(crate) fn fail(&self, err: StreamError) {
        let Some(members) = self.close(HubState::Failed(err.clone())) else {
            return;
        };
        if members.is_empty() {
            report::escalate(Unhandled::new(UnhandledKind::NoHubMembers, err.clone()));
        }
        for sink in members.iter() {
            sink.fail(err.clone());
        }
    }
}

impl<T: Clone + 'static> HubCore<T> {
    pub(crate) fn dispatch(&self, v: T) {
        if !self.is_open() {
            return;
        }
        let members = self.snapshot();
        for sink in members.iter() {
            sink.value(v.clone());
        }
    }
}
