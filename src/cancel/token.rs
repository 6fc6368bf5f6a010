//! # Cancellation token with ordered one-shot callbacks.
//!
//! [`CancelToken`] is a reference-counted, single-threaded switch. It carries the
//! reason of its transition and an ordered list of callbacks. Each token also owns a
//! [`tokio_util::sync::CancellationToken`] cancelled in the same transition, so
//! producers that defer work onto a runtime can `select!` on it.
//!
//! ## Example
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use pushflow::{CancelReason, CancelToken};
//!
//! let parent = CancelToken::new();
//! let child = CancelToken::linked([&parent]);
//!
//! let fired = Rc::new(Cell::new(0));
//! let seen = fired.clone();
//! child.on_cancel(move |_| seen.set(seen.get() + 1));
//!
//! parent.cancel();
//! parent.cancel();
//!
//! assert!(child.is_cancelled());
//! assert!(matches!(child.reason(), Some(CancelReason::Requested)));
//! assert_eq!(fired.get(), 1);
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

use crate::error::StreamError;

/// Why a token transitioned to cancelled.
#[derive(Debug, Clone)]
pub enum CancelReason {
    /// The consumer (or a combinator acting for it) asked to stop.
    Requested,
    /// The owning sink completed.
    Completed,
    /// The owning sink failed.
    Failed(StreamError),
}

/// Handle to a pending callback, used with [`CancelToken::off`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration(u64);

type Callback = Box<dyn FnOnce(&CancelReason)>;

struct Inner {
    reason: RefCell<Option<CancelReason>>,
    callbacks: RefCell<Vec<(u64, Callback)>>,
    next_id: Cell<u64>,
    /// Parents this token is linked to, with the callback registered on each.
    /// Held weakly: each parent's callback owns the child until one side cancels.
    parents: RefCell<Vec<(Weak<Inner>, Registration)>>,
    signal: CancellationToken,
}

/// Single-transition cancellation switch.
///
/// Cloning yields another handle to the same token.
#[derive(Clone)]
pub struct CancelToken {
    inner: Rc<Inner>,
}

impl CancelToken {
    /// Creates a fresh, not-cancelled token.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(Inner {
                reason: RefCell::new(None),
                callbacks: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
                parents: RefCell::new(Vec::new()),
                signal: CancellationToken::new(),
            }),
        }
    }

    /// Creates a token that cancels as soon as any parent cancels.
    ///
    /// The child inherits the reason of the parent that cancelled it.
    /// If a parent is already cancelled, the child starts cancelled.
    ///
    /// Every parent keeps the child alive until either of them cancels, so callbacks
    /// registered on a child nobody else holds still fire.
    pub fn linked<'a, I>(parents: I) -> Self
    where
        I: IntoIterator<Item = &'a CancelToken>,
    {
        let child = Self::new();
        for parent in parents {
            if let Some(reason) = parent.reason() {
                child.cancel_with(reason);
                break;
            }
            let target = child.clone();
            let registration = parent.on_cancel(move |reason| {
                target.cancel_with(reason.clone());
            });
            child
                .inner
                .parents
                .borrow_mut()
                .push((Rc::downgrade(&parent.inner), registration));
        }
        child
    }

    /// Returns `true` once the token has transitioned.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.reason.borrow().is_some()
    }

    /// Returns the reason of the transition, if any.
    pub fn reason(&self) -> Option<CancelReason> {
        self.inner.reason.borrow().clone()
    }

    /// Cancels with [`CancelReason::Requested`].
    pub fn cancel(&self) {
        self.cancel_with(CancelReason::Requested);
    }

    /// Cancels with an explicit reason.
    ///
    /// Returns `true` only for the call that performed the transition.
    pub fn cancel_with(&self, reason: CancelReason) -> bool {
        {
            let mut slot = self.inner.reason.borrow_mut();
            if slot.is_some() {
                return false;
            }
            *slot = Some(reason.clone());
        }
        self.inner.signal.cancel();

        let parents = std::mem::take(&mut *self.inner.parents.borrow_mut());
        for (parent, registration) in parents {
            if let Some(inner) = parent.upgrade() {
                CancelToken { inner }.off(registration);
            }
        }

        let callbacks = std::mem::take(&mut *self.inner.callbacks.borrow_mut());
        for (_, callback) in callbacks {
            callback(&reason);
        }
        true
    }

    /// Registers a one-shot callback fired at the transition.
    ///
    /// On an already cancelled token the callback runs immediately.
    pub fn on_cancel<F>(&self, f: F) -> Registration
    where
        F: FnOnce(&CancelReason) + 'static,
    {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);

        let reason = self.reason();
        match reason {
            Some(reason) => f(&reason),
            None => self.inner.callbacks.borrow_mut().push((id, Box::new(f))),
        }
        Registration(id)
    }

    /// Removes a pending callback. Returns `false` if it already fired or was removed.
    pub fn off(&self, registration: Registration) -> bool {
        let removed = {
            let mut callbacks = self.inner.callbacks.borrow_mut();
            callbacks
                .iter()
                .position(|(id, _)| *id == registration.0)
                .map(|pos| callbacks.remove(pos))
        };
        // dropped outside the borrow: the closure may own another handle to this token
        removed.is_some()
    }

    /// Number of callbacks still waiting for the transition.
    pub fn pending_callbacks(&self) -> usize {
        self.inner.callbacks.borrow().len()
    }

    /// Resolves when the token is cancelled.
    ///
    /// The future is owned, so it can be moved into a task spawned on a `LocalSet`.
    pub fn cancelled(&self) -> WaitForCancellationFutureOwned {
        self.inner.signal.clone().cancelled_owned()
    }

    /// Returns the tokio token mirroring this one.
    pub fn signal(&self) -> CancellationToken {
        self.inner.signal.clone()
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("reason", &*self.inner.reason.borrow())
            .field("pending", &self.pending_callbacks())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_callbacks_fire_once_in_registration_order() {
        let token = CancelToken::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let log = log.clone();
            token.on_cancel(move |_| log.borrow_mut().push(i));
        }

        assert!(token.cancel_with(CancelReason::Completed));
        assert!(!token.cancel_with(CancelReason::Requested));

        assert_eq!(*log.borrow(), vec![0, 1, 2]);
        assert!(matches!(token.reason(), Some(CancelReason::Completed)));
        assert_eq!(token.pending_callbacks(), 0);
    }

    #[test]
    fn test_on_cancel_after_transition_runs_immediately() {
        let token = CancelToken::new();
        token.cancel();

        let hit = Rc::new(Cell::new(false));
        let flag = hit.clone();
        token.on_cancel(move |_| flag.set(true));
        assert!(hit.get());
    }

    #[test]
    fn test_off_removes_pending_callback() {
        let token = CancelToken::new();
        let hit = Rc::new(Cell::new(false));
        let flag = hit.clone();
        let registration = token.on_cancel(move |_| flag.set(true));

        assert!(token.off(registration));
        assert!(!token.off(registration));
        token.cancel();
        assert!(!hit.get());
    }

    #[test]
    fn test_linked_cancels_when_any_parent_cancels() {
        let a = CancelToken::new();
        let b = CancelToken::new();
        let child = CancelToken::linked([&a, &b]);

        b.cancel_with(CancelReason::Failed(StreamError::msg("b")));
        assert!(child.is_cancelled());
        assert!(matches!(child.reason(), Some(CancelReason::Failed(_))));
        assert!(!a.is_cancelled());
        // the child unlinked itself from the surviving parent
        assert_eq!(a.pending_callbacks(), 0);
    }

    #[test]
    fn test_linked_to_cancelled_parent_starts_cancelled() {
        let parent = CancelToken::new();
        parent.cancel();
        let child = CancelToken::linked([&parent]);
        assert!(child.is_cancelled());
    }

    #[test]
    fn test_child_cancel_does_not_reach_parent() {
        let parent = CancelToken::new();
        let child = CancelToken::linked([&parent]);
        child.cancel();
        assert!(!parent.is_cancelled());
        assert_eq!(parent.pending_callbacks(), 0);
    }

    #[test]
    fn test_unheld_child_still_fires_callbacks() {
        let parent = CancelToken::new();
        let fired = Rc::new(Cell::new(false));
        {
            let child = CancelToken::linked([&parent]);
            let flag = fired.clone();
            child.on_cancel(move |reason| flag.set(matches!(reason, CancelReason::Requested)));
        }
        assert_eq!(parent.pending_callbacks(), 1);

        parent.cancel();
        assert!(fired.get());
    }

    #[test]
    fn test_parent_releases_child_at_transition() {
        let parent = CancelToken::new();
        let child = CancelToken::linked([&parent]);
        let weak = Rc::downgrade(&child.inner);
        drop(child);
        assert!(weak.upgrade().is_some());

        parent.cancel();
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_dropped_parent_releases_linked_child() {
        let parent = CancelToken::new();
        let child = CancelToken::linked([&parent]);
        let weak = Rc::downgrade(&child.inner);
        drop(child);
        drop(parent);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_callback_reentering_token_sees_cancelled_state() {
        let token = CancelToken::new();
        let observed = Rc::new(Cell::new(false));
        let (probe, flag) = (token.clone(), observed.clone());
        token.on_cancel(move |_| flag.set(probe.is_cancelled()));
        token.cancel();
        assert!(observed.get());
    }

    #[tokio::test]
    async fn test_cancelled_future_resolves_after_cancel() {
        let token = CancelToken::new();
        let signal = token.signal();
        assert!(!signal.is_cancelled());

        let waiter = token.cancelled();
        token.cancel();
        waiter.await;
        assert!(signal.is_cancelled());
    }
}
