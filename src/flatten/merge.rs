//! Bounded-concurrency merge engine behind `merge_map`, `concat_map` and `expand`.
//!
//! One [`Merger`] exists per activation of the output stream. It counts active
//! inners, queues outer values beyond `limit`, and completes the output once the
//! outer completed with nothing active or queued.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use super::{try_project, Project};
use crate::sink::{Handlers, Sink};
use crate::stream::Stream;

/// Feedback loop used by `expand`: every value is emitted, then projected again.
pub(super) struct Expansion<T, U> {
    emit: Rc<dyn Fn(&T) -> U>,
    feed: Rc<dyn Fn(U) -> T>,
}

impl<T: Clone + 'static> Expansion<T, T> {
    pub(super) fn identity() -> Self {
        Self {
            emit: Rc::new(|v: &T| v.clone()),
            feed: Rc::new(|v: T| v),
        }
    }
}

impl<T, U> Clone for Expansion<T, U> {
    fn clone(&self) -> Self {
        Self {
            emit: Rc::clone(&self.emit),
            feed: Rc::clone(&self.feed),
        }
    }
}

pub(super) struct Merger<T, U> {
    out: Sink<U>,
    project: Project<T, U>,
    expansion: Option<Expansion<T, U>>,
    limit: usize,
    active: Cell<usize>,
    index: Cell<usize>,
    queue: RefCell<VecDeque<T>>,
    outer_done: Cell<bool>,
}

impl<T: 'static, U: 'static> Merger<T, U> {
    pub(super) fn stream(
        outer: Stream<T>,
        project: Project<T, U>,
        limit: usize,
        expansion: Option<Expansion<T, U>>,
    ) -> Stream<U> {
        Stream::new(move |out: &Sink<U>| {
            let merger = Rc::new(Merger {
                out: out.clone(),
                project: Rc::clone(&project),
                expansion: expansion.clone(),
                limit,
                active: Cell::new(0),
                index: Cell::new(0),
                queue: RefCell::new(VecDeque::new()),
                outer_done: Cell::new(false),
            });

            let (values, done, failed) = (Rc::clone(&merger), merger, out.clone());
            outer.activate(
                Handlers::<T>::new()
                    .on_value(move |v| values.push(v))
                    .on_complete(move || {
                        done.outer_done.set(true);
                        done.try_complete();
                    })
                    .on_fail(move |err| failed.fail(err))
                    .with_token(out.token().clone()),
            );
            Ok(())
        })
    }

    fn push(self: &Rc<Self>, v: T) {
        if self.out.is_cancelled() {
            return;
        }
        if self.active.get() < self.limit {
            self.subscribe(v);
        } else {
            self.queue.borrow_mut().push_back(v);
        }
    }

    fn subscribe(self: &Rc<Self>, v: T) {
        // slot reserved before any reentrant call: emit and project may push outer values
        self.active.set(self.active.get() + 1);

        if let Some(expansion) = &self.expansion {
            self.out.value((expansion.emit)(&v));
            if self.out.is_cancelled() {
                self.release();
                return;
            }
        }

        let index = self.index.get();
        self.index.set(index + 1);
        let inner = match try_project(&self.project, v, index) {
            Ok(inner) => inner,
            Err(err) => {
                self.release();
                self.out.fail(err);
                return;
            }
        };

        let (values, done, failed) = (Rc::clone(self), Rc::clone(self), self.out.clone());
        inner.activate(
            Handlers::<U>::new()
                .on_value(move |u| values.inner_value(u))
                .on_complete(move || done.inner_done())
                .on_fail(move |err| failed.fail(err))
                .with_token(self.out.token().clone()),
        );
    }

    fn inner_value(self: &Rc<Self>, u: U) {
        match &self.expansion {
            Some(expansion) => self.push((expansion.feed)(u)),
            None => self.out.value(u),
        }
    }

    fn release(&self) {
        self.active.set(self.active.get() - 1);
    }

    fn inner_done(self: &Rc<Self>) {
        self.release();
        while self.active.get() < self.limit && !self.out.is_cancelled() {
            let next = self.queue.borrow_mut().pop_front();
            match next {
                Some(v) => self.subscribe(v),
                None => break,
            }
        }
        self.try_complete();
    }

    fn try_complete(&self) {
        if self.outer_done.get() && self.active.get() == 0 && self.queue.borrow().is_empty() {
            self.out.complete();
        }
    }
}
