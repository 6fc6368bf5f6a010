use std::cell::Cell;
use std::rc::Rc;

use super::{try_project, Project};
use crate::sink::{Handlers, Sink};
use crate::stream::Stream;

struct Exhauster<U> {
    out: Sink<U>,
    busy: Cell<bool>,
    index: Cell<usize>,
    outer_done: Cell<bool>,
}

pub(super) fn stream<T: 'static, U: 'static>(outer: Stream<T>, project: Project<T, U>) -> Stream<U> {
    Stream::new(move |out: &Sink<U>| {
        let exhauster = Rc::new(Exhauster {
            out: out.clone(),
            busy: Cell::new(false),
            index: Cell::new(0),
            outer_done: Cell::new(false),
        });

        let project = Rc::clone(&project);
        let (values, done, failed) = (Rc::clone(&exhauster), exhauster, out.clone());
        outer.activate(
            Handlers::<T>::new()
                .on_value(move |v| values.offer(&project, v))
                .on_complete(move || {
                    done.outer_done.set(true);
                    if !done.busy.get() {
                        done.out.complete();
                    }
                })
                .on_fail(move |err| failed.fail(err))
                .with_token(out.token().clone()),
        );
        Ok(())
    })
}

impl<U: 'static> Exhauster<U> {
    fn offer<T: 'static>(self: &Rc<Self>, project: &Project<T, U>, v: T) {
        if self.busy.get() {
            return;
        }
        // claimed before projecting: a reentrant outer value must see the slot taken
        self.busy.set(true);

        let index = self.index.get();
        self.index.set(index + 1);
        let inner = match try_project(project, v, index) {
            Ok(inner) => inner,
            Err(err) => {
                self.out.fail(err);
                return;
            }
        };

        let (values, done, failed) = (self.out.clone(), Rc::clone(self), self.out.clone());
        inner.activate(
            Handlers::<U>::new()
                .on_value(move |u| values.value(u))
                .on_complete(move || {
                    done.busy.set(false);
                    if done.outer_done.get() {
                        done.out.complete();
                    }
                })
                .on_fail(move |err| failed.fail(err))
                .with_token(self.out.token().clone()),
        );
    }
}
