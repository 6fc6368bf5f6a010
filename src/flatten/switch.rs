use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::{try_project, Project};
use crate::sink::{Handlers, Sink};
use crate::stream::Stream;

/// Per-activation state of `switch_map`.
///
/// `generation` is bumped on every outer value before anything reentrant runs. A call
/// that finds it changed after cancelling the stale inner or projecting was superseded
/// and leaves its inner unactivated. `current` holds the generation and sink of the
/// active inner and is replaced before that inner is activated.
struct Switcher<U> {
    out: Sink<U>,
    current: RefCell<Option<(u64, Sink<U>)>>,
    generation: Cell<u64>,
    index: Cell<usize>,
    outer_done: Cell<bool>,
}

pub(super) fn stream<T: 'static, U: 'static>(outer: Stream<T>, project: Project<T, U>) -> Stream<U> {
    Stream::new(move |out: &Sink<U>| {
        let switcher = Rc::new(Switcher {
            out: out.clone(),
            current: RefCell::new(None),
            generation: Cell::new(0),
            index: Cell::new(0),
            outer_done: Cell::new(false),
        });

        let project = Rc::clone(&project);
        let (values, done, failed) = (Rc::clone(&switcher), switcher, out.clone());
        outer.activate(
            Handlers::<T>::new()
                .on_value(move |v| values.switch_to(&project, v))
                .on_complete(move || {
                    done.outer_done.set(true);
                    if done.current.borrow().is_none() {
                        done.out.complete();
                    }
                })
                .on_fail(move |err| failed.fail(err))
                .with_token(out.token().clone()),
        );
        Ok(())
    })
}

impl<U: 'static> Switcher<U> {
    fn switch_to<T: 'static>(self: &Rc<Self>, project: &Project<T, U>, v: T) {
        let id = self.generation.get() + 1;
        self.generation.set(id);

        let stale = self.current.borrow_mut().take();
        if let Some((_, sink)) = stale {
            sink.cancel();
        }
        if self.generation.get() != id {
            return;
        }

        let index = self.index.get();
        self.index.set(index + 1);
        let inner = match try_project(project, v, index) {
            Ok(inner) => inner,
            Err(err) => {
                self.out.fail(err);
                return;
            }
        };
        if self.generation.get() != id {
            return;
        }

        let (values, done, failed) = (self.out.clone(), Rc::clone(self), self.out.clone());
        let sink = Sink::new(
            Handlers::<U>::new()
                .on_value(move |u| values.value(u))
                .on_complete(move || done.inner_done(id))
                .on_fail(move |err| failed.fail(err))
                .with_token(self.out.token().clone()),
        );
        *self.current.borrow_mut() = Some((id, sink.clone()));
        inner.activate(sink);
    }

    fn inner_done(&self, id: u64) {
        {
            let mut current = self.current.borrow_mut();
            if current.as_ref().is_some_and(|(active, _)| *active == id) {
                current.take();
            }
        }
        if self.outer_done.get() && self.current.borrow().is_none() {
            self.out.complete();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelReason;
    use crate::error::StreamError;
    use crate::hub::{Hub, Multicast};
    use crate::testing::{of, watched, Recorder};

    /// Inner stream that logs `name` when it is cancelled on request.
    fn recording(
        name: &'static str,
        finishes: bool,
        log: Rc<RefCell<Vec<&'static str>>>,
    ) -> Stream<&'static str> {
        Stream::new(move |sink: &Sink<&'static str>| {
            let log = log.clone();
            sink.token().on_cancel(move |reason| {
                if matches!(reason, CancelReason::Requested) {
                    log.borrow_mut().push(name);
                }
            });
            if finishes {
                sink.value(name);
                sink.complete();
            }
            Ok(())
        })
    }

    #[test]
    fn test_switch_cancels_stale_inner_only() {
        let cancelled = Rc::new(RefCell::new(Vec::new()));
        let log = cancelled.clone();
        let rec = Recorder::<&str>::new();

        of(vec!["a", "b"])
            .switch_map(move |name, _| Ok(recording(name, name == "b", log.clone())))
            .activate(rec.sink());

        assert!(rec.completed());
        assert_eq!(rec.values(), vec!["b"]);
        assert_eq!(*cancelled.borrow(), vec!["a"]);
    }

    #[test]
    fn test_switch_forwards_only_latest_inner() {
        let outer = Hub::<usize>::new();
        let inners: Vec<Hub<&'static str>> = (0..2).map(|_| Hub::new()).collect();
        let rec = Recorder::<&str>::new();

        let sources = inners.clone();
        outer
            .stream()
            .switch_map(move |k, _| Ok(sources[k].stream()))
            .activate(rec.sink());

        outer.value(0);
        inners[0].value("a1");
        outer.value(1);
        assert_eq!(inners[0].member_count(), 0);
        inners[0].value("a2");
        inners[1].value("b1");

        outer.complete();
        assert!(!rec.completed());
        inners[1].complete();

        assert_eq!(rec.values(), vec!["a1", "b1"]);
        assert!(rec.completed());
    }

    #[test]
    fn test_stale_completion_does_not_clear_current() {
        let outer = Hub::<usize>::new();
        let first_done = Rc::new(RefCell::new(None::<Sink<&'static str>>));
        let rec = Recorder::<&str>::new();

        let stash = first_done.clone();
        outer
            .stream()
            .switch_map(move |k, _| {
                let stash = stash.clone();
                Ok(Stream::new(move |sink: &Sink<&'static str>| {
                    if k == 0 {
                        *stash.borrow_mut() = Some(sink.clone());
                    }
                    Ok(())
                }))
            })
            .activate(rec.sink());

        outer.value(0);
        outer.value(1);
        outer.complete();
        // the superseded sink is cancelled, so completing it has no effect
        if let Some(stale) = first_done.borrow().as_ref() {
            stale.complete();
        }
        assert!(!rec.completed());
    }

    #[test]
    fn test_inner_feeding_outer_synchronously_keeps_bookkeeping() {
        let outer = Hub::<u32>::new();
        let cancellations = Rc::new(RefCell::new(Vec::new()));
        let rec = Recorder::<u32>::new();
        let out = rec.sink();

        let (feedback, log) = (outer.clone(), cancellations.clone());
        outer
            .stream()
            .switch_map(move |n, _| {
                if n == 0 {
                    let feedback = feedback.clone();
                    Ok(Stream::new(move |sink: &Sink<u32>| {
                        sink.value(100);
                        feedback.value(1);
                        sink.value(101);
                        Ok(())
                    }))
                } else {
                    Ok(watched(log.clone()))
                }
            })
            .activate(out.clone());

        outer.value(0);
        assert_eq!(rec.values(), vec![100]);

        outer.complete();
        assert!(!rec.completed());

        out.cancel();
        out.cancel();
        assert_eq!(cancellations.borrow().len(), 1);
        assert!(matches!(cancellations.borrow()[0], CancelReason::Requested));
    }

    #[test]
    fn test_value_pushed_during_projection_supersedes_it() {
        let outer = Hub::<usize>::new();
        let inners: Vec<Hub<&'static str>> = (0..2).map(|_| Hub::new()).collect();
        let rec = Recorder::<&str>::new();

        let (feedback, sources) = (outer.clone(), inners.clone());
        outer
            .stream()
            .switch_map(move |k, _| {
                if k == 0 {
                    feedback.value(1);
                }
                Ok(sources[k].stream())
            })
            .activate(rec.sink());

        outer.value(0);
        assert_eq!(inners[0].member_count(), 0);
        assert_eq!(inners[1].member_count(), 1);

        inners[0].value("from0");
        inners[1].value("from1");
        outer.complete();
        inners[1].complete();

        assert_eq!(rec.values(), vec!["from1"]);
        assert!(rec.completed());
    }

    #[test]
    fn test_value_pushed_while_cancelling_stale_inner_wins() {
        let outer = Hub::<usize>::new();
        let inners: Vec<Hub<&'static str>> = (0..3).map(|_| Hub::new()).collect();
        let rec = Recorder::<&str>::new();

        let (feedback, sources) = (outer.clone(), inners.clone());
        outer
            .stream()
            .switch_map(move |k, _| {
                let source = sources[k].stream();
                if k != 0 {
                    return Ok(source);
                }
                let feedback = feedback.clone();
                Ok(Stream::new(move |sink: &Sink<&'static str>| {
                    let feedback = feedback.clone();
                    sink.token().on_cancel(move |_| feedback.value(2));
                    source.activate(sink.clone());
                    Ok(())
                }))
            })
            .activate(rec.sink());

        outer.value(0);
        outer.value(1);
        assert_eq!(inners[0].member_count(), 0);
        assert_eq!(inners[1].member_count(), 0);
        assert_eq!(inners[2].member_count(), 1);

        inners[2].value("c");
        assert_eq!(rec.values(), vec!["c"]);
    }

    #[test]
    fn test_projection_failure_fails_output() {
        let rec = Recorder::<u8>::new();
        of(vec![1_u8, 2])
            .switch_map(|n, _| {
                if n == 2 {
                    Err(StreamError::msg("no inner for 2"))
                } else {
                    Ok(of(vec![n]))
                }
            })
            .activate(rec.sink());
        assert_eq!(rec.values(), vec![1]);
        assert_eq!(
            rec.failure().map(|e| e.to_string()),
            Some("stream failed: no inner for 2".into())
        );
    }
}
