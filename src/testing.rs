//! Test helpers shared by the unit tests of every module.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::cancel::CancelReason;
use crate::config::{Config, ConfigGuard, Dispatch};
use crate::error::StreamError;
use crate::report::{Report, Unhandled};
use crate::sink::{Handlers, Notification, Sink};
use crate::stream::Stream;

/// Records every notification a sink receives.
pub(crate) struct Recorder<T> {
    log: Rc<RefCell<Vec<Notification<T>>>>,
}

impl<T: 'static> Recorder<T> {
    pub(crate) fn new() -> Self {
        Self {
            log: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub(crate) fn handlers(&self) -> Handlers<T> {
        let (values, done, failed) = (self.log.clone(), self.log.clone(), self.log.clone());
        Handlers::new()
            .on_value(move |v| values.borrow_mut().push(Notification::Value(v)))
            .on_complete(move || done.borrow_mut().push(Notification::Complete))
            .on_fail(move |e| failed.borrow_mut().push(Notification::Fail(e)))
    }

    pub(crate) fn sink(&self) -> Sink<T> {
        Sink::new(self.handlers())
    }

    pub(crate) fn len(&self) -> usize {
        self.log.borrow().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.log.borrow().is_empty()
    }

    pub(crate) fn completed(&self) -> bool {
        self.log
            .borrow()
            .iter()
            .any(|n| matches!(n, Notification::Complete))
    }

    pub(crate) fn failure(&self) -> Option<StreamError> {
        self.log.borrow().iter().find_map(|n| match n {
            Notification::Fail(e) => Some(e.clone()),
            _ => None,
        })
    }

    pub(crate) fn terminal_count(&self) -> usize {
        self.log.borrow().iter().filter(|n| n.is_terminal()).count()
    }

    pub(crate) fn is_terminated(&self) -> bool {
        self.terminal_count() > 0
    }
}

impl<T: Clone + 'static> Recorder<T> {
    pub(crate) fn values(&self) -> Vec<T> {
        self.log
            .borrow()
            .iter()
            .filter_map(|n| n.clone().into_value())
            .collect()
    }
}

/// A cold stream emitting `items` synchronously, then completing.
pub(crate) fn of<T: Clone + 'static>(items: Vec<T>) -> Stream<T> {
    Stream::new(move |sink: &Sink<T>| {
        for item in items.iter().cloned() {
            if sink.is_cancelled() {
                return Ok(());
            }
            sink.value(item);
        }
        sink.complete();
        Ok(())
    })
}

/// A stream that never emits and never terminates.
pub(crate) fn never<T: 'static>() -> Stream<T> {
    Stream::new(|_: &Sink<T>| Ok(()))
}

/// A stream that never terminates and logs the reason each activation is cancelled with.
pub(crate) fn watched<T: 'static>(cancellations: Rc<RefCell<Vec<CancelReason>>>) -> Stream<T> {
    Stream::new(move |sink: &Sink<T>| {
        let log = cancellations.clone();
        sink.token().on_cancel(move |reason| log.borrow_mut().push(reason.clone()));
        Ok(())
    })
}

/// Emits `items` from a task on the current `LocalSet` after `after`, then completes.
pub(crate) fn delayed<T: Clone + 'static>(items: Vec<T>, after: Duration) -> Stream<T> {
    Stream::new(move |sink: &Sink<T>| {
        let (sink, items) = (sink.clone(), items.clone());
        tokio::task::spawn_local(async move {
            tokio::select! {
                _ = sink.token().cancelled() => {}
                _ = tokio::time::sleep(after) => {
                    for item in items {
                        sink.value(item);
                    }
                    sink.complete();
                }
            }
        });
        Ok(())
    })
}

/// Waits until `rec` saw a terminal notification.
pub(crate) async fn settle<T: 'static>(rec: &Recorder<T>) {
    let wait = async {
        while !rec.is_terminated() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(2), wait)
        .await
        .expect("stream terminated in time");
}

struct ChannelReporter(Mutex<mpsc::Sender<Unhandled>>);

#[async_trait]
impl Report for ChannelReporter {
    async fn on_unhandled(&self, failure: &Unhandled) {
        if let Ok(tx) = self.0.lock() {
            let _ = tx.send(failure.clone());
        }
    }

    fn name(&self) -> &'static str {
        "channel"
    }
}

/// Installs a thread-dispatched reporter feeding the returned receiver.
pub(crate) fn capture_reports() -> (ConfigGuard, mpsc::Receiver<Unhandled>) {
    let (tx, rx) = mpsc::channel();
    let guard = Config::default()
        .with_reporters(vec![Arc::new(ChannelReporter(Mutex::new(tx)))])
        .with_dispatch(Dispatch::Thread)
        .install();
    (guard, rx)
}
