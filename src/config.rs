//! # Engine configuration.
//!
//! Provides [`Config`], the settings consulted when a failure has to be escalated
//! out of band.
//!
//! The engine is single-threaded, so a configuration is installed **per thread**:
//! `Config::install()` makes it current until the returned guard is dropped.
//! Threads without an installed configuration use [`Config::default`].
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use pushflow::{Config, Dispatch, TraceReporter};
//!
//! let _guard = Config::default()
//!     .with_reporters(vec![Arc::new(TraceReporter)])
//!     .with_dispatch(Dispatch::Thread)
//!     .install();
//!
//! assert_eq!(Config::current().dispatch, Dispatch::Thread);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;

use crate::report::{Report, TraceReporter};

thread_local! {
    static CURRENT: RefCell<Option<Config>> = const { RefCell::new(None) };
}

/// Where escalation jobs run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Dispatch {
    /// Spawn on the ambient tokio runtime if there is one, else on a detached thread.
    #[default]
    Runtime,
    /// Always use a detached thread.
    Thread,
}

/// Configuration for unhandled-failure escalation.
///
/// ## Field semantics
/// - `reporters`: receivers of escalated failures, called in order (empty = failures are only traced at debug level)
/// - `dispatch`: where the reporting job runs
#[derive(Clone)]
pub struct Config {
    /// Reporters receiving every escalated failure.
    pub reporters: Vec<Arc<dyn Report>>,

    /// Scheduling of the reporting job.
    pub dispatch: Dispatch,
}

impl Config {
    /// Appends a reporter.
    pub fn with_reporter(mut self, reporter: Arc<dyn Report>) -> Self {
        self.reporters.push(reporter);
        self
    }

    /// Replaces all reporters.
    pub fn with_reporters(mut self, reporters: Vec<Arc<dyn Report>>) -> Self {
        self.reporters = reporters;
        self
    }

    /// Sets the dispatch mode.
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Makes this configuration current for the calling thread.
    ///
    /// The previous configuration is restored when the guard is dropped.
    #[must_use = "the configuration is uninstalled when the guard is dropped"]
    pub fn install(self) -> ConfigGuard {
        let previous = CURRENT.with(|slot| slot.borrow_mut().replace(self));
        ConfigGuard {
            previous,
            _not_send: PhantomData,
        }
    }

    /// Returns the configuration current for the calling thread.
    pub fn current() -> Config {
        CURRENT.with(|slot| slot.borrow().clone()).unwrap_or_default()
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `reporters = [TraceReporter]`
    /// - `dispatch = Dispatch::Runtime`
    fn default() -> Self {
        Self {
            reporters: vec![Arc::new(TraceReporter)],
            dispatch: Dispatch::Runtime,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&'static str> = self.reporters.iter().map(|r| r.name()).collect();
        f.debug_struct("Config")
            .field("reporters", &names)
            .field("dispatch", &self.dispatch)
            .finish()
    }
}

/// Restores the previously installed configuration on drop.
pub struct ConfigGuard {
    previous: Option<Config>,
    _not_send: PhantomData<Rc<()>>,
}

impl Drop for ConfigGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT.with(|slot| *slot.borrow_mut() = previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_uses_trace_reporter_and_runtime_dispatch() {
        let cfg = Config::current();
        assert_eq!(cfg.dispatch, Dispatch::Runtime);
        assert_eq!(cfg.reporters.len(), 1);
        assert_eq!(cfg.reporters[0].name(), "trace");
    }

    #[test]
    fn test_guards_nest_and_restore() {
        let outer = Config::default().with_dispatch(Dispatch::Thread).install();
        {
            let _inner = Config::default().with_reporters(Vec::new()).install();
            assert!(Config::current().reporters.is_empty());
            assert_eq!(Config::current().dispatch, Dispatch::Runtime);
        }
        assert_eq!(Config::current().dispatch, Dispatch::Thread);
        drop(outer);
        assert_eq!(Config::current().reporters.len(), 1);
    }

    #[test]
    fn test_debug_lists_reporter_names() {
        let cfg = Config::default().with_reporter(Arc::new(TraceReporter));
        assert_eq!(
            format!("{cfg:?}"),
            "Config { reporters: [\"trace\", \"trace\"], dispatch: Runtime }"
        );
    }
}
