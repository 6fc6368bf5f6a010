//! # LogWriter - simple failure printer
//!
//! A minimal reporter that prints escalated failures to stderr.
//! Use it for tests or demos.
//!
//! ## Example output
//! ```text
//! [unhandled] kind=no_fail_handler seq=0 err="stream failed: boom"
//! [unhandled] kind=no_hub_members seq=1 err="stream failed: nobody listening"
//! [unhandled] kind=handler_panicked seq=2 err="panicked: oops"
//! ```

use async_trait::async_trait;

use super::reporter::Report;
use super::unhandled::Unhandled;

/// Failure writer reporter.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Report for LogWriter {
    async fn on_unhandled(&self, failure: &Unhandled) {
        eprintln!(
            "[unhandled] kind={} seq={} err={:?}",
            failure.kind.as_label(),
            failure.seq,
            failure.error.to_string()
        );
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
