use crate::error::StreamError;

/// One notification of the sink vocabulary, as a value.
#[derive(Debug, Clone)]
pub enum Notification<T> {
    /// A data value.
    Value(T),
    /// Graceful completion.
    Complete,
    /// Failure with its reason.
    Fail(StreamError),
}

impl<T> Notification<T> {
    /// `true` for `Complete` and `Fail`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Notification::Value(_))
    }

    /// Returns the carried value, if any.
    pub fn into_value(self) -> Option<T> {
        match self {
            Notification::Value(v) => Some(v),
            _ => None,
        }
    }
}
