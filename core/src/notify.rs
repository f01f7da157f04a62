//! Side effects a page hands back to its host: transient toasts and delayed
//! navigation.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    pub duration: Duration,
}

impl Toast {
    pub fn success(message: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            kind: ToastKind::Success,
            message: message.into(),
            duration: Duration::from_millis(duration_ms),
        }
    }

    pub fn error(message: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            kind: ToastKind::Error,
            message: message.into(),
            duration: Duration::from_millis(duration_ms),
        }
    }
}

/// Go to `to` once `after` has elapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub to: String,
    pub after: Duration,
    /// Replace the current history entry instead of pushing.
    pub replace: bool,
}
