use std::time::Duration;

/// How long a toast stays up unless configured otherwise.
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// A short auto-dismissing message. Showing a new notice replaces the one
/// currently visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub kind: NoticeKind,
    pub duration: Duration,
}

impl Notice {
    pub fn success(message: impl Into<String>, duration: Duration) -> Self {
        Self {
            message: message.into(),
            kind: NoticeKind::Success,
            duration,
        }
    }

    pub fn error(message: impl Into<String>, duration: Duration) -> Self {
        Self {
            message: message.into(),
            kind: NoticeKind::Error,
            duration,
        }
    }
}

/// Where blocking alerts and toasts go.
pub trait Notifier {
    /// Blocking message the user has to dismiss.
    fn alert(&mut self, message: &str);

    /// Auto-dismissing toast.
    fn notify(&mut self, notice: Notice);
}
