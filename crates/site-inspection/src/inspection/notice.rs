use serde::Serialize;
use std::time::Duration;

/// Every notice dismisses itself after this long.
pub const NOTICE_DISMISS_AFTER: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
}

/// Transient user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub dismiss_after_ms: u64,
}

impl Notice {
    fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            dismiss_after_ms: NOTICE_DISMISS_AFTER.as_millis() as u64,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Error, message)
    }

    pub fn dismiss_after(&self) -> Duration {
        Duration::from_millis(self.dismiss_after_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_dismiss_after_five_seconds() {
        let notice = Notice::error("PDF Generation Failed: boom");
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.dismiss_after(), Duration::from_secs(5));

        let json = serde_json::to_value(Notice::success("saved")).expect("serializes");
        assert_eq!(json["kind"], "success");
        assert_eq!(json["dismiss_after_ms"], 5000);
    }
}
