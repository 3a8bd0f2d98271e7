use crate::error::SessionError;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// Transient, non-blocking message for the user (a toast).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }

    /// Turn a failed action into what the user sees. Validation and backend
    /// rejections are shown verbatim; anything else falls back to `fallback`.
    pub(crate) fn from_failure(fallback: &str, err: SessionError) -> Self {
        match err {
            SessionError::Validation(message) => Self::error(message),
            SessionError::Rejected(message) => Self::error(message),
            other => {
                warn!(error = %other, "{fallback}");
                Self::error(fallback)
            }
        }
    }
}
