//! Rewrite failure taxonomy.
//!
//! Every failure of a rewrite is reported as one of these kinds; the
//! display text is what the user sees.

use thiserror::Error;

use crate::notify::NotificationKind;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RewriteError {
    #[error("No compose window found. Open a new message or a reply first.")]
    NoComposeWindow,

    #[error("Email editor not found")]
    EditorNotFound,

    #[error("Please write some content in the email first!")]
    EmptyDraft,

    #[error("Please write more content to rewrite!")]
    DraftTooShort,

    #[error("Please log in to rewrite emails")]
    AuthRequired,

    #[error("Not enough credits. Claim your daily credits or buy more.")]
    InsufficientCredits,

    #[error("Server error (status {0})")]
    ServerError(u16),

    #[error("No response received from API")]
    EmptyServerResponse,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Page error: {0}")]
    PageError(String),
}

impl RewriteError {
    /// Stable identifier of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoComposeWindow => "no_compose_window",
            Self::EditorNotFound => "editor_not_found",
            Self::EmptyDraft => "empty_draft",
            Self::DraftTooShort => "draft_too_short",
            Self::AuthRequired => "auth_required",
            Self::InsufficientCredits => "insufficient_credits",
            Self::ServerError(_) => "server_error",
            Self::EmptyServerResponse => "empty_server_response",
            Self::NetworkError(_) => "network_error",
            Self::StorageError(_) => "storage_error",
            Self::PageError(_) => "page_error",
        }
    }

    /// Severity used when the failure is shown to the user.
    pub fn notification_kind(&self) -> NotificationKind {
        match self {
            Self::EmptyDraft | Self::DraftTooShort | Self::AuthRequired => {
                NotificationKind::Warning
            }
            _ => NotificationKind::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_display_includes_status() {
        let err = RewriteError::ServerError(503);
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_kind_identifiers_are_distinct() {
        let errors = vec![
            RewriteError::NoComposeWindow,
            RewriteError::EditorNotFound,
            RewriteError::EmptyDraft,
            RewriteError::DraftTooShort,
            RewriteError::AuthRequired,
            RewriteError::InsufficientCredits,
            RewriteError::ServerError(500),
            RewriteError::EmptyServerResponse,
            RewriteError::NetworkError("x".to_string()),
            RewriteError::StorageError("x".to_string()),
            RewriteError::PageError("x".to_string()),
        ];
        let mut kinds: Vec<&str> = errors.iter().map(|e| e.kind()).collect();
        kinds.sort();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn test_input_problems_are_warnings() {
        assert_eq!(RewriteError::EmptyDraft.notification_kind(), NotificationKind::Warning);
        assert_eq!(RewriteError::DraftTooShort.notification_kind(), NotificationKind::Warning);
        assert_eq!(RewriteError::ServerError(500).notification_kind(), NotificationKind::Error);
    }
}
