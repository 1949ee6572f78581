//! API client errors.

use cordial_protocols::RewriteError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid response: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status of a rejected request.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<ApiError> for RewriteError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Status { status: 401, .. } => RewriteError::AuthRequired,
            ApiError::Status { status: 402, .. } => RewriteError::InsufficientCredits,
            ApiError::Status { status, .. } => RewriteError::ServerError(status),
            ApiError::Network(message) => RewriteError::NetworkError(message),
            ApiError::Decode(_) => RewriteError::EmptyServerResponse,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        let err = ApiError::Status {
            status: 500,
            message: "boom".to_string(),
        };
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("boom"));
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn test_network_has_no_status() {
        let err = ApiError::Network("connection refused".to_string());
        assert_eq!(err.status(), None);
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_rewrite_error_mapping() {
        let status = |status| ApiError::Status {
            status,
            message: String::new(),
        };
        assert_eq!(RewriteError::from(status(401)), RewriteError::AuthRequired);
        assert_eq!(
            RewriteError::from(status(402)),
            RewriteError::InsufficientCredits
        );
        assert_eq!(RewriteError::from(status(503)), RewriteError::ServerError(503));
        assert_eq!(RewriteError::from(status(404)), RewriteError::ServerError(404));
        assert!(matches!(
            RewriteError::from(ApiError::Network("timeout".to_string())),
            RewriteError::NetworkError(m) if m == "timeout"
        ));
    }

    #[test]
    fn test_undecodable_body_is_empty_response() {
        let err = ApiError::Decode("expected value at line 1 column 1".to_string());
        assert_eq!(err.status(), None);
        assert_eq!(RewriteError::from(err), RewriteError::EmptyServerResponse);
    }
}
