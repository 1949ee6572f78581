//! CDP error types.

use cordial_protocols::{BridgeError, DomError};
use thiserror::Error;

/// CDP client errors.
#[derive(Debug, Error)]
pub enum CdpError {
    /// Failed to connect to Chrome.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Chrome not found or not running with remote debugging.
    #[error("Chrome not available at {0}. Start Chrome with: chrome --remote-debugging-port=9222")]
    ChromeNotAvailable(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// CDP protocol error.
    #[error("CDP error: {message} (code: {code})")]
    Protocol { code: i64, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error (for endpoint discovery).
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Page not found: {0}")]
    PageNotFound(String),

    /// Exception thrown by page script.
    #[error("JavaScript error: {0}")]
    JavaScript(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Session closed")]
    SessionClosed,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for CdpError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        CdpError::WebSocket(e.to_string())
    }
}

impl From<reqwest::Error> for CdpError {
    fn from(e: reqwest::Error) -> Self {
        CdpError::Http(e.to_string())
    }
}

impl From<url::ParseError> for CdpError {
    fn from(e: url::ParseError) -> Self {
        CdpError::ConnectionFailed(format!("Invalid URL: {}", e))
    }
}

/// Prefix the page bridge puts on errors about unknown element ids.
pub(crate) const STALE_PREFIX: &str = "stale:";

impl From<CdpError> for DomError {
    fn from(e: CdpError) -> Self {
        match e {
            CdpError::JavaScript(message) => match stale_element_id(&message) {
                Some(id) => DomError::StaleElement(id),
                None => DomError::Script(message),
            },
            CdpError::InvalidResponse(message) => DomError::InvalidResponse(message),
            CdpError::Serialization(e) => DomError::InvalidResponse(e.to_string()),
            other => DomError::Transport(other.to_string()),
        }
    }
}

impl From<CdpError> for BridgeError {
    fn from(e: CdpError) -> Self {
        match e {
            CdpError::ChromeNotAvailable(_) | CdpError::ConnectionFailed(_) => {
                BridgeError::BrowserUnavailable(e.to_string())
            }
            CdpError::PageNotFound(_) => BridgeError::TabUnavailable(e.to_string()),
            CdpError::JavaScript(_) => BridgeError::InjectionFailed(e.to_string()),
            other => BridgeError::Transport(other.to_string()),
        }
    }
}

/// Element id named by a stale-element exception text.
fn stale_element_id(message: &str) -> Option<u64> {
    let start = message.find(STALE_PREFIX)? + STALE_PREFIX.len();
    let digits: String = message[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_exception_maps_to_stale_element() {
        let err = CdpError::JavaScript("Uncaught Error: stale:42".to_string());
        assert_eq!(DomError::from(err), DomError::StaleElement(42));
    }

    #[test]
    fn test_other_exception_maps_to_script_error() {
        let err = CdpError::JavaScript("Uncaught TypeError: x is undefined".to_string());
        assert!(matches!(DomError::from(err), DomError::Script(m) if m.contains("TypeError")));
    }

    #[test]
    fn test_transport_failures() {
        assert!(matches!(
            DomError::from(CdpError::SessionClosed),
            DomError::Transport(_)
        ));
        let err = BridgeError::from(CdpError::ChromeNotAvailable("http://localhost:9222".into()));
        assert!(matches!(err, BridgeError::BrowserUnavailable(m) if m.contains("9222")));
    }

    #[test]
    fn test_protocol_error_display() {
        let err = CdpError::Protocol {
            code: -32000,
            message: "No target with given id".to_string(),
        };
        assert!(err.to_string().contains("-32000"));
        assert!(err.to_string().contains("No target"));
    }
}
