//! Tab bridge errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Browser not available: {0}")]
    BrowserUnavailable(String),

    #[error("Could not access tab: {0}")]
    TabUnavailable(String),

    #[error("Failed to inject page bridge: {0}")]
    InjectionFailed(String),

    #[error("Bridge transport error: {0}")]
    Transport(String),
}
