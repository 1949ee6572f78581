//! Document access errors.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomError {
    #[error("Element is no longer available: {0}")]
    StaleElement(u64),

    #[error("Page transport error: {0}")]
    Transport(String),

    #[error("Script error: {0}")]
    Script(String),

    #[error("Invalid response from page: {0}")]
    InvalidResponse(String),
}
