//! Rewrite request and result types.

use serde::Serialize;

use crate::error::RewriteError;
use crate::types::{Tone, UserIdentity};

/// What the orchestrator sends to the rewriting API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewriteRequest {
    /// Prompt combining thread context, draft and instructions.
    pub message: String,
    pub tone: Tone,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserIdentity>,
}

/// Outcome of one rewrite invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteResult {
    Success {
        text: String,
        credits_remaining: Option<u32>,
    },
    Failure {
        error: RewriteError,
        message: String,
    },
}

impl RewriteResult {
    pub fn success(text: impl Into<String>, credits_remaining: Option<u32>) -> Self {
        Self::Success {
            text: text.into(),
            credits_remaining,
        }
    }

    pub fn failure(error: RewriteError) -> Self {
        let message = error.to_string();
        Self::Failure { error, message }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn error(&self) -> Option<&RewriteError> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error),
        }
    }
}

impl From<Result<(String, Option<u32>), RewriteError>> for RewriteResult {
    fn from(result: Result<(String, Option<u32>), RewriteError>) -> Self {
        match result {
            Ok((text, credits_remaining)) => Self::success(text, credits_remaining),
            Err(error) => Self::failure(error),
        }
    }
}
