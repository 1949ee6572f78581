//! Authenticated user session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Credits assumed for a freshly signed-in user until the server reports a figure.
pub const DEFAULT_STARTING_CREDITS: u32 = 15;

fn default_credits() -> u32 {
    DEFAULT_STARTING_CREDITS
}

/// Identity sent along with API calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl UserIdentity {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
            picture: None,
        }
    }
}

/// Persisted session of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,

    #[serde(default)]
    pub authenticated: bool,

    /// Cached balance; the server remains the source of truth.
    #[serde(default = "default_credits")]
    pub credits: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_daily_claim: Option<DateTime<Utc>>,
}

impl SessionRecord {
    /// Record for a user who just completed sign-in.
    pub fn authenticated(identity: UserIdentity) -> Self {
        Self {
            email: identity.email,
            name: identity.name,
            picture: identity.picture,
            authenticated: true,
            credits: DEFAULT_STARTING_CREDITS,
            last_daily_claim: None,
        }
    }

    pub fn with_credits(mut self, credits: u32) -> Self {
        self.credits = credits;
        self
    }

    pub fn identity(&self) -> UserIdentity {
        UserIdentity {
            email: self.email.clone(),
            name: self.name.clone(),
            picture: self.picture.clone(),
        }
    }
}
