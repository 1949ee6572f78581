//! Credit balance and credit grants.

use chrono::{DateTime, Utc};
use cordial_api::{ApiClient, ApiError, ClaimOutcome};
use cordial_config::PopupConfig;
use cordial_protocols::{SessionRecord, StorageError};
use thiserror::Error;
use tracing::{info, warn};

use crate::session::{SessionStore, claim_available};

#[derive(Debug, Error)]
pub enum CreditError {
    #[error("User authentication required")]
    NotSignedIn,

    #[error("{0}")]
    AlreadyClaimed(String),

    #[error("{0}")]
    Rejected(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Where a displayed balance came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditSource {
    Server,
    /// The server could not be reached; the cached figure is shown.
    Cached,
    SignedOut,
}

/// Balance as shown in the popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditsView {
    pub credits: u32,
    pub low: bool,
    pub source: CreditSource,
}

/// State of the daily claim control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimButton {
    Available { label: String },
    ClaimedToday,
}

impl ClaimButton {
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Available { .. })
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Available { label } => label,
            Self::ClaimedToday => "Claimed Today",
        }
    }
}

/// A credit grant confirmed by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditGrant {
    pub credits_added: u32,
    pub new_total: u32,
}

/// Keeps the cached balance in step with the server.
#[derive(Debug, Clone)]
pub struct CreditLedger {
    api: ApiClient,
    sessions: SessionStore,
    low_credit_threshold: u32,
    purchase_credits: u32,
    daily_claim_credits: u32,
}

impl CreditLedger {
    pub fn new(api: ApiClient, sessions: SessionStore, config: &PopupConfig) -> Self {
        Self {
            api,
            sessions,
            low_credit_threshold: config.low_credit_threshold,
            purchase_credits: config.purchase_credits,
            daily_claim_credits: config.daily_claim_credits,
        }
    }

    fn view(&self, credits: u32, source: CreditSource) -> CreditsView {
        CreditsView {
            credits,
            low: source != CreditSource::SignedOut && credits <= self.low_credit_threshold,
            source,
        }
    }

    /// Fetch the balance from the server, falling back to the cached figure.
    pub async fn refresh(&self) -> CreditsView {
        let session = match self.sessions.get_session().await {
            Ok(Some(session)) => session,
            Ok(None) => return self.view(0, CreditSource::SignedOut),
            Err(e) => {
                warn!("Failed to read session for credits: {}", e);
                return self.view(0, CreditSource::SignedOut);
            }
        };

        match self.api.get_credits(&session.identity()).await {
            Ok(credits) => {
                if let Err(e) = self.sessions.update_credits(credits).await {
                    warn!("Failed to cache credits: {}", e);
                }
                self.view(credits, CreditSource::Server)
            }
            Err(e) => {
                warn!("Failed to fetch credits from server, using cached value: {}", e);
                self.view(session.credits, CreditSource::Cached)
            }
        }
    }

    /// Claim control state for `session` at `now`.
    pub fn claim_button(&self, session: &SessionRecord, now: DateTime<Utc>) -> ClaimButton {
        if claim_available(session, now) {
            ClaimButton::Available {
                label: format!("Claim Daily Credits ({})", self.daily_claim_credits),
            }
        } else {
            ClaimButton::ClaimedToday
        }
    }

    async fn signed_in(&self) -> Result<SessionRecord, CreditError> {
        self.sessions
            .get_session()
            .await?
            .filter(|s| s.authenticated)
            .ok_or(CreditError::NotSignedIn)
    }

    /// `POST /claim-daily-credits`. The claim time is recorded when the
    /// server grants credits or reports today's claim as already used.
    pub async fn claim_daily(&self, now: DateTime<Utc>) -> Result<CreditGrant, CreditError> {
        let session = self.signed_in().await?;
        let outcome = self.api.claim_daily_credits(&session.identity()).await?;
        match outcome {
            ClaimOutcome::Granted {
                credits_added,
                new_total,
            } => {
                info!(credits_added, new_total, "Daily credits claimed");
                if let Err(e) = self.sessions.record_claim(now, Some(new_total)).await {
                    warn!("Failed to record claim: {}", e);
                }
                Ok(CreditGrant {
                    credits_added,
                    new_total,
                })
            }
            ClaimOutcome::AlreadyClaimed { message } => {
                if let Err(e) = self.sessions.record_claim(now, None).await {
                    warn!("Failed to record claim: {}", e);
                }
                Err(CreditError::AlreadyClaimed(message))
            }
            ClaimOutcome::Rejected { message } => Err(CreditError::Rejected(message)),
        }
    }

    /// `POST /add-credits`.
    pub async fn add_credits(&self) -> Result<CreditGrant, CreditError> {
        let session = self.signed_in().await?;
        match self.api.add_credits(&session.identity()).await? {
            ClaimOutcome::Granted {
                credits_added,
                new_total,
            } => {
                if let Err(e) = self.sessions.update_credits(new_total).await {
                    warn!("Failed to cache credits: {}", e);
                }
                Ok(CreditGrant {
                    credits_added,
                    new_total,
                })
            }
            ClaimOutcome::AlreadyClaimed { message } => Err(CreditError::AlreadyClaimed(message)),
            ClaimOutcome::Rejected { message } => Err(CreditError::Rejected(message)),
        }
    }

    /// Start a checkout for the standard credit pack; returns the payment URL.
    pub async fn buy(&self) -> Result<String, CreditError> {
        let session = self.signed_in().await?;
        let url = self
            .api
            .create_checkout_session(&session.email, self.purchase_credits)
            .await?;
        info!(credits = self.purchase_credits, "Checkout session created");
        Ok(url)
    }
}

#[cfg(test)]
#[path = "credits_tests.rs"]
mod tests;
