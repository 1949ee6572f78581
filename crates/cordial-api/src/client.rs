//! HTTP client for the rewriting service.

use std::time::Duration;

use cordial_protocols::{RewriteRequest, UserIdentity};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::api::{
    CheckoutRequest, CheckoutResponse, ClaimOutcome, ClaimResponse, CreditsResponse,
    GenerateReplyResponse, UserPayload, error_message,
};
use crate::error::ApiError;

/// Client for the rewriting service.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// Create a client for `base_url` with a per-request `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Page that starts the OAuth sign-in.
    pub fn login_url(&self) -> String {
        self.endpoint("/auth/login")
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!("POST {}", path);
        let response = self
            .client
            .post(self.endpoint(path))
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status,
                message: error_message(&body),
            });
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// `POST /generate-reply`.
    pub async fn generate_reply(
        &self,
        request: &RewriteRequest,
    ) -> Result<GenerateReplyResponse, ApiError> {
        self.post_json("/generate-reply", request).await
    }

    /// `POST /get-credits`: the server's balance for `user`.
    pub async fn get_credits(&self, user: &UserIdentity) -> Result<u32, ApiError> {
        let response: CreditsResponse = self.post_json("/get-credits", &UserPayload { user }).await?;
        Ok(response.credits)
    }

    /// `POST /claim-daily-credits`.
    pub async fn claim_daily_credits(&self, user: &UserIdentity) -> Result<ClaimOutcome, ApiError> {
        self.grant("/claim-daily-credits", user).await
    }

    /// `POST /add-credits`.
    pub async fn add_credits(&self, user: &UserIdentity) -> Result<ClaimOutcome, ApiError> {
        self.grant("/add-credits", user).await
    }

    /// Credit grants answer refusals with an error status and a JSON body;
    /// those become [`ClaimOutcome`] values rather than errors.
    async fn grant(&self, path: &str, user: &UserIdentity) -> Result<ClaimOutcome, ApiError> {
        debug!("POST {}", path);
        let response = self
            .client
            .post(self.endpoint(path))
            .header("content-type", "application/json")
            .json(&UserPayload { user })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<ClaimResponse>(&body) {
            Ok(parsed) if status.is_success() || parsed.error.is_some() || parsed.already_claimed => {
                Ok(parsed.into_outcome())
            }
            Err(e) if status.is_success() => Err(ApiError::Decode(e.to_string())),
            _ => Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            }),
        }
    }

    /// `POST /create-checkout-session`: URL of the payment page.
    pub async fn create_checkout_session(
        &self,
        email: &str,
        credits: u32,
    ) -> Result<String, ApiError> {
        let response: CheckoutResponse = self
            .post_json("/create-checkout-session", &CheckoutRequest { email, credits })
            .await?;
        response
            .checkout_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ApiError::Decode("Failed to create checkout session".to_string()))
    }

    /// `GET /auth/logout`.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let response = self.client.get(self.endpoint("/auth/logout")).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            warn!("Server logout returned {}", status);
            return Err(ApiError::Status {
                status,
                message: "Server logout failed".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
