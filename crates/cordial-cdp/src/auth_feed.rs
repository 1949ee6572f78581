//! Relays the result of the sign-in tab to the waiting login flow.

use std::time::Duration;

use cordial_core::{AuthSender, LoginError, is_fresh_sign_in, publish_auth_success};
use cordial_protocols::{KeyValueStore, UserIdentity};
use serde::Deserialize;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::CdpError;
use crate::session::PageSession;

/// Reads the sign-in result the auth callback page leaves in its
/// `localStorage`, and clears it.
const READ_AUTH_RESULT: &str = r#"(() => {
  const data = localStorage.getItem('cordial_auth_success');
  const timestamp = localStorage.getItem('cordial_auth_timestamp');
  if (!data || !timestamp) return null;
  localStorage.removeItem('cordial_auth_success');
  localStorage.removeItem('cordial_auth_timestamp');
  return { user: JSON.parse(decodeURIComponent(data)), timestamp: parseInt(timestamp, 10) };
})()"#;

#[derive(Debug, Deserialize)]
struct PageAuthResult {
    user: UserIdentity,
    timestamp: i64,
}

/// Watches a sign-in tab.
#[derive(Debug, Clone)]
pub struct AuthFeed {
    poll_interval: Duration,
    freshness: Duration,
    timeout: Duration,
}

impl Default for AuthFeed {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            freshness: Duration::from_secs(30),
            timeout: Duration::from_secs(60),
        }
    }
}

impl AuthFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the sign-in tab to complete, then report the user.
    ///
    /// The user goes to `sender`; if nobody is listening any more it is
    /// left in `store` for the next login flow to pick up.
    pub async fn relay(
        &self,
        tab: &PageSession,
        sender: &AuthSender,
        store: &dyn KeyValueStore,
    ) -> Result<UserIdentity, CdpError> {
        let user = self.wait_for_user(tab).await?;
        match sender.send(user.clone()).await {
            Ok(()) => debug!("Sign-in acknowledged"),
            Err(LoginError::ChannelClosed) => {
                info!("Login flow gone, leaving sign-in in storage");
                if let Err(e) = publish_auth_success(store, &user).await {
                    warn!("Failed to store sign-in: {}", e);
                }
            }
            Err(e) => warn!("Failed to report sign-in: {}", e),
        }
        Ok(user)
    }

    async fn wait_for_user(&self, tab: &PageSession) -> Result<UserIdentity, CdpError> {
        let deadline = Instant::now() + self.timeout;
        let mut poll = tokio::time::interval(self.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = poll.tick() => {}
                _ = tokio::time::sleep_until(deadline) => {
                    return Err(CdpError::Timeout("Sign-in was not completed".to_string()));
                }
            }

            let value = match tab.evaluate(READ_AUTH_RESULT).await {
                Ok(value) => value,
                // The tab is between OAuth redirects.
                Err(CdpError::JavaScript(e)) | Err(CdpError::Protocol { message: e, .. }) => {
                    debug!("Sign-in tab not readable yet: {}", e);
                    continue;
                }
                Err(e) => return Err(e),
            };
            if value.is_null() {
                continue;
            }

            let result: PageAuthResult = serde_json::from_value(value)?;
            if self.is_fresh(result.timestamp) {
                info!(email = %result.user.email, "Sign-in completed");
                return Ok(result.user);
            }
            debug!(timestamp = result.timestamp, "Ignoring stale sign-in result");
        }
    }

    fn is_fresh(&self, timestamp_ms: i64) -> bool {
        is_fresh_sign_in(timestamp_ms, self.freshness)
    }
}
