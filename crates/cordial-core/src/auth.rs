//! Sign-in hand-off between the login page and the popup.
//!
//! The login page reports the signed-in user over an acknowledged
//! channel. If that report is lost (the popup was closed and reopened),
//! the page leaves an `authSuccess` record in storage, which the popup
//! polls for.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use cordial_protocols::{KeyValueStore, SessionRecord, StorageError, UserIdentity};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::session::SessionStore;

/// Storage key of the fallback sign-in record.
pub const AUTH_SUCCESS_KEY: &str = "authSuccess";

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
const DEFAULT_FRESHNESS: Duration = Duration::from_secs(30);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// How far ahead of our clock a sign-in timestamp may be.
const CLOCK_SKEW_MS: i64 = 5_000;

/// Whether a sign-in written at `timestamp_ms` is recent enough to trust.
pub fn is_fresh_sign_in(timestamp_ms: i64, freshness: Duration) -> bool {
    let age_ms = Utc::now().timestamp_millis() - timestamp_ms;
    if age_ms < -CLOCK_SKEW_MS {
        return false;
    }
    (age_ms.max(0) as u128) < freshness.as_millis()
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("Login timed out")]
    TimedOut,

    #[error("Login channel closed")]
    ChannelClosed,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Sign-in report from the login page.
#[derive(Debug)]
pub struct AuthMessage {
    pub user: UserIdentity,
    ack: oneshot::Sender<()>,
}

impl AuthMessage {
    /// Confirm receipt to the sender and take the user.
    pub fn acknowledge(self) -> UserIdentity {
        // The sender may have given up waiting.
        let _ = self.ack.send(());
        self.user
    }
}

/// Sending half of the sign-in channel, held by the login page side.
#[derive(Debug, Clone)]
pub struct AuthSender {
    tx: mpsc::Sender<AuthMessage>,
}

impl AuthSender {
    /// Report `user` and wait for the popup to acknowledge it.
    pub async fn send(&self, user: UserIdentity) -> Result<(), LoginError> {
        let (ack, acked) = oneshot::channel();
        self.tx
            .send(AuthMessage { user, ack })
            .await
            .map_err(|_| LoginError::ChannelClosed)?;
        acked.await.map_err(|_| LoginError::ChannelClosed)
    }
}

/// Create the sign-in channel.
pub fn auth_channel() -> (AuthSender, mpsc::Receiver<AuthMessage>) {
    let (tx, rx) = mpsc::channel(4);
    (AuthSender { tx }, rx)
}

/// Fallback record left in storage by the login page.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AuthSuccessRecord {
    user: UserIdentity,
    /// Milliseconds since the Unix epoch.
    timestamp: i64,
}

/// Leave a sign-in record in storage for a popup that is not listening.
pub async fn publish_auth_success(
    store: &dyn KeyValueStore,
    user: &UserIdentity,
) -> Result<(), StorageError> {
    let record = AuthSuccessRecord {
        user: user.clone(),
        timestamp: Utc::now().timestamp_millis(),
    };
    store
        .set(AUTH_SUCCESS_KEY, serde_json::to_value(record)?)
        .await
}

/// A completed sign-in.
#[derive(Debug)]
pub struct LoginOutcome {
    pub session: SessionRecord,
    /// Set when the session could not be saved; the user is still signed in
    /// for this run.
    pub storage_error: Option<StorageError>,
}

/// Waits for a sign-in to complete.
pub struct LoginFlow {
    store: Arc<dyn KeyValueStore>,
    sessions: SessionStore,
    poll_interval: Duration,
    freshness: Duration,
    timeout: Duration,
}

impl LoginFlow {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            sessions: SessionStore::new(store.clone()),
            store,
            poll_interval: DEFAULT_POLL_INTERVAL,
            freshness: DEFAULT_FRESHNESS,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Wait for the first sign-in report, from the channel or from storage.
    pub async fn wait_for_login(
        &self,
        mut messages: mpsc::Receiver<AuthMessage>,
    ) -> Result<LoginOutcome, LoginError> {
        let deadline = Instant::now() + self.timeout;
        let mut poll = tokio::time::interval(self.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut channel_open = true;

        loop {
            tokio::select! {
                message = messages.recv(), if channel_open => match message {
                    Some(message) => {
                        let user = message.acknowledge();
                        debug!("Sign-in reported over channel");
                        return Ok(self.complete(user).await);
                    }
                    None => {
                        debug!("Sign-in channel closed, relying on storage");
                        channel_open = false;
                    }
                },
                _ = poll.tick() => {
                    if let Some(user) = self.poll_storage().await {
                        debug!("Sign-in found in storage");
                        return Ok(self.complete(user).await);
                    }
                }
                _ = tokio::time::sleep_until(deadline) => {
                    self.clear_auth_record().await;
                    return Err(LoginError::TimedOut);
                }
            }
        }
    }

    async fn poll_storage(&self) -> Option<UserIdentity> {
        let value = match self.store.get(AUTH_SUCCESS_KEY).await {
            Ok(Some(value)) => value,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to poll sign-in record: {}", e);
                return None;
            }
        };
        let record: AuthSuccessRecord = match serde_json::from_value(value) {
            Ok(record) => record,
            Err(e) => {
                warn!("Ignoring malformed sign-in record: {}", e);
                return None;
            }
        };

        if !is_fresh_sign_in(record.timestamp, self.freshness) {
            debug!(timestamp = record.timestamp, "Ignoring stale sign-in record");
            return None;
        }
        Some(record.user)
    }

    async fn complete(&self, user: UserIdentity) -> LoginOutcome {
        let session = SessionRecord::authenticated(user);
        let storage_error = self.sessions.set_session(&session).await.err();
        if let Some(ref e) = storage_error {
            warn!("Signed in but failed to save session: {}", e);
        }
        self.clear_auth_record().await;
        info!(email = %session.email, "Signed in");
        LoginOutcome {
            session,
            storage_error,
        }
    }

    async fn clear_auth_record(&self) {
        if let Err(e) = self.store.remove(AUTH_SUCCESS_KEY).await {
            warn!("Failed to clear sign-in record: {}", e);
        }
    }
}

impl std::fmt::Debug for LoginFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginFlow")
            .field("poll_interval", &self.poll_interval)
            .field("freshness", &self.freshness)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
