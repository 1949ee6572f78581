//! Persisted user session.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use cordial_protocols::{KeyValueStore, SessionRecord, StorageError};
use tracing::debug;

/// Storage key of the session record.
pub const SESSION_KEY: &str = "user";

/// Typed access to the session record in extension storage.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// The stored session, if any.
    pub async fn get_session(&self) -> Result<Option<SessionRecord>, StorageError> {
        match self.store.get(SESSION_KEY).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub async fn set_session(&self, record: &SessionRecord) -> Result<(), StorageError> {
        self.store
            .set(SESSION_KEY, serde_json::to_value(record)?)
            .await
    }

    pub async fn clear_session(&self) -> Result<(), StorageError> {
        self.store.remove(SESSION_KEY).await
    }

    /// Replace the cached balance. Without a session this does nothing.
    pub async fn update_credits(&self, credits: u32) -> Result<Option<SessionRecord>, StorageError> {
        let Some(mut record) = self.get_session().await? else {
            return Ok(None);
        };
        record.credits = credits;
        self.set_session(&record).await?;
        debug!(credits, "Cached credits updated");
        Ok(Some(record))
    }

    /// Mark the daily claim as used at `at`, with the new balance when known.
    pub async fn record_claim(
        &self,
        at: DateTime<Utc>,
        new_total: Option<u32>,
    ) -> Result<Option<SessionRecord>, StorageError> {
        let Some(mut record) = self.get_session().await? else {
            return Ok(None);
        };
        record.last_daily_claim = Some(at);
        if let Some(total) = new_total {
            record.credits = total;
        }
        self.set_session(&record).await?;
        Ok(Some(record))
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}

/// Whether the daily claim is still open for `record` at `now`.
///
/// Days are UTC calendar days. This only gates the control; the server
/// decides whether credits are granted.
pub fn claim_available(record: &SessionRecord, now: DateTime<Utc>) -> bool {
    match record.last_daily_claim {
        Some(last) => last.date_naive() != now.date_naive(),
        None => true,
    }
}
