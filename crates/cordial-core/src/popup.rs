//! The popup panel: rewrite trigger, account and credits.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use cordial_api::{ApiClient, ApiError};
use cordial_config::Config;
use cordial_protocols::{
    KeyValueStore, RewriteResult, SessionRecord, TabBridge, TabInfo, Tone,
};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::auth::{AuthMessage, LoginError, LoginFlow};
use crate::credits::{ClaimButton, CreditError, CreditLedger, CreditsView};
use crate::orchestrator::{IN_PROGRESS_MESSAGE, OrchestratorOptions, RewriteOrchestrator};
use crate::selectors::SelectorRegistry;
use crate::session::SessionStore;

pub const WRONG_HOST_MESSAGE: &str = "Please navigate to Gmail first!";
pub const NO_TAB_MESSAGE: &str = "Could not access current tab. Please try again.";
pub const INJECTION_FAILED_MESSAGE: &str =
    "Failed to inject page bridge. Please refresh Gmail and try again.";
pub const EXECUTION_FAILED_MESSAGE: &str =
    "Failed to execute rewrite. Please refresh Gmail and try again.";
pub const TIMEOUT_MESSAGE: &str = "Operation timed out. Please try again.";
pub const REWRITE_SUCCESS_MESSAGE: &str = "Email rewritten successfully!";

/// Severity of the popup status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Loading,
    Success,
    Error,
    Info,
}

/// The single status message shown in the popup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    pub kind: StatusKind,
    pub message: String,
}

impl StatusLine {
    pub fn new(kind: StatusKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn loading(message: impl Into<String>) -> Self {
        Self::new(StatusKind::Loading, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(StatusKind::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(StatusKind::Error, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(StatusKind::Info, message)
    }

    pub fn is_error(&self) -> bool {
        self.kind == StatusKind::Error
    }
}

/// What the popup renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupView {
    SignedOut,
    SignedIn {
        session: SessionRecord,
        credits: CreditsView,
        claim: ClaimButton,
    },
}

/// A checkout started from the popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutStatus {
    pub status: StatusLine,
    pub checkout_url: Option<String>,
}

/// Whether `tab` shows a page of `host`, compared case-insensitively.
pub fn is_on_host(tab: &TabInfo, host: &str) -> bool {
    url::Url::parse(&tab.url)
        .ok()
        .and_then(|url| url.host_str().map(|h| h.eq_ignore_ascii_case(host)))
        .unwrap_or(false)
}

/// Drives the popup's actions against the active tab and the backend.
///
/// Every action publishes its progress to the status line, which
/// [`subscribe`](Self::subscribe) exposes.
pub struct PopupController {
    tabs: Arc<dyn TabBridge>,
    sessions: SessionStore,
    ledger: CreditLedger,
    login: LoginFlow,
    api: ApiClient,
    selectors: Arc<SelectorRegistry>,
    options: OrchestratorOptions,
    host: String,
    operation_timeout: Duration,
    editor_wait: Option<Duration>,
    status: watch::Sender<Option<StatusLine>>,
}

impl PopupController {
    pub fn new(
        tabs: Arc<dyn TabBridge>,
        store: Arc<dyn KeyValueStore>,
        api: ApiClient,
        config: &Config,
    ) -> Self {
        let sessions = SessionStore::new(store.clone());
        let ledger = CreditLedger::new(api.clone(), sessions.clone(), &config.popup);
        let (status, _) = watch::channel(None);

        Self {
            tabs,
            sessions,
            ledger,
            login: LoginFlow::new(store),
            api,
            selectors: Arc::new(SelectorRegistry::from_config(&config.selectors)),
            options: OrchestratorOptions::from_config(config),
            host: config.popup.host.clone(),
            operation_timeout: Duration::from_secs(config.popup.operation_timeout_secs),
            editor_wait: None,
            status,
        }
    }

    pub fn with_login_flow(mut self, login: LoginFlow) -> Self {
        self.login = login;
        self
    }

    /// Give the page up to `wait` to render an editor before rewriting.
    pub fn with_editor_wait(mut self, wait: Duration) -> Self {
        self.editor_wait = Some(wait);
        self
    }

    /// Follow status line changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<StatusLine>> {
        self.status.subscribe()
    }

    /// The current status line.
    pub fn status(&self) -> Option<StatusLine> {
        self.status.borrow().clone()
    }

    fn show(&self, line: StatusLine) -> StatusLine {
        debug!(kind = ?line.kind, "Status: {}", line.message);
        self.status.send_replace(Some(line.clone()));
        line
    }

    /// Everything the popup displays for the current session.
    pub async fn view(&self, now: DateTime<Utc>) -> PopupView {
        let session = match self.sessions.get_session().await {
            Ok(session) => session.filter(|s| s.authenticated),
            Err(e) => {
                warn!("Failed to read session: {}", e);
                None
            }
        };
        let Some(session) = session else {
            return PopupView::SignedOut;
        };

        let credits = self.ledger.refresh().await;
        let claim = self.ledger.claim_button(&session, now);
        PopupView::SignedIn {
            session,
            credits,
            claim,
        }
    }

    /// Rewrite the draft in the active tab.
    ///
    /// After the operation timeout the status switches to a timeout error,
    /// but the rewrite keeps running and its outcome replaces that status.
    pub async fn rewrite(&self, tone: Tone) -> StatusLine {
        self.show(StatusLine::loading(IN_PROGRESS_MESSAGE));
        let deadline = Instant::now() + self.operation_timeout;
        let line = self.run_rewrite(tone, deadline).await;
        self.show(line)
    }

    async fn run_rewrite(&self, tone: Tone, deadline: Instant) -> StatusLine {
        let tab = match self.tabs.active_tab().await {
            Ok(Some(tab)) => tab,
            Ok(None) => return StatusLine::error(NO_TAB_MESSAGE),
            Err(e) => {
                warn!("Failed to query active tab: {}", e);
                return StatusLine::error(format!("Error: {}", e));
            }
        };
        if !is_on_host(&tab, &self.host) {
            debug!(url = %tab.url, host = %self.host, "Active tab is not on the mail host");
            return StatusLine::error(WRONG_HOST_MESSAGE);
        }

        let page = match self.tabs.attach(&tab).await {
            Ok(page) => page,
            Err(e) => {
                warn!(tab = %tab.id, "Failed to attach to tab: {}", e);
                return StatusLine::error(INJECTION_FAILED_MESSAGE);
            }
        };

        let orchestrator = RewriteOrchestrator::new(
            &page,
            self.selectors.clone(),
            self.sessions.clone(),
            self.api.clone(),
            self.options.clone(),
        );
        let editor_wait = self.editor_wait;
        let mut task = tokio::spawn(async move {
            match editor_wait {
                Some(wait) => orchestrator.rewrite_when_ready(tone, wait).await,
                None => orchestrator.rewrite(tone).await,
            }
        });

        let joined = match tokio::time::timeout_at(deadline, &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                info!("Rewrite still running after {:?}", self.operation_timeout);
                self.show(StatusLine::error(TIMEOUT_MESSAGE));
                task.await
            }
        };

        match joined {
            Ok(RewriteResult::Success { .. }) => StatusLine::success(REWRITE_SUCCESS_MESSAGE),
            Ok(RewriteResult::Failure { message, .. }) => StatusLine::error(message),
            Err(e) => {
                warn!("Rewrite task failed: {}", e);
                StatusLine::error(EXECUTION_FAILED_MESSAGE)
            }
        }
    }

    /// URL of the sign-in page to open.
    pub fn login_url(&self) -> String {
        self.api.login_url()
    }

    /// Wait for the sign-in page to report back.
    pub async fn login(&self, messages: mpsc::Receiver<AuthMessage>) -> StatusLine {
        self.show(StatusLine::loading("Waiting for sign-in..."));
        let line = match self.login.wait_for_login(messages).await {
            Ok(outcome) => match outcome.storage_error {
                Some(_) => StatusLine::error("Failed to save authentication"),
                None => StatusLine::success(format!("Signed in as {}", outcome.session.email)),
            },
            Err(LoginError::TimedOut) => StatusLine::error("Login timed out. Please try again."),
            Err(e) => {
                warn!("Login failed: {}", e);
                StatusLine::error("Login failed. Please try again.")
            }
        };
        self.show(line)
    }

    /// Sign out locally, then tell the server.
    ///
    /// The server call never changes the outcome.
    pub async fn logout(&self) -> StatusLine {
        let line = match self.sessions.clear_session().await {
            Ok(()) => {
                info!("Signed out");
                StatusLine::success("Logged out successfully")
            }
            Err(e) => {
                warn!("Storage error during logout: {}", e);
                StatusLine::error("Logout failed - storage error")
            }
        };

        if let Err(e) = self.api.logout().await {
            warn!("Server logout failed: {}", e);
        }
        self.show(line)
    }

    /// Claim today's free credits.
    pub async fn claim(&self, now: DateTime<Utc>) -> StatusLine {
        let session = match self.sessions.get_session().await {
            Ok(Some(session)) if session.authenticated => session,
            Ok(_) => return self.show(StatusLine::error(CreditError::NotSignedIn.to_string())),
            Err(e) => {
                warn!("Failed to read session: {}", e);
                return self.show(StatusLine::error("Failed to claim daily credits"));
            }
        };
        if !self.ledger.claim_button(&session, now).is_enabled() {
            return self.show(StatusLine::info("Daily credits already claimed today"));
        }

        self.show(StatusLine::loading("Claiming daily credits..."));
        let line = match self.ledger.claim_daily(now).await {
            Ok(grant) => StatusLine::success(format!("Claimed {} credits!", grant.credits_added)),
            Err(e) => StatusLine::error(credit_error_message(
                e,
                "Failed to claim credits",
                "Failed to claim daily credits",
            )),
        };
        self.show(line)
    }

    /// Start a credit purchase.
    pub async fn buy(&self) -> CheckoutStatus {
        self.show(StatusLine::loading("Creating checkout session..."));
        let (status, checkout_url) = match self.ledger.buy().await {
            Ok(url) => (StatusLine::success("Redirecting to checkout..."), Some(url)),
            Err(e) => (
                StatusLine::error(credit_error_message(
                    e,
                    "Failed to create checkout session",
                    "Failed to start checkout process",
                )),
                None,
            ),
        };
        CheckoutStatus {
            status: self.show(status),
            checkout_url,
        }
    }
}

/// Message for a failed credit action: the server's own wording when it
/// gave one, `rejected` when it refused without one, `failed` when the
/// request never completed.
fn credit_error_message(err: CreditError, rejected: &str, failed: &str) -> String {
    let message = match err {
        CreditError::NotSignedIn => return err.to_string(),
        CreditError::AlreadyClaimed(message) | CreditError::Rejected(message) => message,
        CreditError::Api(ApiError::Status { message, .. }) => message,
        CreditError::Api(ApiError::Decode(message)) => message,
        CreditError::Api(ApiError::Network(message)) => {
            warn!("Credit request failed: {}", message);
            return failed.to_string();
        }
        CreditError::Storage(e) => {
            warn!("Credit storage failed: {}", e);
            return failed.to_string();
        }
    };
    if message.trim().is_empty() {
        rejected.to_string()
    } else {
        message
    }
}

impl std::fmt::Debug for PopupController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PopupController")
            .field("host", &self.host)
            .field("operation_timeout", &self.operation_timeout)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "popup_tests.rs"]
mod tests;
