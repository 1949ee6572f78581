//! One rewrite of the compose draft.

use std::sync::Arc;
use std::time::Duration;

use cordial_api::ApiClient;
use cordial_config::Config;
use cordial_protocols::{
    AttachedPage, DomQuery, ElementHandle, Notification, Notifier, RewriteError, RewriteRequest,
    RewriteResult, Tone,
};
use tracing::{debug, info, warn};

use crate::context::{ContextExtractor, DEFAULT_MIN_MESSAGE_CHARS, build_prompt};
use crate::locator::{DEFAULT_CACHE_TTL, EditorLocator};
use crate::sanitize::text_to_editor_html;
use crate::selectors::{SelectorRegistry, SelectorRole};
use crate::session::SessionStore;

/// Shown while the rewrite request is in flight.
pub const IN_PROGRESS_MESSAGE: &str = "Rewriting your email...";

/// Shown when the rewritten text is in the editor.
pub const SUCCESS_MESSAGE: &str = "Email rewritten!";

/// Tunables of the rewrite flow.
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    pub cache_ttl: Duration,
    pub min_draft_chars: usize,
    pub min_message_chars: usize,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            min_draft_chars: 5,
            min_message_chars: DEFAULT_MIN_MESSAGE_CHARS,
        }
    }
}

impl OrchestratorOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            cache_ttl: Duration::from_millis(config.locator.cache_ttl_ms),
            min_draft_chars: config.rewrite.min_draft_chars,
            min_message_chars: config.rewrite.min_message_chars,
        }
    }
}

/// Runs a rewrite against one page.
///
/// Every call ends in a [`RewriteResult`] and a notification on the page.
/// Nothing is retried; concurrent calls on the same page are not serialized.
pub struct RewriteOrchestrator {
    dom: Arc<dyn DomQuery>,
    notifier: Arc<dyn Notifier>,
    selectors: Arc<SelectorRegistry>,
    locator: EditorLocator,
    context: ContextExtractor,
    sessions: SessionStore,
    api: ApiClient,
    min_draft_chars: usize,
}

impl RewriteOrchestrator {
    pub fn new(
        page: &AttachedPage,
        selectors: Arc<SelectorRegistry>,
        sessions: SessionStore,
        api: ApiClient,
        options: OrchestratorOptions,
    ) -> Self {
        let locator = EditorLocator::new(page.dom.clone(), page.watcher.clone(), selectors.clone())
            .with_cache_ttl(options.cache_ttl);
        let context = ContextExtractor::new(page.dom.clone(), selectors.clone())
            .with_min_message_chars(options.min_message_chars);

        Self {
            dom: page.dom.clone(),
            notifier: page.notifier.clone(),
            selectors,
            locator,
            context,
            sessions,
            api,
            min_draft_chars: options.min_draft_chars,
        }
    }

    pub fn locator(&self) -> &EditorLocator {
        &self.locator
    }

    pub fn context(&self) -> &ContextExtractor {
        &self.context
    }

    /// Rewrite the current draft in `tone`.
    pub async fn rewrite(&self, tone: Tone) -> RewriteResult {
        info!(tone = %tone, "Rewrite requested");
        let result = RewriteResult::from(self.run(tone).await);

        let notification = match &result {
            RewriteResult::Success { credits_remaining, .. } => {
                info!(credits_remaining = ?credits_remaining, "Rewrite applied");
                Notification::success(SUCCESS_MESSAGE)
            }
            RewriteResult::Failure { error, message } => {
                info!(kind = error.kind(), "Rewrite failed: {}", message);
                Notification::new(error.notification_kind(), message.clone())
            }
        };
        self.notifier.notify(notification).await;
        result
    }

    /// Like [`rewrite`](Self::rewrite), but first give the page up to
    /// `timeout` to render an editor.
    pub async fn rewrite_when_ready(&self, tone: Tone, timeout: Duration) -> RewriteResult {
        if let Err(e) = self.locator.wait_for_editor(timeout).await {
            debug!("No editor after {:?}: {}", timeout, e);
        }
        self.rewrite(tone).await
    }

    async fn run(&self, tone: Tone) -> Result<(String, Option<u32>), RewriteError> {
        if !self
            .selectors
            .any_present(self.dom.as_ref(), SelectorRole::ComposeIndicator)
            .await
        {
            return Err(RewriteError::NoComposeWindow);
        }

        let editor = self
            .locator
            .locate_editor()
            .await
            .ok_or(RewriteError::EditorNotFound)?;

        let draft = self
            .dom
            .inner_text(editor)
            .await
            .map_err(|e| RewriteError::PageError(e.to_string()))?;
        let draft = draft.trim();
        if draft.is_empty() {
            return Err(RewriteError::EmptyDraft);
        }
        if draft.chars().count() < self.min_draft_chars {
            return Err(RewriteError::DraftTooShort);
        }

        let session = self
            .sessions
            .get_session()
            .await
            .map_err(|e| RewriteError::StorageError(e.to_string()))?
            .filter(|s| s.authenticated)
            .ok_or(RewriteError::AuthRequired)?;

        self.notifier
            .notify(Notification::info(IN_PROGRESS_MESSAGE))
            .await;

        let context = if self.context.is_reply_context().await {
            self.context.extract_thread_context().await
        } else {
            String::new()
        };
        let request = RewriteRequest {
            message: build_prompt(draft, &context, tone),
            tone,
            user: Some(session.identity()),
        };
        debug!(
            reply = !context.is_empty(),
            prompt_chars = request.message.len(),
            "Sending rewrite request"
        );

        let response = self.api.generate_reply(&request).await?;
        let text = response
            .text()
            .ok_or(RewriteError::EmptyServerResponse)?
            .to_string();

        self.write_back(editor, &text).await?;

        if let Some(credits) = response.credits_remaining {
            if let Err(e) = self.sessions.update_credits(credits).await {
                warn!("Failed to cache remaining credits: {}", e);
            }
        }

        Ok((text, response.credits_remaining))
    }

    /// Replace the editor's content with `text` and let the page know.
    async fn write_back(&self, editor: ElementHandle, text: &str) -> Result<(), RewriteError> {
        // The page may have re-rendered the editor while the request was out.
        if !self.dom.is_connected(editor).await.unwrap_or(false) {
            self.locator.invalidate();
            return Err(RewriteError::EditorNotFound);
        }

        let page_error = |e: cordial_protocols::DomError| RewriteError::PageError(e.to_string());
        self.dom
            .set_inner_html(editor, &text_to_editor_html(text))
            .await
            .map_err(page_error)?;
        for event in ["input", "change"] {
            self.dom
                .dispatch_event(editor, event)
                .await
                .map_err(page_error)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for RewriteOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewriteOrchestrator")
            .field("locator", &self.locator)
            .field("min_draft_chars", &self.min_draft_chars)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
