//! Conversation context for a rewrite.

use std::sync::Arc;

use cordial_protocols::{DomQuery, ElementHandle, Tone};
use tracing::{debug, warn};

use crate::selectors::{SelectorRegistry, SelectorRole};

/// Default minimum length of a thread message worth sending as context.
pub const DEFAULT_MIN_MESSAGE_CHARS: usize = 20;

const REPLY_PREFIXES: [&str; 3] = ["re:", "fwd:", "fw:"];

/// Reads the conversation around the compose window.
pub struct ContextExtractor {
    dom: Arc<dyn DomQuery>,
    selectors: Arc<SelectorRegistry>,
    min_message_chars: usize,
}

impl ContextExtractor {
    pub fn new(dom: Arc<dyn DomQuery>, selectors: Arc<SelectorRegistry>) -> Self {
        Self {
            dom,
            selectors,
            min_message_chars: DEFAULT_MIN_MESSAGE_CHARS,
        }
    }

    pub fn with_min_message_chars(mut self, min: usize) -> Self {
        self.min_message_chars = min;
        self
    }

    /// Whether the draft answers an existing conversation.
    ///
    /// The draft counts as new only when no earlier message is rendered
    /// and the subject lacks a `Re:`/`Fwd:`/`Fw:` prefix. A prefixed
    /// subject alone is enough to make it a reply, which covers collapsed
    /// threads that render no earlier message.
    pub async fn is_reply_context(&self) -> bool {
        let has_prior_messages = self
            .selectors
            .any_present(self.dom.as_ref(), SelectorRole::PriorMessage)
            .await;
        let is_reply_subject = self.reply_subject_prefixed().await;

        let is_new_email = !has_prior_messages && !is_reply_subject;
        debug!(has_prior_messages, is_reply_subject, is_new_email, "Classified draft");
        !is_new_email
    }

    async fn reply_subject_prefixed(&self) -> bool {
        let Some(input) = self
            .selectors
            .first_element(self.dom.as_ref(), SelectorRole::ReplySubject)
            .await
        else {
            return false;
        };
        match self.dom.value(input).await {
            Ok(Some(value)) => {
                let value = value.to_lowercase();
                REPLY_PREFIXES.iter().any(|p| value.starts_with(p))
            }
            Ok(None) => false,
            Err(e) => {
                warn!("Failed to read subject value: {}", e);
                false
            }
        }
    }

    /// Text of the earlier messages, or the subject line when there is none.
    ///
    /// Only the first thread selector that matches anything is used. Each
    /// kept message is numbered by its position among all matches; short
    /// messages and anything editable (the compose window itself) are
    /// skipped.
    pub async fn extract_thread_context(&self) -> String {
        let mut context = String::new();

        if let Some((selector, messages)) = self
            .selectors
            .first_matches(self.dom.as_ref(), SelectorRole::ThreadMessage)
            .await
        {
            for (index, message) in messages.into_iter().enumerate() {
                if let Some(text) = self.message_text(message).await {
                    context.push_str(&format!("\n--- Message {} ---\n{}\n", index + 1, text));
                }
            }
            debug!(selector = %selector, "Thread context: {} chars", context.len());
        }

        let context = context.trim();
        if !context.is_empty() {
            return context.to_string();
        }

        match self.subject_text().await {
            Some(subject) => format!("Subject: {}", subject),
            None => String::new(),
        }
    }

    /// Trimmed text of a thread message, if it qualifies as context.
    async fn message_text(&self, message: ElementHandle) -> Option<String> {
        let text = match self.dom.inner_text(message).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to read thread message: {}", e);
                return None;
            }
        };
        let text = text.trim();
        if text.chars().count() < self.min_message_chars {
            return None;
        }

        // An element whose editability cannot be checked may hold the draft.
        let editable = match self.dom.is_content_editable(message).await {
            Ok(editable) => editable,
            Err(e) => {
                warn!(element = message.id(), "Skipping thread message, editable check failed: {}", e);
                return None;
            }
        };
        let wraps_editor = match self.dom.has_editable_descendant(message).await {
            Ok(wraps) => wraps,
            Err(e) => {
                warn!(element = message.id(), "Skipping thread message, descendant check failed: {}", e);
                return None;
            }
        };
        if editable || wraps_editor {
            debug!(element = message.id(), "Skipping editable thread match");
            return None;
        }
        Some(text.to_string())
    }

    /// First subject element with text, trying rendered text then form value.
    async fn subject_text(&self) -> Option<String> {
        for selector in self.selectors.selectors(SelectorRole::Subject) {
            let Ok(Some(element)) = self.dom.query_selector(selector).await else {
                continue;
            };
            let rendered = self.dom.inner_text(element).await.unwrap_or_default();
            let text = if rendered.trim().is_empty() {
                self.dom.value(element).await.ok().flatten().unwrap_or_default()
            } else {
                rendered
            };
            let text = text.trim();
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
        None
    }
}

impl std::fmt::Debug for ContextExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextExtractor")
            .field("min_message_chars", &self.min_message_chars)
            .finish_non_exhaustive()
    }
}

/// Prompt sent to the rewriting service.
///
/// A non-empty `context` selects the reply template. The tone is sent as
/// its own request field and does not appear in the prompt.
pub fn build_prompt(draft: &str, context: &str, _tone: Tone) -> String {
    if context.is_empty() {
        format!(
            "My draft email:\n{draft}\n\nPlease rewrite this email to be more professional and \
             well-structured. This is a new email I'm sending out (not a reply), so make it \
             appropriate for reaching out or initiating communication."
        )
    } else {
        format!(
            "Email Thread Context:\n{context}\n\n--- My Draft Reply ---\n{draft}\n\nPlease \
             rewrite my draft reply to be more professional and well-structured, taking into \
             account the context of the email thread above."
        )
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
