//! Selector lists for each role an element plays in the compose page.

use cordial_config::SelectorsConfig;
use cordial_protocols::{DomQuery, ElementHandle};
use tracing::{debug, warn};

/// What a selector list is used to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectorRole {
    /// The compose body.
    Editor,
    /// Messages of the open conversation.
    ThreadMessage,
    /// The conversation or draft subject.
    Subject,
    /// Rendered bodies of earlier messages; their presence marks a reply.
    PriorMessage,
    /// The subject input whose `Re:`/`Fwd:` prefix marks a reply.
    ReplySubject,
    /// Anything that shows a compose window is open.
    ComposeIndicator,
}

impl SelectorRole {
    pub const ALL: [SelectorRole; 6] = [
        Self::Editor,
        Self::ThreadMessage,
        Self::Subject,
        Self::PriorMessage,
        Self::ReplySubject,
        Self::ComposeIndicator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Editor => "editor",
            Self::ThreadMessage => "thread_message",
            Self::Subject => "subject",
            Self::PriorMessage => "prior_message",
            Self::ReplySubject => "reply_subject",
            Self::ComposeIndicator => "compose_indicator",
        }
    }

    /// Built-in selectors for Gmail.
    pub fn defaults(&self) -> &'static [&'static str] {
        match self {
            Self::Editor => &[
                "[contenteditable=\"true\"]",
                "div[role=\"textbox\"]",
                ".Am.Al.editable",
                ".ii.gt .a3s",
                "div[aria-label*=\"Message Body\"]",
            ],
            Self::ThreadMessage => &[
                ".ii.gt",
                ".adn.ads",
                ".h7",
                ".ii.gt .a3s",
                "[data-message-id]",
                ".nH .if",
                ".Ar.Au .h7",
            ],
            Self::Subject => &[".hP", ".bog", "[name=\"subjectbox\"]", ".aoT"],
            Self::PriorMessage => &[".ii.gt .a3s", ".adn .a3s", ".gs .a3s"],
            Self::ReplySubject => &["input[name=\"subjectbox\"]"],
            Self::ComposeIndicator => &[
                ".M9",
                ".AD",
                "div[role=\"dialog\"] [contenteditable=\"true\"]",
                "[name=\"subjectbox\"]",
                ".Am.Al.editable",
                "[contenteditable=\"true\"]",
            ],
        }
    }
}

impl std::fmt::Display for SelectorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered selector lists, one per [`SelectorRole`].
///
/// Earlier selectors take priority. Syntax is never validated here; a
/// malformed selector simply matches nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorRegistry {
    editor: Vec<String>,
    thread_message: Vec<String>,
    subject: Vec<String>,
    prior_message: Vec<String>,
    reply_subject: Vec<String>,
    compose_indicator: Vec<String>,
}

impl Default for SelectorRegistry {
    fn default() -> Self {
        Self::from_config(&SelectorsConfig::default())
    }
}

impl SelectorRegistry {
    /// Registry with configured overrides. Absent or empty lists fall back
    /// to the defaults of their role.
    pub fn from_config(config: &SelectorsConfig) -> Self {
        let pick = |role: SelectorRole, configured: &Option<Vec<String>>| match configured {
            Some(list) if !list.is_empty() => list.clone(),
            _ => role.defaults().iter().map(|s| s.to_string()).collect(),
        };

        Self {
            editor: pick(SelectorRole::Editor, &config.editor),
            thread_message: pick(SelectorRole::ThreadMessage, &config.thread_message),
            subject: pick(SelectorRole::Subject, &config.subject),
            prior_message: pick(SelectorRole::PriorMessage, &config.prior_message),
            reply_subject: pick(SelectorRole::ReplySubject, &config.reply_subject),
            compose_indicator: pick(SelectorRole::ComposeIndicator, &config.compose_indicator),
        }
    }

    /// Replace the list of one role.
    pub fn with_role(mut self, role: SelectorRole, selectors: &[&str]) -> Self {
        *self.slot(role) = selectors.iter().map(|s| s.to_string()).collect();
        self
    }

    fn slot(&mut self, role: SelectorRole) -> &mut Vec<String> {
        match role {
            SelectorRole::Editor => &mut self.editor,
            SelectorRole::ThreadMessage => &mut self.thread_message,
            SelectorRole::Subject => &mut self.subject,
            SelectorRole::PriorMessage => &mut self.prior_message,
            SelectorRole::ReplySubject => &mut self.reply_subject,
            SelectorRole::ComposeIndicator => &mut self.compose_indicator,
        }
    }

    pub fn selectors(&self, role: SelectorRole) -> &[String] {
        match role {
            SelectorRole::Editor => &self.editor,
            SelectorRole::ThreadMessage => &self.thread_message,
            SelectorRole::Subject => &self.subject,
            SelectorRole::PriorMessage => &self.prior_message,
            SelectorRole::ReplySubject => &self.reply_subject,
            SelectorRole::ComposeIndicator => &self.compose_indicator,
        }
    }

    /// Matches of the first selector of `role` that matches anything.
    ///
    /// Transport failures count as no match.
    pub async fn first_matches(
        &self,
        dom: &dyn DomQuery,
        role: SelectorRole,
    ) -> Option<(&str, Vec<ElementHandle>)> {
        for selector in self.selectors(role) {
            match dom.query_selector_all(selector).await {
                Ok(found) if !found.is_empty() => {
                    debug!(role = %role, selector = %selector, count = found.len(), "Selector matched");
                    return Some((selector.as_str(), found));
                }
                Ok(_) => {}
                Err(e) => warn!(role = %role, selector = %selector, "Query failed: {}", e),
            }
        }
        None
    }

    /// First element matched by the first matching selector of `role`.
    pub async fn first_element(&self, dom: &dyn DomQuery, role: SelectorRole) -> Option<ElementHandle> {
        for selector in self.selectors(role) {
            match dom.query_selector(selector).await {
                Ok(Some(element)) => return Some(element),
                Ok(None) => {}
                Err(e) => warn!(role = %role, selector = %selector, "Query failed: {}", e),
            }
        }
        None
    }

    /// Whether any selector of `role` matches.
    pub async fn any_present(&self, dom: &dyn DomQuery, role: SelectorRole) -> bool {
        self.first_element(dom, role).await.is_some()
    }
}
