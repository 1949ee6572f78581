//! Popup-side access to browser tabs.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::dom::{DomQuery, MutationWatcher};
use crate::error::BridgeError;
use crate::notify::Notifier;

/// A browser tab as seen from the popup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub title: String,
}

/// Page capabilities obtained by attaching to a tab.
#[derive(Clone)]
pub struct AttachedPage {
    pub dom: Arc<dyn DomQuery>,
    pub watcher: Arc<dyn MutationWatcher>,
    pub notifier: Arc<dyn Notifier>,
}

impl AttachedPage {
    /// Build from one object that provides every capability.
    pub fn from_shared<P>(page: Arc<P>) -> Self
    where
        P: DomQuery + MutationWatcher + Notifier + 'static,
    {
        Self {
            dom: page.clone(),
            watcher: page.clone(),
            notifier: page,
        }
    }
}

impl std::fmt::Debug for AttachedPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachedPage").finish_non_exhaustive()
    }
}

/// Reaches the active tab and injects the page-side machinery into it.
#[async_trait]
pub trait TabBridge: Send + Sync {
    /// The tab the user is currently looking at, if any.
    async fn active_tab(&self) -> Result<Option<TabInfo>, BridgeError>;

    /// Attach to a tab, injecting the page bridge when it is not loaded yet.
    async fn attach(&self, tab: &TabInfo) -> Result<AttachedPage, BridgeError>;
}
