//! A saved page standing in for the active tab.

use std::sync::Arc;

use async_trait::async_trait;

use cordial_core::TracingNotifier;
use cordial_dom::MemoryDocument;
use cordial_protocols::{AttachedPage, BridgeError, TabBridge, TabInfo};

/// One tab on the mail host showing a parsed HTML snapshot.
///
/// Nobody sees the page, so notifications go to the log.
pub(crate) struct SnapshotTabs {
    tab: TabInfo,
    document: Arc<MemoryDocument>,
}

impl SnapshotTabs {
    pub fn new(host: &str, html: &str) -> Self {
        Self {
            tab: TabInfo {
                id: "snapshot".to_string(),
                url: format!("https://{}/mail/u/0/", host),
                title: "Snapshot".to_string(),
            },
            document: Arc::new(MemoryDocument::from_html(html)),
        }
    }

    pub fn document(&self) -> &MemoryDocument {
        &self.document
    }
}

#[async_trait]
impl TabBridge for SnapshotTabs {
    async fn active_tab(&self) -> Result<Option<TabInfo>, BridgeError> {
        Ok(Some(self.tab.clone()))
    }

    async fn attach(&self, _tab: &TabInfo) -> Result<AttachedPage, BridgeError> {
        Ok(AttachedPage {
            dom: self.document.clone(),
            watcher: self.document.clone(),
            notifier: Arc::new(TracingNotifier),
        })
    }
}
