//! Tab access for the popup, backed by a Chrome debugging endpoint.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use cordial_protocols::{AttachedPage, BridgeError, TabBridge, TabInfo};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::client::{CdpClient, list_pages};
use crate::error::CdpError;
use crate::page::CdpPage;
use crate::session::PageSession;

/// Reaches tabs of one browser.
///
/// The WebSocket connection is opened on first attach. Attached pages are
/// kept, so attaching to the same tab again reuses its bridge.
pub struct CdpTabBridge {
    endpoint: String,
    client: tokio::sync::Mutex<Option<Arc<CdpClient>>>,
    pages: Mutex<HashMap<String, Arc<CdpPage>>>,
}

impl CdpTabBridge {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            client: tokio::sync::Mutex::new(None),
            pages: Mutex::new(HashMap::new()),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn client(&self) -> Result<Arc<CdpClient>, CdpError> {
        let mut client = self.client.lock().await;
        if let Some(client) = client.as_ref() {
            return Ok(client.clone());
        }
        let connected = Arc::new(CdpClient::connect(&self.endpoint).await?);
        info!(endpoint = %self.endpoint, "Connected to browser");
        *client = Some(connected.clone());
        Ok(connected)
    }

    /// Attach to `tab`, injecting the page bridge unless it is already live.
    pub async fn attach_page(&self, tab: &TabInfo) -> Result<Arc<CdpPage>, CdpError> {
        let cached = self.pages.lock().get(&tab.id).cloned();
        if let Some(page) = cached {
            if !page.is_closed() {
                debug!(tab = %tab.id, "Reusing page bridge");
                return Ok(page);
            }
        }

        let session = self.client().await?.attach_page(&tab.id).await?;
        let page = Arc::new(CdpPage::install(session).await?);
        self.pages.lock().insert(tab.id.clone(), page.clone());
        info!(tab = %tab.id, url = %tab.url, "Page bridge attached");
        Ok(page)
    }

    /// Open `url` in a new tab.
    pub async fn open_tab(&self, url: &str) -> Result<PageSession, CdpError> {
        self.client().await?.new_page(url).await
    }

    /// Close a tab opened with [`open_tab`](Self::open_tab).
    pub async fn close_tab(&self, target_id: &str) -> Result<(), CdpError> {
        self.pages.lock().remove(target_id);
        self.client().await?.close_page(target_id).await
    }
}

impl std::fmt::Debug for CdpTabBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdpTabBridge")
            .field("endpoint", &self.endpoint)
            .field("attached", &self.pages.lock().len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TabBridge for CdpTabBridge {
    /// The most recently focused tab.
    async fn active_tab(&self) -> Result<Option<TabInfo>, BridgeError> {
        let pages = list_pages(&self.endpoint).await?;
        Ok(pages.into_iter().find(|p| p.is_tab()).map(|p| TabInfo {
            id: p.id,
            url: p.url,
            title: p.title,
        }))
    }

    async fn attach(&self, tab: &TabInfo) -> Result<AttachedPage, BridgeError> {
        let page = self.attach_page(tab).await?;
        Ok(AttachedPage::from_shared(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

    #[tokio::test]
    async fn test_active_tab_skips_non_page_targets() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("GET"))
            .and(matchers::path("/json/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "W", "type": "service_worker", "url": "chrome-extension://x/bg.js"},
                {"id": "A", "type": "page", "title": "Inbox", "url": "https://mail.google.com/mail/u/0/"},
                {"id": "B", "type": "page", "title": "Docs", "url": "https://docs.rs/"}
            ])))
            .mount(&server)
            .await;

        let tabs = CdpTabBridge::new(server.uri());
        let tab = tabs.active_tab().await.unwrap().unwrap();
        assert_eq!(tab.id, "A");
        assert_eq!(tab.title, "Inbox");
    }

    #[tokio::test]
    async fn test_no_tabs() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("GET"))
            .and(matchers::path("/json/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let tabs = CdpTabBridge::new(server.uri());
        assert!(tabs.active_tab().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_browser_not_running() {
        let tabs = CdpTabBridge::new("http://127.0.0.1:1/");
        assert_eq!(tabs.endpoint(), "http://127.0.0.1:1");
        let err = tabs.active_tab().await.unwrap_err();
        assert!(matches!(err, BridgeError::BrowserUnavailable(_)));
    }
}
