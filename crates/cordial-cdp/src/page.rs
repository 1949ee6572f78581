//! A live tab seen through the page bridge.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use cordial_protocols::{
    DomError, DomMutation, DomQuery, ElementHandle, MutationWatcher, Notification, Notifier,
};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, trace, warn};

use crate::bridge_script::{MUTATION_BINDING, TRIGGER_BINDING, bridge_call, bridge_script};
use crate::error::CdpError;
use crate::protocol::{BindingCalled, CdpResponse};
use crate::session::PageSession;
use crate::triggers::PageTrigger;

type TriggerSender = Arc<Mutex<Option<broadcast::Sender<PageTrigger>>>>;

/// Document access, mutation events and notifications for one tab.
pub struct CdpPage {
    session: Arc<PageSession>,
    mutations: broadcast::Sender<DomMutation>,
    triggers: TriggerSender,
    triggers_enabled: Arc<AtomicBool>,
    pump: tokio::task::JoinHandle<()>,
}

impl CdpPage {
    /// Inject the page bridge into the session's tab.
    ///
    /// The script is also registered for documents the tab loads later, so
    /// the bridge survives reloads.
    pub async fn install(session: PageSession) -> Result<Self, CdpError> {
        let session = Arc::new(session);
        let events = session
            .take_events()
            .ok_or_else(|| CdpError::InvalidResponse("Page events already taken".to_string()))?;

        session.add_binding(MUTATION_BINDING).await?;
        session.add_binding(TRIGGER_BINDING).await?;
        session.add_script_on_new_document(bridge_script()).await?;
        let state = session.evaluate(bridge_script()).await?;
        debug!(target = session.target_id(), state = %state, "Page bridge ready");

        let (mutations, _) = broadcast::channel(64);
        let (triggers, _) = broadcast::channel(16);
        let triggers: TriggerSender = Arc::new(Mutex::new(Some(triggers)));
        let triggers_enabled = Arc::new(AtomicBool::new(false));

        let pump = tokio::spawn(Self::pump(
            events,
            session.clone(),
            mutations.clone(),
            triggers.clone(),
            triggers_enabled.clone(),
        ));

        Ok(Self {
            session,
            mutations,
            triggers,
            triggers_enabled,
            pump,
        })
    }

    pub fn target_id(&self) -> &str {
        self.session.target_id()
    }

    /// Whether the tab's event stream has ended.
    pub fn is_closed(&self) -> bool {
        self.pump.is_finished()
    }

    /// Show the floating rewrite button and enable Ctrl+Shift+R, now and
    /// after every reload. The stream closes when the tab goes away.
    pub async fn enable_triggers(&self) -> Result<broadcast::Receiver<PageTrigger>, CdpError> {
        let receiver = self
            .triggers
            .lock()
            .as_ref()
            .map(|tx| tx.subscribe())
            .ok_or(CdpError::SessionClosed)?;
        self.triggers_enabled.store(true, Ordering::SeqCst);
        self.session
            .evaluate(&bridge_call("installTriggers", &[]))
            .await?;
        Ok(receiver)
    }

    async fn pump(
        mut events: mpsc::UnboundedReceiver<CdpResponse>,
        session: Arc<PageSession>,
        mutations: broadcast::Sender<DomMutation>,
        triggers: TriggerSender,
        triggers_enabled: Arc<AtomicBool>,
    ) {
        while let Some(event) = events.recv().await {
            if let Some(call) = BindingCalled::from_event(&event) {
                match call.name.as_str() {
                    MUTATION_BINDING => {
                        // No receivers is fine.
                        let _ = mutations.send(mutation_kind(&call.payload));
                    }
                    TRIGGER_BINDING => {
                        if let Some(trigger) = PageTrigger::from_payload(&call.payload) {
                            debug!(?trigger, "Page trigger");
                            if let Some(tx) = triggers.lock().as_ref() {
                                let _ = tx.send(trigger);
                            }
                        }
                    }
                    other => trace!(binding = other, "Unhandled binding call"),
                }
                continue;
            }

            if event.method.as_deref() == Some("Page.loadEventFired")
                && triggers_enabled.load(Ordering::SeqCst)
            {
                debug!(target = session.target_id(), "Document reloaded, reinstalling triggers");
                if let Err(e) = session.evaluate(&bridge_call("installTriggers", &[])).await {
                    warn!("Failed to reinstall page triggers: {}", e);
                }
            }
        }

        debug!(target = session.target_id(), "Page event stream ended");
        triggers.lock().take();
    }

    async fn bridge<T: DeserializeOwned>(&self, method: &str, args: &[Value]) -> Result<T, DomError> {
        let value = self.session.evaluate(&bridge_call(method, args)).await?;
        serde_json::from_value(value)
            .map_err(|e| DomError::InvalidResponse(format!("{}: {}", method, e)))
    }
}

impl Drop for CdpPage {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

impl std::fmt::Debug for CdpPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdpPage")
            .field("session", &self.session)
            .field("triggers_enabled", &self.triggers_enabled.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Mutation kind named by a `MutationRecord.type`.
fn mutation_kind(record_type: &str) -> DomMutation {
    match record_type {
        "attributes" => DomMutation::Attributes,
        "characterData" => DomMutation::CharacterData,
        _ => DomMutation::ChildList,
    }
}

#[async_trait]
impl DomQuery for CdpPage {
    async fn query_selector(&self, selector: &str) -> Result<Option<ElementHandle>, DomError> {
        let id: Option<u64> = self.bridge("query", &[json!(selector)]).await?;
        Ok(id.map(ElementHandle::new))
    }

    async fn query_selector_all(&self, selector: &str) -> Result<Vec<ElementHandle>, DomError> {
        let ids: Vec<u64> = self.bridge("queryAll", &[json!(selector)]).await?;
        Ok(ids.into_iter().map(ElementHandle::new).collect())
    }

    async fn is_connected(&self, element: ElementHandle) -> Result<bool, DomError> {
        self.bridge("isConnected", &[json!(element.id())]).await
    }

    async fn is_content_editable(&self, element: ElementHandle) -> Result<bool, DomError> {
        self.bridge("isContentEditable", &[json!(element.id())]).await
    }

    async fn has_editable_descendant(&self, element: ElementHandle) -> Result<bool, DomError> {
        self.bridge("hasEditableDescendant", &[json!(element.id())])
            .await
    }

    async fn inner_text(&self, element: ElementHandle) -> Result<String, DomError> {
        self.bridge("innerText", &[json!(element.id())]).await
    }

    async fn value(&self, element: ElementHandle) -> Result<Option<String>, DomError> {
        self.bridge("value", &[json!(element.id())]).await
    }

    async fn inner_html(&self, element: ElementHandle) -> Result<String, DomError> {
        self.bridge("innerHTML", &[json!(element.id())]).await
    }

    async fn set_inner_html(&self, element: ElementHandle, html: &str) -> Result<(), DomError> {
        self.bridge("setInnerHTML", &[json!(element.id()), json!(html)])
            .await
    }

    async fn set_text_content(&self, element: ElementHandle, text: &str) -> Result<(), DomError> {
        self.bridge("setTextContent", &[json!(element.id()), json!(text)])
            .await
    }

    async fn dispatch_event(&self, element: ElementHandle, event_type: &str) -> Result<(), DomError> {
        self.bridge("dispatch", &[json!(element.id()), json!(event_type)])
            .await
    }
}

impl MutationWatcher for CdpPage {
    fn subscribe(&self) -> broadcast::Receiver<DomMutation> {
        self.mutations.subscribe()
    }
}

#[async_trait]
impl Notifier for CdpPage {
    async fn notify(&self, notification: Notification) {
        let expression = bridge_call(
            "notify",
            &[json!(notification.kind.as_str()), json!(notification.message)],
        );
        if let Err(e) = self.session.evaluate(&expression).await {
            warn!("Failed to show page notification: {}", e);
        }
    }
}
