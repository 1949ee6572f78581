//! [`MemoryDocument`]: the page protocols over an in-memory tree.

use async_trait::async_trait;
use cordial_protocols::{
    DomError, DomMutation, DomQuery, ElementHandle, MutationWatcher, Notification, Notifier,
};
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::html;
use crate::selector::SelectorList;
use crate::tree::DocumentTree;

const MUTATION_CHANNEL_CAPACITY: usize = 64;

/// An event dispatched through [`DomQuery::dispatch_event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchedEvent {
    pub target: ElementHandle,
    pub event_type: String,
}

/// In-memory document.
///
/// Every structural change is broadcast to [`MutationWatcher`] subscribers,
/// and dispatched events and notifications are recorded for inspection.
pub struct MemoryDocument {
    tree: RwLock<DocumentTree>,
    mutations: broadcast::Sender<DomMutation>,
    events: Mutex<Vec<DispatchedEvent>>,
    notifications: Mutex<Vec<Notification>>,
}

impl MemoryDocument {
    /// Create a document with an empty `body`.
    pub fn new() -> Self {
        let (mutations, _) = broadcast::channel(MUTATION_CHANNEL_CAPACITY);
        Self {
            tree: RwLock::new(DocumentTree::new()),
            mutations,
            events: Mutex::new(Vec::new()),
            notifications: Mutex::new(Vec::new()),
        }
    }

    /// Create a document whose `body` holds the parsed `html`.
    pub fn from_html(html: &str) -> Self {
        let doc = Self::new();
        if let Err(e) = html::parse_fragment(&mut doc.tree.write(), DocumentTree::ROOT, html) {
            warn!("Failed to load document markup: {}", e);
        }
        doc
    }

    pub fn body(&self) -> ElementHandle {
        handle(DocumentTree::ROOT)
    }

    /// Parse `html` and append it to `parent`.
    pub fn append_html(&self, parent: ElementHandle, html: &str) -> Result<(), DomError> {
        html::parse_fragment(&mut self.tree.write(), index(parent)?, html)?;
        self.emit(DomMutation::ChildList);
        Ok(())
    }

    /// Detach an element from the document.
    pub fn remove(&self, element: ElementHandle) -> Result<(), DomError> {
        self.tree.write().detach(index(element)?)?;
        self.emit(DomMutation::ChildList);
        Ok(())
    }

    pub fn set_attribute(
        &self,
        element: ElementHandle,
        name: &str,
        value: &str,
    ) -> Result<(), DomError> {
        self.tree.write().set_attribute(index(element)?, name, value)?;
        self.emit(DomMutation::Attributes);
        Ok(())
    }

    /// Synchronous `querySelector`.
    pub fn find(&self, selector: &str) -> Option<ElementHandle> {
        self.find_all(selector).into_iter().next()
    }

    /// Synchronous `querySelectorAll`.
    pub fn find_all(&self, selector: &str) -> Vec<ElementHandle> {
        match SelectorList::parse(selector) {
            Ok(selectors) => self
                .tree
                .read()
                .select(&selectors)
                .into_iter()
                .map(handle)
                .collect(),
            Err(e) => {
                debug!(selector = %selector, error = %e, "Selector matches nothing");
                Vec::new()
            }
        }
    }

    /// Markup of the whole `body`.
    pub fn to_html(&self) -> String {
        html::serialize_children(&self.tree.read(), DocumentTree::ROOT).unwrap_or_default()
    }

    pub fn events(&self) -> Vec<DispatchedEvent> {
        self.events.lock().clone()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().clone()
    }

    /// The notification currently on screen.
    pub fn last_notification(&self) -> Option<Notification> {
        self.notifications.lock().last().cloned()
    }

    fn emit(&self, mutation: DomMutation) {
        // No subscribers is fine.
        let _ = self.mutations.send(mutation);
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDocument")
            .field("events", &self.events.lock().len())
            .field("notifications", &self.notifications.lock().len())
            .finish_non_exhaustive()
    }
}

fn handle(id: usize) -> ElementHandle {
    ElementHandle::new(id as u64)
}

fn index(element: ElementHandle) -> Result<usize, DomError> {
    usize::try_from(element.id()).map_err(|_| DomError::StaleElement(element.id()))
}

#[async_trait]
impl DomQuery for MemoryDocument {
    async fn query_selector(&self, selector: &str) -> Result<Option<ElementHandle>, DomError> {
        Ok(self.find(selector))
    }

    async fn query_selector_all(&self, selector: &str) -> Result<Vec<ElementHandle>, DomError> {
        Ok(self.find_all(selector))
    }

    async fn is_connected(&self, element: ElementHandle) -> Result<bool, DomError> {
        self.tree.read().is_connected(index(element)?)
    }

    async fn is_content_editable(&self, element: ElementHandle) -> Result<bool, DomError> {
        self.tree.read().is_content_editable(index(element)?)
    }

    async fn has_editable_descendant(&self, element: ElementHandle) -> Result<bool, DomError> {
        self.tree.read().has_editable_descendant(index(element)?)
    }

    async fn inner_text(&self, element: ElementHandle) -> Result<String, DomError> {
        self.tree.read().inner_text(index(element)?)
    }

    async fn value(&self, element: ElementHandle) -> Result<Option<String>, DomError> {
        self.tree.read().value(index(element)?)
    }

    async fn inner_html(&self, element: ElementHandle) -> Result<String, DomError> {
        let tree = self.tree.read();
        let id = index(element)?;
        tree.element(id)?;
        html::serialize_children(&tree, id)
    }

    async fn set_inner_html(&self, element: ElementHandle, html: &str) -> Result<(), DomError> {
        {
            let mut tree = self.tree.write();
            let id = index(element)?;
            tree.clear_children(id)?;
            html::parse_fragment(&mut tree, id, html)?;
        }
        self.emit(DomMutation::ChildList);
        Ok(())
    }

    async fn set_text_content(&self, element: ElementHandle, text: &str) -> Result<(), DomError> {
        {
            let mut tree = self.tree.write();
            let id = index(element)?;
            tree.clear_children(id)?;
            if !text.is_empty() {
                let node = tree.create_text(text);
                tree.append_child(id, node)?;
            }
        }
        self.emit(DomMutation::ChildList);
        Ok(())
    }

    async fn dispatch_event(&self, element: ElementHandle, event_type: &str) -> Result<(), DomError> {
        self.tree.read().element(index(element)?)?;
        debug!(element = element.id(), event = %event_type, "Event dispatched");
        self.events.lock().push(DispatchedEvent {
            target: element,
            event_type: event_type.to_string(),
        });
        Ok(())
    }
}

impl MutationWatcher for MemoryDocument {
    fn subscribe(&self) -> broadcast::Receiver<DomMutation> {
        self.mutations.subscribe()
    }
}

#[async_trait]
impl Notifier for MemoryDocument {
    async fn notify(&self, notification: Notification) {
        info!(kind = notification.kind.as_str(), "{}", notification.message);
        self.notifications.lock().push(notification);
    }
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
