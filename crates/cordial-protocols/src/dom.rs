//! Document access protocol.
//!
//! The page document is reached only through these traits so the rewrite
//! logic can run against an in-memory document as well as a live tab.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::DomError;

/// Opaque reference to an element of a document.
///
/// A handle never keeps its element alive. The host page can recreate
/// elements at any time, so holders must re-check
/// [`DomQuery::is_connected`] before relying on one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(u64);

impl ElementHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Query and mutation access to a document.
///
/// Malformed selectors must match nothing rather than fail; `DomError` is
/// reserved for failures of the underlying transport.
#[async_trait]
pub trait DomQuery: Send + Sync {
    /// First element matching `selector`, in document order.
    async fn query_selector(&self, selector: &str) -> Result<Option<ElementHandle>, DomError>;

    /// All elements matching `selector`, in document order.
    async fn query_selector_all(&self, selector: &str) -> Result<Vec<ElementHandle>, DomError>;

    /// Whether the element is still attached to the document.
    async fn is_connected(&self, element: ElementHandle) -> Result<bool, DomError>;

    /// Whether the element itself is editable (`isContentEditable`).
    async fn is_content_editable(&self, element: ElementHandle) -> Result<bool, DomError>;

    /// Whether any descendant carries `contenteditable="true"`.
    async fn has_editable_descendant(&self, element: ElementHandle) -> Result<bool, DomError>;

    /// Rendered text of the element and its descendants.
    async fn inner_text(&self, element: ElementHandle) -> Result<String, DomError>;

    /// Form value for input-like elements.
    async fn value(&self, element: ElementHandle) -> Result<Option<String>, DomError>;

    /// Serialized markup of the element's children.
    async fn inner_html(&self, element: ElementHandle) -> Result<String, DomError>;

    /// Replace the element's children with parsed `html`.
    async fn set_inner_html(&self, element: ElementHandle, html: &str) -> Result<(), DomError>;

    /// Replace the element's children with a single text node.
    async fn set_text_content(&self, element: ElementHandle, text: &str) -> Result<(), DomError>;

    /// Dispatch a bubbling synthetic event of the given type.
    async fn dispatch_event(&self, element: ElementHandle, event_type: &str) -> Result<(), DomError>;
}

/// Kind of change observed in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomMutation {
    ChildList,
    Attributes,
    CharacterData,
}

/// Event-driven watch over document mutations.
pub trait MutationWatcher: Send + Sync {
    /// Subscribe to subsequent mutations of the whole document subtree.
    fn subscribe(&self) -> broadcast::Receiver<DomMutation>;
}
