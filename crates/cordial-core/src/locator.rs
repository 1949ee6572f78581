//! Locating the compose editor.

use std::sync::Arc;
use std::time::Duration;

use cordial_protocols::{DomQuery, ElementHandle, MutationWatcher, RewriteError};
use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::selectors::{SelectorRegistry, SelectorRole};

/// Default freshness window of a located editor.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(2);

/// A located editor and when it was found.
#[derive(Debug, Clone, Copy)]
struct CachedEditor {
    handle: ElementHandle,
    located_at: Instant,
}

/// Finds the compose editor in a document.
///
/// A found editor is remembered for a short window and handed out again
/// only while it is still attached to the document.
pub struct EditorLocator {
    dom: Arc<dyn DomQuery>,
    watcher: Arc<dyn MutationWatcher>,
    selectors: Arc<SelectorRegistry>,
    cache_ttl: Duration,
    cache: Mutex<Option<CachedEditor>>,
}

impl EditorLocator {
    pub fn new(
        dom: Arc<dyn DomQuery>,
        watcher: Arc<dyn MutationWatcher>,
        selectors: Arc<SelectorRegistry>,
    ) -> Self {
        Self {
            dom,
            watcher,
            selectors,
            cache_ttl: DEFAULT_CACHE_TTL,
            cache: Mutex::new(None),
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// The first editable element found by the editor selectors.
    ///
    /// Each selector contributes only its first match, and that match
    /// counts only if it is itself editable; otherwise the next selector
    /// is tried.
    pub async fn locate_editor(&self) -> Option<ElementHandle> {
        if let Some(handle) = self.cached().await {
            return Some(handle);
        }

        for selector in self.selectors.selectors(SelectorRole::Editor) {
            let candidate = match self.dom.query_selector(selector).await {
                Ok(Some(candidate)) => candidate,
                Ok(None) => continue,
                Err(e) => {
                    warn!(selector = %selector, "Editor query failed: {}", e);
                    continue;
                }
            };

            match self.dom.is_content_editable(candidate).await {
                Ok(true) => {
                    debug!(selector = %selector, element = candidate.id(), "Editor located");
                    *self.cache.lock() = Some(CachedEditor {
                        handle: candidate,
                        located_at: Instant::now(),
                    });
                    return Some(candidate);
                }
                Ok(false) => {
                    debug!(selector = %selector, "Match is not editable, trying next selector");
                }
                Err(e) => warn!(selector = %selector, "Editable check failed: {}", e),
            }
        }

        self.invalidate();
        None
    }

    /// Wait until an editor can be located, re-checking on every document
    /// mutation.
    pub async fn wait_for_editor(&self, timeout: Duration) -> Result<ElementHandle, RewriteError> {
        let deadline = Instant::now() + timeout;
        // Subscribe before the first check so no mutation slips between them.
        let mut mutations = self.watcher.subscribe();

        loop {
            if let Some(handle) = self.locate_editor().await {
                return Ok(handle);
            }

            tokio::select! {
                received = mutations.recv() => match received {
                    Ok(_) | Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => {
                        debug!("Mutation stream closed while waiting for editor");
                        return Err(RewriteError::EditorNotFound);
                    }
                },
                _ = tokio::time::sleep_until(deadline) => {
                    debug!("Timed out waiting for editor after {:?}", timeout);
                    return Err(RewriteError::EditorNotFound);
                }
            }
        }
    }

    /// Forget the cached editor.
    pub fn invalidate(&self) {
        self.cache.lock().take();
    }

    /// The cached editor if it is fresh and still attached.
    async fn cached(&self) -> Option<ElementHandle> {
        let entry = (*self.cache.lock())?;
        if entry.located_at.elapsed() >= self.cache_ttl {
            self.invalidate();
            return None;
        }
        match self.dom.is_connected(entry.handle).await {
            Ok(true) => {
                debug!(element = entry.handle.id(), "Editor cache hit");
                Some(entry.handle)
            }
            Ok(false) => {
                debug!(element = entry.handle.id(), "Cached editor detached");
                self.invalidate();
                None
            }
            Err(e) => {
                warn!("Liveness check failed: {}", e);
                self.invalidate();
                None
            }
        }
    }
}

impl std::fmt::Debug for EditorLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorLocator")
            .field("cache_ttl", &self.cache_ttl)
            .field("cached", &self.cache.lock().map(|c| c.handle))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "locator_tests.rs"]
mod tests;
