//! # Cordial CDP
//!
//! Page bridge for live browser tabs, driven through the Chrome DevTools
//! Protocol.
//!
//! ## Usage
//!
//! 1. Start Chrome with remote debugging:
//!    ```bash
//!    chrome --remote-debugging-port=9222
//!    ```
//!
//! 2. Attach to the active tab:
//!    ```rust,ignore
//!    let tabs = CdpTabBridge::new("http://localhost:9222");
//!    let tab = tabs.active_tab().await?.unwrap();
//!    let page = tabs.attach(&tab).await?;
//!    ```
//!
//! Attaching injects a small script into the tab. It resolves selectors
//! and edits the compose editor on request, reports document mutations,
//! shows toast notifications and installs the floating rewrite button and
//! the Ctrl+Shift+R shortcut.

mod auth_feed;
mod bridge;
mod bridge_script;
mod client;
mod error;
mod page;
mod protocol;
mod session;
mod triggers;

pub use auth_feed::AuthFeed;
pub use bridge::CdpTabBridge;
pub use client::CdpClient;
pub use error::CdpError;
pub use page::CdpPage;
pub use protocol::*;
pub use session::PageSession;
pub use triggers::{PageTrigger, TriggerSource};
