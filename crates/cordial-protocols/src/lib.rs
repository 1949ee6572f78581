//! # Cordial Protocols
//!
//! Core protocol definitions (traits) and shared types for Cordial.
//! Contains only interface definitions - no implementations.
//!
//! ## Core Traits
//!
//! - [`DomQuery`] - Read and write access to the page document
//! - [`MutationWatcher`] - Event-driven notification of document changes
//! - [`Notifier`] - Transient user-facing notifications
//! - [`KeyValueStore`] - Extension-local persistent storage
//! - [`TabBridge`] - Reaching the active browser tab from the popup side

pub mod dom;
pub mod error;
pub mod notify;
pub mod storage;
pub mod tab;
pub mod types;

pub use dom::{DomMutation, DomQuery, ElementHandle, MutationWatcher};
pub use error::{BridgeError, DomError, RewriteError, StorageError};
pub use notify::{Notification, NotificationKind, Notifier};
pub use storage::KeyValueStore;
pub use tab::{AttachedPage, TabBridge, TabInfo};
pub use types::*;
