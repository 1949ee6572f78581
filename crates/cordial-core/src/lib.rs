//! # Cordial Core
//!
//! Rewrite logic for a webmail compose window, written against the page
//! protocols of `cordial-protocols` so it runs unchanged on an in-memory
//! document or a live browser tab.
//!
//! ## Components
//!
//! - [`SelectorRegistry`] - Ordered selector lists per page role
//! - [`EditorLocator`] - Finds the compose editor, with a short-lived cache
//! - [`ContextExtractor`] - Reply detection, thread context and prompts
//! - [`RewriteOrchestrator`] - One rewrite from preconditions to write-back
//! - [`SessionStore`] - The persisted user session
//! - [`CreditLedger`] - Balance refresh, daily claim and purchases
//! - [`LoginFlow`] - Waiting for the sign-in page to report back
//! - [`PopupController`] - The popup panel's actions and view state

pub mod auth;
pub mod context;
pub mod credits;
pub mod locator;
pub mod notify;
pub mod orchestrator;
pub mod popup;
pub mod sanitize;
pub mod selectors;
pub mod session;

pub use auth::{
    AUTH_SUCCESS_KEY, AuthMessage, AuthSender, LoginError, LoginFlow, LoginOutcome, auth_channel,
    is_fresh_sign_in, publish_auth_success,
};
pub use context::ContextExtractor;
pub use credits::{ClaimButton, CreditError, CreditGrant, CreditLedger, CreditSource, CreditsView};
pub use locator::EditorLocator;
pub use notify::TracingNotifier;
pub use orchestrator::{OrchestratorOptions, RewriteOrchestrator};
pub use popup::{
    CheckoutStatus, PopupController, PopupView, StatusKind, StatusLine, is_on_host,
};
pub use selectors::{SelectorRegistry, SelectorRole};
pub use session::{SessionStore, claim_available};
