//! In-memory document for Cordial.
//!
//! A small element tree that implements the page protocols
//! ([`DomQuery`](cordial_protocols::DomQuery),
//! [`MutationWatcher`](cordial_protocols::MutationWatcher) and
//! [`Notifier`](cordial_protocols::Notifier)). It backs the test suites and
//! the offline snapshot mode of the CLI.
//!
//! ## Supported selectors
//!
//! - type (`div`) and universal (`*`) selectors
//! - `#id` and `.class`
//! - attribute selectors: `[attr]`, `[attr=v]`, `[attr*=v]`, `[attr^=v]`,
//!   `[attr$=v]`, `[attr~=v]`, `[attr|=v]`
//! - descendant (` `) and child (`>`) combinators
//! - selector lists (`a, b`)
//!
//! Anything else (pseudo-classes, sibling combinators) fails to parse and
//! therefore matches nothing.

mod document;
mod html;
mod selector;
mod tree;

pub use document::{DispatchedEvent, MemoryDocument};
pub use selector::{SelectorError, SelectorList};
