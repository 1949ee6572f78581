//! Shared types used across the Cordial workspace.

mod rewrite;
mod session;
mod tone;

pub use rewrite::*;
pub use session::*;
pub use tone::*;

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
