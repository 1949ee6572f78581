//! Error types for the Cordial protocol layer.

mod bridge;
mod dom;
mod rewrite;
mod storage;

pub use bridge::*;
pub use dom::*;
pub use rewrite::*;
pub use storage::*;
