//! Key/value storage backends for Cordial.
//!
//! - [`MemoryStore`]: process-local map, used in tests
//! - [`JsonFileStore`]: a single JSON object on disk, the CLI default

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
