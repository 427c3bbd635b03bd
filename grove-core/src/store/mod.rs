//! Persistence boundary of the engine.
//!
//! The engine only ever talks to the generic repository ports in this
//! module; schema and columns are an external concern. The caller hands the
//! engine store handles already scoped to one `MediaKind` partition.

pub mod memory;
pub mod ports;

pub use memory::{Keyed, MemoryStore};
pub use ports::{ContentStore, FolderStore, MediaRecordStore};
