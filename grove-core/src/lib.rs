//! Grove core engine.
//!
//! Reconciles a personal media library against disk: a breadth-first walk
//! keeps per-directory identities stable through on-disk markers, a diff
//! pass classifies every folder as new/changed/unchanged against the
//! persisted snapshot, media-bearing folders are promoted to content units,
//! and video/subtitle files are paired per content into insert/update/delete
//! sets that the commit stage applies through generic store ports.
//!
//! The pipeline is a strictly sequential sweep per invocation; callers are
//! responsible for serializing concurrent runs against the same root.

pub mod commit;
pub mod error;
pub mod fs;
pub mod marker;
pub mod pairing;
pub mod promote;
pub mod settings;
pub mod store;
pub mod sync;
pub mod walk;

pub use commit::{CommitSummary, SyncBatch};
pub use error::{EngineError, Result};
pub use fs::{FileSystem, FsMetadata, InMemoryFs, RealFs};
pub use marker::DEFAULT_MARKER_FILE_NAME;
pub use pairing::{FilePairer, PairingSets};
pub use promote::promote_content;
pub use settings::ScanSettings;
pub use store::{ContentStore, FolderStore, MediaRecordStore, MemoryStore};
pub use sync::{SyncEngine, SyncParams, SyncReport};
pub use walk::{FolderWalker, WalkOutcome};

// Re-export the model crate so downstream callers can use one import path.
pub use grove_model as model;
