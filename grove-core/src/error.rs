use std::path::PathBuf;

use thiserror::Error;

/// Engine error taxonomy.
///
/// Identity marker failures and corrupt marker content are fatal to a run;
/// transient per-unit I/O (an unreadable subtree, a vanished content
/// directory) is handled recoverably at the call site and never surfaces
/// here.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("identity marker I/O failed for {path:?}: {source}")]
    Marker {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("identity marker {path:?} is corrupt: {detail}")]
    CorruptMarker { path: PathBuf, detail: String },

    #[error("scan root {0:?} does not exist or is not a directory")]
    InvalidRoot(PathBuf),

    #[error("store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
