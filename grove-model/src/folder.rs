use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::ids::FolderId;

/// One persisted record per scanned directory.
///
/// Identity is carried by `id`, which also lives inside the directory's
/// on-disk marker file. A folder keeps its id across renames and moves;
/// `path` and `parent_id` are recomputed on every run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FolderNode {
    pub id: FolderId,
    pub name: String,
    /// Absolute, canonical directory path as of the latest run.
    pub path: PathBuf,
    /// Identity of the parent directory, `None` when the parent lies
    /// outside the scanned root.
    pub parent_id: Option<FolderId>,
    /// Visibility code consumed by outer layers; the engine only carries it.
    pub access_tier: String,
    pub created_at: DateTime<Utc>,
    /// Mirrors the directory mtime, compared at minute resolution.
    pub modified_at: DateTime<Utc>,
    /// Whether the directory directly contains a recognized video file.
    pub has_media: bool,
}

impl FolderNode {
    /// Directory mtimes are only trusted to the minute; sub-minute drift is
    /// noise on several filesystems and must not flip a folder to `Changed`.
    pub fn mtime_drifted(&self, fresh: DateTime<Utc>) -> bool {
        let stored = self.modified_at.timestamp() / 60;
        let scanned = fresh.timestamp() / 60;
        stored != scanned
    }
}

/// Transient per-run classification of a scanned folder against its stored
/// record. Recomputed every run, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeState {
    New,
    Changed,
    Unchanged,
}

impl std::fmt::Display for ChangeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeState::New => write!(f, "New"),
            ChangeState::Changed => write!(f, "Changed"),
            ChangeState::Unchanged => write!(f, "Unchanged"),
        }
    }
}
