use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use grove_model::{ChangeState, FolderId, FolderNode};
use tracing::{debug, warn};

use crate::error::{EngineError, Result};
use crate::fs::FileSystem;
use crate::marker::{read_marker, write_marker};
use crate::settings::ScanSettings;

/// Owned result of one walk: the folder arena plus the per-run change
/// classification. Passed by value between pipeline stages; no stage
/// mutates shared state.
#[derive(Debug, Default)]
pub struct WalkOutcome {
    /// Every folder encountered this run, keyed by stable identity.
    pub nodes: BTreeMap<FolderId, FolderNode>,
    /// Transient classification per folder; never persisted.
    pub states: HashMap<FolderId, ChangeState>,
}

impl WalkOutcome {
    pub fn node(&self, id: FolderId) -> Option<&FolderNode> {
        self.nodes.get(&id)
    }

    pub fn state(&self, id: FolderId) -> Option<ChangeState> {
        self.states.get(&id).copied()
    }

    /// Nodes that need rewriting: `New` or `Changed`. `Unchanged` folders
    /// are never rewritten.
    pub fn dirty_nodes(&self) -> Vec<FolderNode> {
        self.nodes
            .values()
            .filter(|node| {
                matches!(
                    self.states.get(&node.id),
                    Some(ChangeState::New | ChangeState::Changed)
                )
            })
            .cloned()
            .collect()
    }

    pub fn count(&self, state: ChangeState) -> usize {
        self.states.values().filter(|s| **s == state).count()
    }

    /// Whether `id` equals `ancestor` or lies beneath it in the parent
    /// chain. Cycle-guarded.
    pub fn is_within(&self, id: FolderId, ancestor: FolderId) -> bool {
        let mut seen = HashSet::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            if !seen.insert(current) {
                return false;
            }
            cursor = self.nodes.get(&current).and_then(|node| node.parent_id);
        }
        false
    }
}

struct DirListing {
    subdirs: Vec<PathBuf>,
    has_media: bool,
    modified: Option<SystemTime>,
}

/// Breadth-first directory walker and folder reconciler.
///
/// Parents are always visited before their children, and children are
/// enqueued in name order, so identity assignment is deterministic for a
/// given tree. Identity allocation is not gap-filling: the next id is
/// always one past the highest ever seen.
pub struct FolderWalker {
    fs: Arc<dyn FileSystem>,
    settings: ScanSettings,
}

impl FolderWalker {
    pub fn new(fs: Arc<dyn FileSystem>, settings: ScanSettings) -> Self {
        Self { fs, settings }
    }

    /// Traverse `root`, reconciling every directory against `snapshot`.
    ///
    /// Marker handling per directory:
    /// - marker present, id known: update path; recompute `path`,
    ///   `parent_id`, `has_media`, `modified_at`, classify
    ///   `Changed`/`Unchanged`;
    /// - marker present, id unknown: adopt the id as-is and classify `New`
    ///   (the marker is not rewritten, so a run that crashed before commit
    ///   costs nothing on the retry);
    /// - marker absent: allocate the next id, write a fresh marker,
    ///   classify `New`.
    pub async fn walk(
        &self,
        root: &Path,
        snapshot: &BTreeMap<FolderId, FolderNode>,
        now: DateTime<Utc>,
    ) -> Result<WalkOutcome> {
        match self.fs.metadata(root).await {
            Ok(md) if md.is_dir => {}
            _ => return Err(EngineError::InvalidRoot(root.to_path_buf())),
        }

        let mut next_id = snapshot
            .keys()
            .next_back()
            .map(|id| id.next())
            .unwrap_or(FolderId::new(1));

        let mut outcome = WalkOutcome::default();
        let mut queue: VecDeque<(PathBuf, Option<FolderId>)> = VecDeque::new();
        queue.push_back((root.to_path_buf(), None));

        while let Some((dir, parent_id)) = queue.pop_front() {
            let listing = match self.list_directory(&dir).await {
                Ok(listing) => listing,
                Err(err) => {
                    warn!("Skipping unreadable subtree {}: {}", dir.display(), err);
                    continue;
                }
            };

            let mut dir_modified = listing.modified;
            let id = match read_marker(self.fs.as_ref(), &dir, &self.settings.marker_file_name)
                .await?
            {
                Some(id) if snapshot.contains_key(&id) => id,
                Some(id) => {
                    // Marker exists but the snapshot never saw the id: a
                    // prior run wrote the marker and failed before commit.
                    // Adopt the id unchanged rather than burning a new one.
                    debug!("Adopting unknown marker id {} at {}", id, dir.display());
                    if id >= next_id {
                        next_id = id.next();
                    }
                    id
                }
                None => {
                    let id = next_id;
                    next_id = next_id.next();
                    write_marker(self.fs.as_ref(), &dir, &self.settings.marker_file_name, id)
                        .await?;
                    // The marker write itself bumps the directory mtime;
                    // store the post-write time so the next run compares
                    // against what it will actually read.
                    if let Ok(md) = self.fs.metadata(&dir).await {
                        dir_modified = md.modified.or(dir_modified);
                    }
                    id
                }
            };

            let name = dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| dir.display().to_string());
            let modified_at = dir_modified.and_then(system_time_to_utc).unwrap_or(now);

            let (node, state) = match snapshot.get(&id) {
                Some(stored) => {
                    let changed = stored.path != dir
                        || stored.parent_id != parent_id
                        || stored.has_media != listing.has_media
                        || stored.mtime_drifted(modified_at);
                    let mut node = stored.clone();
                    node.name = name;
                    node.path = dir.clone();
                    node.parent_id = parent_id;
                    node.has_media = listing.has_media;
                    node.modified_at = modified_at;
                    let state = if changed {
                        ChangeState::Changed
                    } else {
                        ChangeState::Unchanged
                    };
                    (node, state)
                }
                None => {
                    let node = FolderNode {
                        id,
                        name,
                        path: dir.clone(),
                        parent_id,
                        access_tier: self.settings.access_tier.clone(),
                        created_at: now,
                        modified_at,
                        has_media: listing.has_media,
                    };
                    (node, ChangeState::New)
                }
            };

            if outcome.nodes.contains_key(&id) {
                // Two directories carrying the same marker (a copied
                // folder). Last one wins, matching snapshot-map semantics.
                warn!(
                    "Duplicate marker id {} at {}; replacing earlier entry",
                    id,
                    dir.display()
                );
            }
            outcome.nodes.insert(id, node);
            outcome.states.insert(id, state);

            let mut subdirs = listing.subdirs;
            subdirs.sort();
            for subdir in subdirs {
                queue.push_back((subdir, Some(id)));
            }
        }

        Ok(outcome)
    }

    /// List one directory: immediate subdirectories, whether it directly
    /// holds a recognized video file (the marker file itself is ignored),
    /// and its mtime. The listing handle is consumed and released before
    /// returning.
    async fn list_directory(&self, dir: &Path) -> std::io::Result<DirListing> {
        let md = self.fs.metadata(dir).await?;

        let mut entries = self.fs.read_dir(dir).await?;
        let mut subdirs = Vec::new();
        let mut has_media = false;

        while let Some(path) = entries.next_entry().await? {
            let entry_md = match self.fs.metadata(&path).await {
                Ok(md) => md,
                Err(err) => {
                    warn!("Skipping unreadable entry {}: {}", path.display(), err);
                    continue;
                }
            };

            if entry_md.is_dir {
                subdirs.push(path);
            } else if entry_md.is_file {
                let is_marker = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n == self.settings.marker_file_name);
                if !is_marker && self.settings.is_video(&path) {
                    has_media = true;
                }
            }
        }

        Ok(DirListing {
            subdirs,
            has_media,
            modified: md.modified,
        })
    }
}

fn system_time_to_utc(time: SystemTime) -> Option<DateTime<Utc>> {
    let duration = time.duration_since(std::time::UNIX_EPOCH).ok()?;
    DateTime::<Utc>::from_timestamp(duration.as_secs() as i64, duration.subsec_nanos())
}
