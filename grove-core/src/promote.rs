use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use grove_model::{ContentId, ContentUnit, FolderId, FolderNode, MediaKind};
use tracing::debug;

/// Select folders eligible to become content units and build the missing
/// records.
///
/// A folder is promotion-eligible when it directly holds media and no
/// ancestor along its parent chain does: a show whose season folders all
/// contain episodes promotes once at the highest media-bearing level, never
/// per season. Folders already mapped to a content unit are skipped, so
/// re-running promotion is a no-op. Nothing is ever deleted or re-titled
/// here.
pub fn promote_content(
    folders: &BTreeMap<FolderId, FolderNode>,
    existing: &[ContentUnit],
    kind: MediaKind,
    now: DateTime<Utc>,
) -> Vec<ContentUnit> {
    let promoted: HashSet<FolderId> = existing.iter().map(|c| c.folder_id).collect();
    let mut next_id = existing
        .iter()
        .map(|c| c.id)
        .max()
        .map(|id| id.next())
        .unwrap_or(ContentId::new(1));

    let mut created = Vec::new();
    for node in folders.values() {
        if !node.has_media || promoted.contains(&node.id) {
            continue;
        }
        if has_media_ancestor(folders, node) {
            continue;
        }

        debug!("Promoting folder {} ({})", node.id, node.name);
        created.push(ContentUnit {
            id: next_id,
            title: node.name.clone(),
            kind,
            folder_id: node.id,
            release_period: ContentUnit::release_period_for(now),
            modified_at: node.modified_at,
        });
        next_id = next_id.next();
    }

    created
}

/// Walk the parent chain looking for another media-bearing folder.
/// Cycle-guarded: a corrupted parent linkage terminates the walk instead of
/// spinning.
fn has_media_ancestor(folders: &BTreeMap<FolderId, FolderNode>, node: &FolderNode) -> bool {
    let mut seen = HashSet::new();
    seen.insert(node.id);

    let mut cursor = node.parent_id;
    while let Some(id) = cursor {
        if !seen.insert(id) {
            return false;
        }
        match folders.get(&id) {
            Some(ancestor) if ancestor.has_media => return true,
            Some(ancestor) => cursor = ancestor.parent_id,
            None => return false,
        }
    }
    false
}
