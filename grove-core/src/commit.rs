use grove_model::{ContentUnit, FolderNode, MediaRecord};
use tracing::debug;

use crate::error::Result;
use crate::store::{ContentStore, FolderStore, MediaRecordStore};

/// Accumulated candidate sets for one run. Built by the walk, promote, and
/// pairing stages; only the commit stage turns it into store writes.
#[derive(Debug, Default)]
pub struct SyncBatch {
    /// Folders classified `New` or `Changed`; `Unchanged` nodes are never
    /// rewritten.
    pub folder_upserts: Vec<FolderNode>,
    /// Caller-supplied deletion candidates, applied only when the run's
    /// delete flag is set.
    pub folder_deletes: Vec<FolderNode>,
    pub content_inserts: Vec<ContentUnit>,
    /// Simplified content refresh for units whose folder changed this run.
    pub content_updates: Vec<ContentUnit>,
    pub record_inserts: Vec<MediaRecord>,
    pub record_updates: Vec<MediaRecord>,
    pub record_deletes: Vec<MediaRecord>,
}

impl SyncBatch {
    pub fn is_empty(&self) -> bool {
        self.folder_upserts.is_empty()
            && self.folder_deletes.is_empty()
            && self.content_inserts.is_empty()
            && self.content_updates.is_empty()
            && self.record_inserts.is_empty()
            && self.record_updates.is_empty()
            && self.record_deletes.is_empty()
    }
}

/// Counts of applied writes, mirroring the batch that produced them.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CommitSummary {
    pub folders_saved: usize,
    pub folders_deleted: usize,
    pub content_created: usize,
    pub content_updated: usize,
    pub records_inserted: usize,
    pub records_updated: usize,
    pub records_deleted: usize,
}

/// Apply one batch as a single unit: folder upserts, optional folder
/// deletions, content inserts, then record inserts, updates, deletes, and
/// the content refresh pass, in that order. The first failing sub-step
/// aborts the commit and nothing further is applied; each store call is
/// expected to land transactionally in the backend.
pub async fn apply(
    folders: &dyn FolderStore,
    content: &dyn ContentStore,
    records: &dyn MediaRecordStore,
    batch: SyncBatch,
) -> Result<CommitSummary> {
    let summary = CommitSummary {
        folders_saved: batch.folder_upserts.len(),
        folders_deleted: batch.folder_deletes.len(),
        content_created: batch.content_inserts.len(),
        content_updated: batch.content_updates.len(),
        records_inserted: batch.record_inserts.len(),
        records_updated: batch.record_updates.len(),
        records_deleted: batch.record_deletes.len(),
    };

    if !batch.folder_upserts.is_empty() {
        debug!("Committing {} folder upserts", batch.folder_upserts.len());
        folders.save_all(batch.folder_upserts).await?;
    }
    if !batch.folder_deletes.is_empty() {
        debug!("Committing {} folder deletions", batch.folder_deletes.len());
        folders.delete_all(batch.folder_deletes).await?;
    }
    if !batch.content_inserts.is_empty() {
        debug!("Committing {} content inserts", batch.content_inserts.len());
        content.save_all(batch.content_inserts).await?;
    }
    if !batch.record_inserts.is_empty() {
        debug!("Committing {} record inserts", batch.record_inserts.len());
        records.save_all(batch.record_inserts).await?;
    }
    if !batch.record_updates.is_empty() {
        debug!("Committing {} record updates", batch.record_updates.len());
        records.save_all(batch.record_updates).await?;
    }
    if !batch.record_deletes.is_empty() {
        debug!("Committing {} record deletions", batch.record_deletes.len());
        records.delete_all(batch.record_deletes).await?;
    }
    if !batch.content_updates.is_empty() {
        debug!("Committing {} content updates", batch.content_updates.len());
        content.save_all(batch.content_updates).await?;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use chrono::Utc;
    use grove_model::{ContentId, FolderId, MediaKind};
    use std::path::PathBuf;

    fn folder(id: i64) -> FolderNode {
        FolderNode {
            id: FolderId::new(id),
            name: format!("folder{id}"),
            path: PathBuf::from(format!("/lib/folder{id}")),
            parent_id: None,
            access_tier: "public".into(),
            created_at: Utc::now(),
            modified_at: Utc::now(),
            has_media: true,
        }
    }

    fn unit(id: i64) -> ContentUnit {
        ContentUnit {
            id: ContentId::new(id),
            title: format!("content{id}"),
            kind: MediaKind::Movie,
            folder_id: FolderId::new(id),
            release_period: "2026Q3".into(),
            modified_at: Utc::now(),
        }
    }

    /// Content store that rejects every write.
    struct RefusingContentStore;

    #[async_trait]
    impl ContentStore for RefusingContentStore {
        async fn list_all(&self) -> Result<Vec<ContentUnit>> {
            Ok(Vec::new())
        }

        async fn save_all(&self, _units: Vec<ContentUnit>) -> Result<Vec<ContentUnit>> {
            Err(EngineError::Store("save refused".into()))
        }

        async fn delete_all(&self, _units: Vec<ContentUnit>) -> Result<()> {
            Err(EngineError::Store("delete refused".into()))
        }
    }

    #[tokio::test]
    async fn empty_batch_touches_nothing() {
        let folders = MemoryStore::<FolderNode>::new();
        let content = MemoryStore::<ContentUnit>::new();
        let records = MemoryStore::<MediaRecord>::new();

        let summary = apply(&folders, &content, &records, SyncBatch::default())
            .await
            .unwrap();

        assert_eq!(summary, CommitSummary::default());
        assert!(folders.is_empty().await);
    }

    #[tokio::test]
    async fn failing_substep_aborts_remaining_writes() {
        let folders = MemoryStore::<FolderNode>::new();
        let records = MemoryStore::<MediaRecord>::new();

        let batch = SyncBatch {
            folder_upserts: vec![folder(1)],
            content_inserts: vec![unit(1)],
            record_inserts: vec![MediaRecord {
                id: grove_model::MediaRecordId::new(1),
                content_id: ContentId::new(1),
                base_name: "ep1".into(),
                video_path: "ep1.mkv".into(),
                subtitle_path: None,
                subtitle_added_at: None,
            }],
            ..Default::default()
        };

        let err = apply(&folders, &RefusingContentStore, &records, batch)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Store(_)));
        // Record writes come after the failed content insert and were
        // never attempted.
        assert!(records.is_empty().await);
    }

    #[tokio::test]
    async fn applies_all_sets() {
        let folders = MemoryStore::<FolderNode>::new();
        let content = MemoryStore::<ContentUnit>::new();
        let records = MemoryStore::<MediaRecord>::new();

        folders.save_all(vec![folder(9)]).await.unwrap();

        let batch = SyncBatch {
            folder_upserts: vec![folder(1)],
            folder_deletes: vec![folder(9)],
            content_inserts: vec![unit(1)],
            ..Default::default()
        };

        let summary = apply(&folders, &content, &records, batch).await.unwrap();
        assert_eq!(summary.folders_saved, 1);
        assert_eq!(summary.folders_deleted, 1);
        assert_eq!(summary.content_created, 1);
        assert!(folders.get(9).await.is_none());
        assert!(content.get(1).await.is_some());
    }
}
