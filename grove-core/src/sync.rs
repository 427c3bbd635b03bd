use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use grove_model::{
    ChangeState, ContentId, FolderId, FolderNode, MediaKind, MediaRecord, MediaRecordId,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::commit::{self, CommitSummary, SyncBatch};
use crate::error::Result;
use crate::fs::{FileSystem, RealFs};
use crate::pairing::FilePairer;
use crate::promote::promote_content;
use crate::settings::ScanSettings;
use crate::store::{ContentStore, FolderStore, MediaRecordStore};
use crate::walk::FolderWalker;

/// Parameters of one sync run, supplied by the external caller. The store
/// handles passed to [`SyncEngine`] must already be scoped to the partition
/// `kind` selects.
#[derive(Debug, Clone)]
pub struct SyncParams {
    pub kind: MediaKind,
    /// Absolute directory to scan.
    pub root_path: PathBuf,
    /// Gate for the optional folder deletion sub-step.
    pub delete_enabled: bool,
    /// Precomputed deletion candidates; the engine does not derive
    /// "vanished from disk" itself within a single walk.
    pub delete_candidates: Vec<FolderId>,
    /// Restrict the file-pairing stage to this folder's subtree.
    pub scope_folder_id: Option<FolderId>,
}

impl SyncParams {
    pub fn new(kind: MediaKind, root_path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            root_path: root_path.into(),
            delete_enabled: false,
            delete_candidates: Vec::new(),
            scope_folder_id: None,
        }
    }
}

/// Outcome of one run: per-stage counts plus the applied commit summary.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub folders_new: usize,
    pub folders_changed: usize,
    pub folders_unchanged: usize,
    pub commit: CommitSummary,
    pub elapsed: Duration,
}

/// The reconciliation pipeline: load snapshots, walk, promote, pair,
/// commit. A strictly sequential sweep with no overlapping storage
/// operations. Two concurrent runs against the same root are unsafe; the
/// caller serializes invocations.
pub struct SyncEngine {
    fs: Arc<dyn FileSystem>,
    folders: Arc<dyn FolderStore>,
    content: Arc<dyn ContentStore>,
    records: Arc<dyn MediaRecordStore>,
    settings: ScanSettings,
}

impl SyncEngine {
    pub fn new(
        folders: Arc<dyn FolderStore>,
        content: Arc<dyn ContentStore>,
        records: Arc<dyn MediaRecordStore>,
        settings: ScanSettings,
    ) -> Self {
        Self::with_fs(Arc::new(RealFs::new()), folders, content, records, settings)
    }

    /// Create an engine with a custom filesystem (useful for tests).
    pub fn with_fs(
        fs: Arc<dyn FileSystem>,
        folders: Arc<dyn FolderStore>,
        content: Arc<dyn ContentStore>,
        records: Arc<dyn MediaRecordStore>,
        settings: ScanSettings,
    ) -> Self {
        Self {
            fs,
            folders,
            content,
            records,
            settings,
        }
    }

    pub async fn run(&self, params: SyncParams) -> Result<SyncReport> {
        let run_id = Uuid::now_v7();
        let started = Instant::now();
        let now = Utc::now();

        info!(
            "Starting {} sync {} for {}",
            params.kind,
            run_id,
            params.root_path.display()
        );

        // Snapshots are loaded wholesale at the start of the run.
        let snapshot: BTreeMap<FolderId, FolderNode> = self
            .folders
            .list_all()
            .await?
            .into_iter()
            .map(|node| (node.id, node))
            .collect();
        let existing_content = self.content.list_all().await?;
        let existing_records = self.records.list_all().await?;

        let walker = FolderWalker::new(Arc::clone(&self.fs), self.settings.clone());
        let outcome = walker.walk(&params.root_path, &snapshot, now).await?;

        let promoted = promote_content(&outcome.nodes, &existing_content, params.kind, now);

        let mut batch = SyncBatch {
            folder_upserts: outcome.dirty_nodes(),
            content_inserts: promoted.clone(),
            ..Default::default()
        };

        // Pairing runs over existing and freshly promoted content alike, so
        // a folder promoted this run gets its file records in the same
        // commit.
        let pairer = FilePairer::new(Arc::clone(&self.fs), self.settings.clone());
        let mut rows_by_content: HashMap<ContentId, Vec<MediaRecord>> = HashMap::new();
        for record in existing_records.iter() {
            rows_by_content
                .entry(record.content_id)
                .or_default()
                .push(record.clone());
        }
        let mut next_record_id = existing_records
            .iter()
            .map(|r| r.id)
            .max()
            .map(|id| id.next())
            .unwrap_or(MediaRecordId::new(1));

        for unit in existing_content.iter().chain(promoted.iter()) {
            let Some(node) = outcome.node(unit.folder_id) else {
                debug!(
                    "Content {} folder {} not under this root; skipping pairing",
                    unit.id, unit.folder_id
                );
                continue;
            };
            if let Some(scope) = params.scope_folder_id
                && !outcome.is_within(unit.folder_id, scope)
            {
                continue;
            }

            let rows = rows_by_content.remove(&unit.id).unwrap_or_default();
            if let Some(sets) = pairer
                .reconcile(unit, &node.path, &rows, &mut next_record_id, now)
                .await?
            {
                batch.record_inserts.extend(sets.inserts);
                batch.record_updates.extend(sets.updates);
                batch.record_deletes.extend(sets.deletes);
            }
        }

        // Simplified content refresh: units whose folder changed this run
        // pick up the folder's new mtime.
        for unit in existing_content.iter() {
            if outcome.state(unit.folder_id) == Some(ChangeState::Changed)
                && let Some(node) = outcome.node(unit.folder_id)
                && node.modified_at != unit.modified_at
            {
                let mut updated = unit.clone();
                updated.modified_at = node.modified_at;
                batch.content_updates.push(updated);
            }
        }

        if params.delete_enabled {
            batch.folder_deletes = params
                .delete_candidates
                .iter()
                .filter_map(|id| snapshot.get(id).cloned())
                .collect();
        } else if !params.delete_candidates.is_empty() {
            debug!(
                "Deletion disabled; ignoring {} candidates",
                params.delete_candidates.len()
            );
        }

        let commit = commit::apply(
            self.folders.as_ref(),
            self.content.as_ref(),
            self.records.as_ref(),
            batch,
        )
        .await?;

        let report = SyncReport {
            run_id,
            folders_new: outcome.count(ChangeState::New),
            folders_changed: outcome.count(ChangeState::Changed),
            folders_unchanged: outcome.count(ChangeState::Unchanged),
            commit,
            elapsed: started.elapsed(),
        };

        info!(
            "Sync {} finished in {:?}: folders {}/{}/{} (new/changed/unchanged), {} content created, records +{} ~{} -{}",
            run_id,
            report.elapsed,
            report.folders_new,
            report.folders_changed,
            report.folders_unchanged,
            report.commit.content_created,
            report.commit.records_inserted,
            report.commit.records_updated,
            report.commit.records_deleted,
        );

        Ok(report)
    }
}
