use grove_core::store::{ContentStore, FolderStore, MediaRecordStore, MemoryStore};
use grove_core::{ScanSettings, SyncEngine, SyncParams};
use grove_model::{ContentUnit, FolderNode, MediaKind, MediaRecord};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

struct Harness {
    _temp: TempDir,
    root: PathBuf,
    folders: Arc<MemoryStore<FolderNode>>,
    content: Arc<MemoryStore<ContentUnit>>,
    records: Arc<MemoryStore<MediaRecord>>,
    engine: SyncEngine,
}

impl Harness {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("library");
        fs::create_dir_all(&root).unwrap();

        let folders = Arc::new(MemoryStore::<FolderNode>::new());
        let content = Arc::new(MemoryStore::<ContentUnit>::new());
        let records = Arc::new(MemoryStore::<MediaRecord>::new());

        let engine = SyncEngine::new(
            folders.clone(),
            content.clone(),
            records.clone(),
            ScanSettings::default(),
        );

        Self {
            _temp: temp,
            root,
            folders,
            content,
            records,
            engine,
        }
    }

    fn params(&self) -> SyncParams {
        SyncParams::new(MediaKind::Drama, &self.root)
    }

    async fn run(&self) -> grove_core::SyncReport {
        self.engine.run(self.params()).await.unwrap()
    }
}

fn write_show(root: &std::path::Path, show: &str, files: &[&str]) -> PathBuf {
    let dir = root.join(show);
    fs::create_dir_all(&dir).unwrap();
    for file in files {
        fs::write(dir.join(file), b"fake media content").unwrap();
    }
    dir
}

#[tokio::test]
async fn scenario_fresh_library_promotes_and_pairs() {
    let harness = Harness::new();
    write_show(&harness.root, "showA", &["ep1.mkv", "ep1.srt"]);

    let report = harness.run().await;

    // Root and showA, both newly discovered.
    assert_eq!(report.folders_new, 2);
    assert_eq!(report.folders_changed, 0);
    assert_eq!(harness.folders.len().await, 2);

    // showA holds media and its ancestor does not: exactly one content unit.
    let units = harness.content.list_all().await.unwrap();
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].title, "showA");
    assert_eq!(units[0].kind, MediaKind::Drama);

    let rows = harness.records.list_all().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].base_name, "ep1");
    assert_eq!(rows[0].video_path, "ep1.mkv");
    assert_eq!(rows[0].subtitle_path.as_deref(), Some("ep1.srt"));
    assert!(rows[0].subtitle_added_at.is_some());

    // Identity markers landed on disk.
    assert!(harness.root.join(".grove-id").exists());
    assert!(harness.root.join("showA/.grove-id").exists());
}

#[tokio::test]
async fn scenario_rerun_without_changes_writes_nothing() {
    let harness = Harness::new();
    write_show(&harness.root, "showA", &["ep1.mkv", "ep1.srt"]);

    harness.run().await;
    let report = harness.run().await;

    assert_eq!(report.folders_new, 0);
    assert_eq!(report.folders_changed, 0);
    assert_eq!(report.folders_unchanged, 2);

    let commit = report.commit;
    assert_eq!(commit.folders_saved, 0);
    assert_eq!(commit.content_created, 0);
    assert_eq!(commit.records_inserted, 0);
    assert_eq!(commit.records_updated, 0);
    assert_eq!(commit.records_deleted, 0);
}

#[tokio::test]
async fn scenario_vanished_video_deletes_record_despite_subtitle() {
    let harness = Harness::new();
    let show = write_show(&harness.root, "showA", &["ep1.mkv", "ep1.srt"]);

    harness.run().await;
    fs::remove_file(show.join("ep1.mkv")).unwrap();
    let report = harness.run().await;

    // The subtitle alone cannot hold the record alive.
    assert_eq!(report.commit.records_deleted, 1);
    assert!(harness.records.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn scenario_subtitle_priority_upgrade() {
    let harness = Harness::new();
    let show = write_show(&harness.root, "showA", &["ep1.mkv", "ep1.ass"]);

    harness.run().await;
    let rows = harness.records.list_all().await.unwrap();
    assert_eq!(rows[0].subtitle_path.as_deref(), Some("ep1.ass"));

    // A higher-priority subtitle extension appears: pairing switches to it
    // deterministically.
    fs::write(show.join("ep1.srt"), b"fake subtitle").unwrap();
    let report = harness.run().await;

    assert_eq!(report.commit.records_updated, 1);
    let rows = harness.records.list_all().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].subtitle_path.as_deref(), Some("ep1.srt"));
}

#[tokio::test]
async fn scenario_rename_preserves_identity() {
    let harness = Harness::new();
    write_show(&harness.root, "showA", &["ep1.mkv"]);

    harness.run().await;
    let before = harness.folders.list_all().await.unwrap();
    let show_before = before.iter().find(|n| n.name == "showA").unwrap().clone();
    let unit_before = harness.content.list_all().await.unwrap()[0].clone();
    assert_eq!(unit_before.folder_id, show_before.id);

    fs::rename(
        harness.root.join("showA"),
        harness.root.join("showA_renamed"),
    )
    .unwrap();
    let report = harness.run().await;

    assert_eq!(report.folders_new, 0);
    assert!(report.folders_changed >= 1);

    let after = harness.folders.list_all().await.unwrap();
    let show_after = after
        .iter()
        .find(|n| n.name == "showA_renamed")
        .expect("renamed folder keeps its record");
    assert_eq!(show_after.id, show_before.id);
    assert_ne!(show_after.path, show_before.path);

    // The content linkage survives untouched; the title is frozen at
    // promotion time.
    let unit_after = harness.content.list_all().await.unwrap()[0].clone();
    assert_eq!(unit_after.folder_id, show_before.id);
    assert_eq!(unit_after.title, "showA");
    assert_eq!(unit_after.id, unit_before.id);
}

#[tokio::test]
async fn scenario_move_under_new_parent_keeps_id() {
    let harness = Harness::new();
    write_show(&harness.root, "showA", &["ep1.mkv"]);

    harness.run().await;
    let show_before = harness
        .folders
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .find(|n| n.name == "showA")
        .unwrap();

    let group = harness.root.join("group");
    fs::create_dir_all(&group).unwrap();
    fs::rename(harness.root.join("showA"), group.join("showA")).unwrap();
    harness.run().await;

    let nodes = harness.folders.list_all().await.unwrap();
    let group_node = nodes.iter().find(|n| n.name == "group").unwrap();
    let show_after = nodes.iter().find(|n| n.name == "showA").unwrap();

    assert_eq!(show_after.id, show_before.id);
    assert_eq!(show_after.parent_id, Some(group_node.id));
    assert_ne!(show_after.path, show_before.path);
}

#[tokio::test]
async fn promotion_skips_folders_with_media_bearing_ancestor() {
    let harness = Harness::new();
    let show = write_show(&harness.root, "showB", &["pilot.mkv"]);
    // Extras nested under a media-bearing folder must not promote.
    let extras = show.join("extras");
    fs::create_dir_all(&extras).unwrap();
    fs::write(extras.join("bloopers.mkv"), b"fake media content").unwrap();

    harness.run().await;

    let units = harness.content.list_all().await.unwrap();
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].title, "showB");

    // Idempotent: a second run must not promote anything new.
    let report = harness.run().await;
    assert_eq!(report.commit.content_created, 0);
    assert_eq!(harness.content.list_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn pairing_basenames_stay_unique_per_content() {
    let harness = Harness::new();
    write_show(
        &harness.root,
        "showC",
        &["ep1.mkv", "ep1.srt", "ep2.mkv", "ep2.smi", "ep3.mkv", "stray.srt"],
    );

    harness.run().await;
    let rows = harness.records.list_all().await.unwrap();

    let mut basenames: Vec<&str> = rows.iter().map(|r| r.base_name.as_str()).collect();
    basenames.sort();
    let mut deduped = basenames.clone();
    deduped.dedup();
    assert_eq!(basenames, deduped, "duplicate basename in {basenames:?}");
    assert_eq!(rows.len(), 3);
    // The stray subtitle with no matching video produced no record.
    assert!(rows.iter().all(|r| r.base_name != "stray"));
}

#[tokio::test]
async fn delete_flag_gates_folder_deletion() {
    let harness = Harness::new();
    write_show(&harness.root, "showA", &["ep1.mkv"]);
    write_show(&harness.root, "showB", &["ep1.mkv"]);

    harness.run().await;
    let show_b = harness
        .folders
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .find(|n| n.name == "showB")
        .unwrap();

    fs::remove_dir_all(harness.root.join("showB")).unwrap();

    // Candidates without the flag are ignored.
    let mut params = harness.params();
    params.delete_candidates = vec![show_b.id];
    harness.engine.run(params).await.unwrap();
    assert!(harness.folders.get(show_b.id.get()).await.is_some());

    let mut params = harness.params();
    params.delete_candidates = vec![show_b.id];
    params.delete_enabled = true;
    let report = harness.engine.run(params).await.unwrap();

    assert_eq!(report.commit.folders_deleted, 1);
    assert!(harness.folders.get(show_b.id.get()).await.is_none());
}

#[tokio::test]
async fn scope_restricts_pairing_to_subtree() {
    let harness = Harness::new();
    let show_a = write_show(&harness.root, "showA", &["ep1.mkv"]);
    let show_b = write_show(&harness.root, "showB", &["ep1.mkv"]);

    harness.run().await;
    assert_eq!(harness.records.list_all().await.unwrap().len(), 2);

    let show_a_id = harness
        .folders
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .find(|n| n.name == "showA")
        .unwrap()
        .id;

    // Both shows lose their episode, but only showA is in scope.
    fs::remove_file(show_a.join("ep1.mkv")).unwrap();
    fs::remove_file(show_b.join("ep1.mkv")).unwrap();

    let mut params = harness.params();
    params.scope_folder_id = Some(show_a_id);
    let report = harness.engine.run(params).await.unwrap();

    assert_eq!(report.commit.records_deleted, 1);
    let rows = harness.records.list_all().await.unwrap();
    assert_eq!(rows.len(), 1);

    let show_b_unit = harness
        .content
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .find(|u| u.title == "showB")
        .unwrap();
    assert_eq!(rows[0].content_id, show_b_unit.id);
}

#[tokio::test]
async fn content_folder_missing_on_disk_leaves_rows_untouched() {
    let harness = Harness::new();
    write_show(&harness.root, "showA", &["ep1.mkv"]);

    harness.run().await;
    assert_eq!(harness.records.list_all().await.unwrap().len(), 1);

    // The whole content folder vanishes: pairing skips it with a warning
    // and its rows survive (only the explicit delete flow removes folders).
    fs::remove_dir_all(harness.root.join("showA")).unwrap();
    let report = harness.run().await;

    assert_eq!(report.commit.records_deleted, 0);
    assert_eq!(harness.records.list_all().await.unwrap().len(), 1);
}
