use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use grove_model::{ContentUnit, MediaRecord, MediaRecordId};
use tracing::warn;

use crate::error::Result;
use crate::fs::FileSystem;
use crate::settings::ScanSettings;

/// Insert/update/delete candidate sets for one content unit. Built purely
/// in memory; the commit stage owns all store writes.
#[derive(Debug, Default)]
pub struct PairingSets {
    pub inserts: Vec<MediaRecord>,
    pub updates: Vec<MediaRecord>,
    pub deletes: Vec<MediaRecord>,
}

impl PairingSets {
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }
}

#[derive(Debug)]
struct Candidate {
    video: String,
    subtitle: Option<SubtitleChoice>,
}

#[derive(Debug)]
struct SubtitleChoice {
    name: String,
    priority: usize,
}

impl SubtitleChoice {
    /// Deterministic winner: lower priority rank first, then lexicographic
    /// file name. Replaces the original listing-order behaviour.
    fn outranks(&self, other: &SubtitleChoice) -> bool {
        (self.priority, self.name.as_str()) < (other.priority, other.name.as_str())
    }
}

/// Reconciles one content unit's on-disk files against its stored records.
pub struct FilePairer {
    fs: Arc<dyn FileSystem>,
    settings: ScanSettings,
}

impl FilePairer {
    pub fn new(fs: Arc<dyn FileSystem>, settings: ScanSettings) -> Self {
        Self { fs, settings }
    }

    /// Diff the content directory against `existing` rows.
    ///
    /// Returns `Ok(None)` when the directory is gone or not a directory:
    /// that content's rows are left untouched for this run and processing
    /// continues with the next unit.
    ///
    /// Videos are collected first, then subtitles are overlaid onto
    /// candidates with a matching basename; a subtitle without a video
    /// basename is dropped silently. The video pass and the subtitle pass
    /// each open and release their own listing handle.
    pub async fn reconcile(
        &self,
        content: &ContentUnit,
        dir: &Path,
        existing: &[MediaRecord],
        next_record_id: &mut MediaRecordId,
        now: DateTime<Utc>,
    ) -> Result<Option<PairingSets>> {
        match self.fs.metadata(dir).await {
            Ok(md) if md.is_dir => {}
            _ => {
                warn!(
                    "Content {} directory {} is missing or not a directory; leaving file records untouched",
                    content.id,
                    dir.display()
                );
                return Ok(None);
            }
        }

        let mut candidates = match self.collect_videos(dir).await {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(
                    "Listing {} for content {} failed: {}; leaving file records untouched",
                    dir.display(),
                    content.id,
                    err
                );
                return Ok(None);
            }
        };
        if let Err(err) = self.overlay_subtitles(dir, &mut candidates).await {
            warn!(
                "Subtitle listing {} for content {} failed: {}; leaving file records untouched",
                dir.display(),
                content.id,
                err
            );
            return Ok(None);
        }

        // Existing rows keyed by the same basename rule; on duplicate
        // basenames the first row wins and the rest are ignored.
        let mut existing_by_base: BTreeMap<&str, &MediaRecord> = BTreeMap::new();
        for record in existing {
            existing_by_base
                .entry(record.base_name.as_str())
                .or_insert(record);
        }

        let mut sets = PairingSets::default();

        for (base, record) in existing_by_base {
            match candidates.remove(base) {
                None => sets.deletes.push(record.clone()),
                Some(candidate) => {
                    let subtitle = candidate.subtitle.map(|s| s.name);
                    if record.video_path != candidate.video || record.subtitle_path != subtitle {
                        let mut updated = record.clone();
                        updated.video_path = candidate.video;
                        updated.set_subtitle(subtitle, now);
                        sets.updates.push(updated);
                    }
                }
            }
        }

        for (base, candidate) in candidates {
            let subtitle = candidate.subtitle.map(|s| s.name);
            sets.inserts.push(MediaRecord {
                id: *next_record_id,
                content_id: content.id,
                base_name: base,
                video_path: candidate.video,
                subtitle_path: subtitle.clone(),
                subtitle_added_at: subtitle.is_some().then_some(now),
            });
            *next_record_id = next_record_id.next();
        }

        Ok(Some(sets))
    }

    async fn collect_videos(&self, dir: &Path) -> std::io::Result<BTreeMap<String, Candidate>> {
        let mut candidates = BTreeMap::new();
        let mut entries = self.fs.read_dir(dir).await?;

        while let Some(path) = entries.next_entry().await? {
            let Ok(md) = self.fs.metadata(&path).await else {
                continue;
            };
            if !md.is_file || !self.settings.is_video(&path) {
                continue;
            }
            let (Some(base), Some(name)) = (file_stem(&path), file_name(&path)) else {
                continue;
            };
            candidates.insert(
                base,
                Candidate {
                    video: name,
                    subtitle: None,
                },
            );
        }

        Ok(candidates)
    }

    async fn overlay_subtitles(
        &self,
        dir: &Path,
        candidates: &mut BTreeMap<String, Candidate>,
    ) -> std::io::Result<()> {
        let mut entries = self.fs.read_dir(dir).await?;

        while let Some(path) = entries.next_entry().await? {
            let Ok(md) = self.fs.metadata(&path).await else {
                continue;
            };
            if !md.is_file || !self.settings.is_subtitle(&path) {
                continue;
            }
            let (Some(base), Some(name)) = (file_stem(&path), file_name(&path)) else {
                continue;
            };
            // No matching video basename: the subtitle is dropped.
            let Some(candidate) = candidates.get_mut(&base) else {
                continue;
            };

            let choice = SubtitleChoice {
                name,
                priority: self
                    .settings
                    .subtitle_priority(&path)
                    .unwrap_or(usize::MAX),
            };
            match &candidate.subtitle {
                Some(current) if !choice.outranks(current) => {}
                _ => candidate.subtitle = Some(choice),
            }
        }

        Ok(())
    }
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().into_owned())
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|s| s.to_string_lossy().into_owned())
}
